#![no_main]

use dcerpc_bind::core::cursor::{ByteOrder, WireWriter};
use dcerpc_bind::{BindPdu, BindRequest};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Whole frames: anything that decodes must encode again
    if let Ok(pdu) = BindPdu::from_bytes(data) {
        let bytes = pdu.to_bytes().expect("decoded pdu re-encodes");
        assert_eq!(bytes.len(), pdu.frag_length());
    }

    // Bare bodies in both byte orders
    let auth_length = data.first().copied().map(u16::from).unwrap_or(0);
    for order in [ByteOrder::Little, ByteOrder::Big] {
        let Ok(request) = BindRequest::decode(data, auth_length, order) else {
            continue;
        };
        let mut writer = WireWriter::new();
        if let Ok(written_auth_length) = request.encode(&mut writer, order) {
            let again = BindRequest::decode(writer.as_slice(), written_auth_length, order)
                .expect("re-encoded body decodes");
            assert_eq!(again.presentation_contexts, request.presentation_contexts);
        }
    }
});
