//! # Bind Request
//!
//! Body codec for the `bind` and `alter_context` PDUs, which share one layout.
//!
//! ## Wire Format (after the common header)
//! ```text
//! [max_xmit_frag(2)] [max_recv_frag(2)] [assoc_group_id(4)]
//! [n_context_elem(1)] [reserved(1)] [reserved2(2)]
//! n_context_elem x {
//!     [p_cont_id(2)] [n_transfer_syn(1)] [reserved(1)]
//!     [abstract_syntax(20)]
//!     n_transfer_syn x [transfer_syntax(20)]
//! }
//! [security trailer, iff auth_length != 0]
//! ```
//!
//! Every multi-byte field uses the byte order of the message's data
//! representation, on both encode and decode.

use crate::config::BindDefaults;
use crate::core::cursor::{ByteOrder, WireReader, WireWriter};
use crate::core::header::{
    DataRepresentation, PacketType, PduHeader, PfcFlags, COMMON_HEADER_SIZE, FRAG_LENGTH_OFFSET,
};
use crate::error::{ProtocolError, Result};
use crate::pdu::auth::SecurityTrailer;
use crate::pdu::syntax::{SyntaxId, NDR_TRANSFER_SYNTAX, SYNTAX_ID_SIZE};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// `max_xmit_frag` + `max_recv_frag` + `assoc_group_id`.
pub const BIND_FIXED_SIZE: usize = 2 + 2 + 4;

/// `n_context_elem` + `reserved` + `reserved2`.
pub const CONTEXT_LIST_HEADER_SIZE: usize = 1 + 1 + 2;

/// `p_cont_id` + `n_transfer_syn` + `reserved`.
pub const CONTEXT_ELEM_HEADER_SIZE: usize = 2 + 1 + 1;

/// Largest list an 8-bit wire count can describe.
pub const MAX_WIRE_COUNT: usize = u8::MAX as usize;

/// One proposed interface with its acceptable transfer syntaxes (`p_cont_elem_t`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationContext {
    pub context_id: u16,
    pub abstract_syntax: SyntaxId,
    pub transfer_syntaxes: Vec<SyntaxId>,
    /// Carried through unchanged
    pub reserved: u8,
}

impl PresentationContext {
    pub fn new(context_id: u16, abstract_syntax: SyntaxId, transfer_syntaxes: Vec<SyntaxId>) -> Self {
        Self {
            context_id,
            abstract_syntax,
            transfer_syntaxes,
            reserved: 0,
        }
    }

    /// Proposes `abstract_syntax` over NDR 2.0 only.
    pub fn ndr(context_id: u16, abstract_syntax: SyntaxId) -> Self {
        Self::new(context_id, abstract_syntax, vec![NDR_TRANSFER_SYNTAX])
    }

    pub fn encoded_size(&self) -> usize {
        CONTEXT_ELEM_HEADER_SIZE + SYNTAX_ID_SIZE * (1 + self.transfer_syntaxes.len())
    }

    fn wire_count(&self) -> Result<u8> {
        u8::try_from(self.transfer_syntaxes.len()).map_err(|_| ProtocolError::OversizedList {
            what: "transfer syntaxes",
            len: self.transfer_syntaxes.len(),
            max: MAX_WIRE_COUNT,
        })
    }

    fn encode(&self, writer: &mut WireWriter, n_transfer_syn: u8, order: ByteOrder) {
        writer.put_u16(self.context_id, order);
        writer.put_u8(n_transfer_syn);
        writer.put_u8(self.reserved);
        self.abstract_syntax.encode(writer, order);
        for syntax in &self.transfer_syntaxes {
            syntax.encode(writer, order);
        }
    }

    fn decode(reader: &mut WireReader<'_>, order: ByteOrder) -> Result<Self> {
        reader.ensure("p_cont_elem", CONTEXT_ELEM_HEADER_SIZE)?;
        let context_id = reader.read_u16("p_cont_id", order)?;
        let n_transfer_syn = usize::from(reader.read_u8("n_transfer_syn")?);
        let reserved = reader.read_u8("p_cont_elem.reserved")?;

        // Refuse to allocate for syntaxes that are not in the buffer.
        reader.ensure("transfer_syntaxes", SYNTAX_ID_SIZE * (1 + n_transfer_syn))?;
        let abstract_syntax = SyntaxId::decode(reader, order)?;
        let transfer_syntaxes = (0..n_transfer_syn)
            .map(|_| SyntaxId::decode(reader, order))
            .collect::<Result<Vec<_>>>()?;

        trace!(
            context_id,
            abstract_syntax = %abstract_syntax,
            n_transfer_syn,
            "decoded presentation context"
        );

        Ok(Self {
            context_id,
            abstract_syntax,
            transfer_syntaxes,
            reserved,
        })
    }
}

/// The negotiation request carried by `bind` and `alter_context`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindRequest {
    pub max_xmit_frag: u16,
    pub max_recv_frag: u16,
    /// 0 asks the server for a new association group
    pub assoc_group_id: u32,
    pub presentation_contexts: Vec<PresentationContext>,
    /// Present iff the header's `auth_length` is nonzero
    pub security_verifier: Option<SecurityTrailer>,
}

impl BindRequest {
    pub fn new(max_xmit_frag: u16, max_recv_frag: u16, assoc_group_id: u32) -> Self {
        Self {
            max_xmit_frag,
            max_recv_frag,
            assoc_group_id,
            presentation_contexts: Vec::new(),
            security_verifier: None,
        }
    }

    /// Request with the configured fragment sizes and group.
    pub fn from_defaults(defaults: &BindDefaults) -> Self {
        Self::new(
            defaults.max_xmit_frag,
            defaults.max_recv_frag,
            defaults.assoc_group_id,
        )
    }

    #[must_use]
    pub fn with_context(mut self, context: PresentationContext) -> Self {
        self.presentation_contexts.push(context);
        self
    }

    #[must_use]
    pub fn with_security_verifier(mut self, trailer: SecurityTrailer) -> Self {
        self.security_verifier = Some(trailer);
        self
    }

    /// Byte length of the body, excluding the common header and the security trailer.
    ///
    /// Computed from the current context list on every call.
    pub fn compute_size(&self) -> usize {
        BIND_FIXED_SIZE
            + CONTEXT_LIST_HEADER_SIZE
            + self
                .presentation_contexts
                .iter()
                .map(PresentationContext::encoded_size)
                .sum::<usize>()
    }

    /// Checks every list against its 8-bit wire count.
    fn wire_counts(&self) -> Result<(u8, Vec<u8>)> {
        let n_context_elem = u8::try_from(self.presentation_contexts.len()).map_err(|_| {
            ProtocolError::OversizedList {
                what: "presentation contexts",
                len: self.presentation_contexts.len(),
                max: MAX_WIRE_COUNT,
            }
        })?;
        let per_context = self
            .presentation_contexts
            .iter()
            .map(PresentationContext::wire_count)
            .collect::<Result<Vec<_>>>()?;
        Ok((n_context_elem, per_context))
    }

    /// Writes the body followed by the optional security trailer.
    ///
    /// The writer must be positioned right after the common header. Returns the
    /// `auth_length` the header has to declare. Nothing is written when a list is
    /// too long for its wire count or the trailer token too long for `auth_length`.
    pub fn encode(&self, writer: &mut WireWriter, order: ByteOrder) -> Result<u16> {
        let (n_context_elem, per_context) = self.wire_counts()?;
        if let Some(trailer) = &self.security_verifier {
            trailer.auth_length()?;
        }
        let start = writer.len();

        writer.put_u16(self.max_xmit_frag, order);
        writer.put_u16(self.max_recv_frag, order);
        writer.put_u32(self.assoc_group_id, order);

        writer.put_u8(n_context_elem);
        writer.put_u8(0);
        writer.put_u16(0, order);

        for (context, n_transfer_syn) in self.presentation_contexts.iter().zip(per_context) {
            context.encode(writer, n_transfer_syn, order);
        }

        let body_len = writer.len() - start;
        debug_assert_eq!(body_len, self.compute_size());
        SecurityTrailer::encode(self.security_verifier.as_ref(), writer, body_len, order)
    }

    /// Reads a body of `body.len()` bytes, the security trailer included.
    ///
    /// `body` is everything after the common header; `auth_length` and `order`
    /// come from that header. The trailer is split off the tail first.
    pub fn decode(body: &[u8], auth_length: u16, order: ByteOrder) -> Result<Self> {
        let (fields, security_verifier) =
            SecurityTrailer::split_from_tail(body, auth_length, order)?;
        let mut reader = WireReader::new(fields);
        let mut request = Self::decode_fields(&mut reader, order)?;
        request.security_verifier = security_verifier;
        Ok(request)
    }

    /// Reads the body fields from a cursor, leaving it after the last context.
    pub fn decode_fields(reader: &mut WireReader<'_>, order: ByteOrder) -> Result<Self> {
        reader.ensure("bind body", BIND_FIXED_SIZE + CONTEXT_LIST_HEADER_SIZE)?;

        let max_xmit_frag = reader.read_u16("max_xmit_frag", order)?;
        let max_recv_frag = reader.read_u16("max_recv_frag", order)?;
        let assoc_group_id = reader.read_u32("assoc_group_id", order)?;

        let n_context_elem = usize::from(reader.read_u8("n_context_elem")?);
        let _reserved = reader.read_u8("p_cont_list.reserved")?;
        let _reserved2 = reader.read_u16("p_cont_list.reserved2", order)?;

        // Each context needs at least its prefix and the abstract syntax.
        let min_context = CONTEXT_ELEM_HEADER_SIZE + SYNTAX_ID_SIZE;
        reader.ensure("p_cont_elem", n_context_elem * min_context)?;

        let presentation_contexts = (0..n_context_elem)
            .map(|_| PresentationContext::decode(reader, order))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            max_xmit_frag,
            max_recv_frag,
            assoc_group_id,
            presentation_contexts,
            security_verifier: None,
        })
    }
}

/// A complete, unfragmented `bind` or `alter_context` PDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindPdu {
    pub packet_type: PacketType,
    pub rpc_vers_minor: u8,
    pub flags: PfcFlags,
    pub drep: DataRepresentation,
    pub call_id: u32,
    pub request: BindRequest,
}

impl BindPdu {
    pub fn bind(call_id: u32, request: BindRequest) -> Self {
        Self::with_type(PacketType::Bind, call_id, request)
    }

    pub fn alter_context(call_id: u32, request: BindRequest) -> Self {
        Self::with_type(PacketType::AlterContext, call_id, request)
    }

    fn with_type(packet_type: PacketType, call_id: u32, request: BindRequest) -> Self {
        let header = PduHeader::new(packet_type, call_id, DataRepresentation::ndr());
        Self {
            packet_type,
            rpc_vers_minor: header.rpc_vers_minor,
            flags: header.flags,
            drep: header.drep,
            call_id,
            request,
        }
    }

    /// Switches the message to another data representation.
    #[must_use]
    pub fn with_drep(mut self, drep: DataRepresentation) -> Self {
        self.drep = drep;
        self
    }

    /// Total `frag_length` of the encoded PDU.
    pub fn frag_length(&self) -> usize {
        let body_len = self.request.compute_size();
        let trailer_len = self
            .request
            .security_verifier
            .as_ref()
            .map_or(0, |trailer| trailer.encoded_len(body_len));
        COMMON_HEADER_SIZE + body_len + trailer_len
    }

    /// Serializes header, body and trailer into a single fragment.
    ///
    /// The trailer's `auth_pad_length` is ignored: the pad actually written is
    /// recomputed from the body length, so a decoded trailer that carried wire
    /// padding comes back with the recomputed value.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let frag_length = self.frag_length();
        let frag_length_u16 =
            u16::try_from(frag_length).map_err(|_| ProtocolError::OversizedPdu(frag_length))?;
        let order = self.drep.byte_order();

        let mut header = PduHeader::new(self.packet_type, self.call_id, self.drep);
        header.rpc_vers_minor = self.rpc_vers_minor;
        header.flags = self.flags;
        header.frag_length = frag_length_u16;

        let mut writer = WireWriter::with_capacity(frag_length);
        header.encode(&mut writer);
        let auth_length = self.request.encode(&mut writer, order)?;
        // auth_length is only known once the trailer is written
        writer.patch_u16(FRAG_LENGTH_OFFSET + 2, auth_length, order)?;

        debug!(
            packet_type = ?self.packet_type,
            call_id = self.call_id,
            contexts = self.request.presentation_contexts.len(),
            frag_length,
            auth_length,
            "encoded bind PDU"
        );
        Ok(writer.into_bytes())
    }

    /// Parses one complete fragment.
    pub fn from_bytes(frame: &[u8]) -> Result<Self> {
        let mut reader = WireReader::new(frame);
        let header = PduHeader::decode(&mut reader)?;
        Self::from_parts(&header, &frame[COMMON_HEADER_SIZE..])
    }

    /// Builds the PDU from an already-decoded header and the bytes after it.
    pub fn from_parts(header: &PduHeader, body: &[u8]) -> Result<Self> {
        if !header.packet_type.carries_bind_body() {
            return Err(ProtocolError::UnexpectedPacketType(header.packet_type as u8));
        }
        let declared = usize::from(header.frag_length);
        let actual = COMMON_HEADER_SIZE + body.len();
        if declared != actual {
            return Err(ProtocolError::FragLengthMismatch { declared, actual });
        }

        let request = BindRequest::decode(body, header.auth_length, header.drep.byte_order())?;
        debug!(
            packet_type = ?header.packet_type,
            call_id = header.call_id,
            contexts = request.presentation_contexts.len(),
            frag_length = declared,
            auth_length = header.auth_length,
            "decoded bind PDU"
        );

        Ok(Self {
            packet_type: header.packet_type,
            rpc_vers_minor: header.rpc_vers_minor,
            flags: header.flags,
            drep: header.drep,
            call_id: header.call_id,
            request,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pdu::auth::{AuthLevel, AuthType};
    use uuid::Uuid;

    fn epm() -> SyntaxId {
        SyntaxId::new(Uuid::from_u128(0xe1af_8308_5d1f_11c9_91a4_0800_2b14_a0fa), 3)
    }

    fn sample() -> BindRequest {
        BindRequest::new(4280, 4280, 0).with_context(PresentationContext::ndr(0, epm()))
    }

    fn encode(request: &BindRequest, order: ByteOrder) -> Bytes {
        let mut writer = WireWriter::new();
        request.encode(&mut writer, order).unwrap();
        writer.into_bytes()
    }

    #[test]
    fn single_context_body_is_56_bytes() {
        let request = sample();
        assert_eq!(request.compute_size(), 12 + 44);
        assert_eq!(encode(&request, ByteOrder::Little).len(), 56);
    }

    #[test]
    fn layout_little_endian() {
        let bytes = encode(&sample(), ByteOrder::Little);
        assert_eq!(&bytes[0..4], &[0xB8, 0x10, 0xB8, 0x10]);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &[1, 0, 0, 0]);
        // p_cont_id, n_transfer_syn, reserved
        assert_eq!(&bytes[12..16], &[0, 0, 1, 0]);
        assert_eq!(&bytes[16..20], &[0x08, 0x83, 0xaf, 0xe1]);
        assert_eq!(&bytes[32..36], &[3, 0, 0, 0]);
        assert_eq!(&bytes[36..40], &[0x04, 0x5d, 0x88, 0x8a]);
    }

    #[test]
    fn layout_big_endian() {
        let bytes = encode(&sample(), ByteOrder::Big);
        assert_eq!(&bytes[0..4], &[0x10, 0xB8, 0x10, 0xB8]);
        assert_eq!(&bytes[16..20], &[0xe1, 0xaf, 0x83, 0x08]);
        assert_eq!(&bytes[32..36], &[0, 0, 0, 3]);
    }

    #[test]
    fn roundtrip_each_byte_order() {
        let request = sample()
            .with_context(PresentationContext::new(
                1,
                epm(),
                vec![NDR_TRANSFER_SYNTAX, SyntaxId::bind_time_features(3)],
            ));
        for order in [ByteOrder::Little, ByteOrder::Big] {
            let bytes = encode(&request, order);
            let decoded = BindRequest::decode(&bytes, 0, order).unwrap();
            assert_eq!(decoded, request);
        }
    }

    #[test]
    fn reserved_byte_survives() {
        let mut context = PresentationContext::ndr(7, epm());
        context.reserved = 0x5A;
        let request = BindRequest::new(1, 2, 3).with_context(context);
        let decoded =
            BindRequest::decode(&encode(&request, ByteOrder::Little), 0, ByteOrder::Little)
                .unwrap();
        assert_eq!(decoded.presentation_contexts[0].reserved, 0x5A);
    }

    #[test]
    fn empty_context_list_decodes_empty() {
        let request = BindRequest::new(5840, 5840, 0x1234);
        let bytes = encode(&request, ByteOrder::Little);
        assert_eq!(bytes.len(), 12);
        let decoded = BindRequest::decode(&bytes, 0, ByteOrder::Little).unwrap();
        assert!(decoded.presentation_contexts.is_empty());
    }

    #[test]
    fn oversized_context_list_writes_nothing() {
        let mut request = BindRequest::new(1, 1, 0);
        request.presentation_contexts = (0..256u16)
            .map(|id| PresentationContext::ndr(id, epm()))
            .collect();
        let mut writer = WireWriter::new();
        let err = request.encode(&mut writer, ByteOrder::Little).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::OversizedList { len: 256, max: 255, .. }
        ));
        assert!(writer.is_empty());
    }

    #[test]
    fn oversized_trailer_writes_nothing() {
        let trailer = SecurityTrailer::new(
            AuthType::WinNt,
            AuthLevel::Connect,
            0,
            vec![0u8; usize::from(u16::MAX) + 1],
        );
        let request = sample().with_security_verifier(trailer);
        let mut writer = WireWriter::new();
        let err = request.encode(&mut writer, ByteOrder::Little).unwrap_err();
        assert!(matches!(err, ProtocolError::OversizedPdu(65536)));
        assert!(writer.is_empty());
    }

    #[test]
    fn wire_padding_is_recomputed_on_reencode() {
        let trailer = SecurityTrailer::new(AuthType::WinNt, AuthLevel::PacketIntegrity, 1, vec![0xCC; 16]);
        let pdu = BindPdu::bind(4, sample().with_security_verifier(trailer));
        let original = pdu.to_bytes().unwrap();

        // Peer declares 4 bytes of padding before the sec_trailer.
        let trailer_start = COMMON_HEADER_SIZE + 56;
        let mut frame = original[..trailer_start].to_vec();
        frame.extend_from_slice(&[0u8; 4]);
        frame.extend_from_slice(&original[trailer_start..]);
        frame[trailer_start + 4 + 2] = 4;
        let frag_length = u16::try_from(frame.len()).unwrap();
        frame[8..10].copy_from_slice(&frag_length.to_le_bytes());

        let decoded = BindPdu::from_bytes(&frame).unwrap();
        let verifier = decoded.request.security_verifier.as_ref().unwrap();
        assert_eq!(verifier.auth_pad_length, 4);
        assert_eq!(decoded.request.presentation_contexts, pdu.request.presentation_contexts);

        let reencoded = BindPdu::from_bytes(&decoded.to_bytes().unwrap()).unwrap();
        assert_eq!(reencoded, pdu);
        assert_eq!(
            reencoded.request.security_verifier.unwrap().auth_pad_length,
            0
        );
    }

    #[test]
    fn request_serde_roundtrip_through_toml() {
        let mut trailer = SecurityTrailer::new(AuthType::GssNegotiate, AuthLevel::PacketPrivacy, 9, vec![1u8, 2, 3]);
        trailer.auth_reserved = 0x11;
        let request = sample()
            .with_context(PresentationContext::new(
                1,
                epm(),
                vec![NDR_TRANSFER_SYNTAX, SyntaxId::bind_time_features(3)],
            ))
            .with_security_verifier(trailer);

        let text = toml::to_string(&request).unwrap();
        assert!(text.contains("e1af8308-5d1f-11c9-91a4-08002b14a0fa"));
        let parsed: BindRequest = toml::from_str(&text).unwrap();
        assert_eq!(parsed, request);

        let bare: BindRequest = toml::from_str(&toml::to_string(&sample()).unwrap()).unwrap();
        assert!(bare.security_verifier.is_none());
    }

    #[test]
    fn oversized_transfer_syntax_list_is_rejected() {
        let context = PresentationContext::new(0, epm(), vec![NDR_TRANSFER_SYNTAX; 256]);
        let request = BindRequest::new(1, 1, 0).with_context(context);
        let mut writer = WireWriter::new();
        let err = request.encode(&mut writer, ByteOrder::Big).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::OversizedList { what: "transfer syntaxes", .. }
        ));
        assert!(writer.is_empty());
    }

    #[test]
    fn truncated_transfer_syntax_fails() {
        let bytes = encode(&sample(), ByteOrder::Little);
        let err = BindRequest::decode(&bytes[..bytes.len() - 1], 0, ByteOrder::Little).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedInput { .. }));
    }

    #[test]
    fn huge_declared_count_fails_without_allocating() {
        let mut bytes = encode(&BindRequest::new(1, 1, 0), ByteOrder::Little).to_vec();
        bytes[8] = 0xFF;
        let err = BindRequest::decode(&bytes, 0, ByteOrder::Little).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::MalformedInput { field: "p_cont_elem", .. }
        ));
    }

    #[test]
    fn pdu_with_trailer_roundtrips() {
        let trailer = SecurityTrailer::new(AuthType::WinNt, AuthLevel::Connect, 0, vec![0x4E; 40]);
        let pdu = BindPdu::bind(2, sample().with_security_verifier(trailer))
            .with_drep(DataRepresentation::big_endian());
        let bytes = pdu.to_bytes().unwrap();
        assert_eq!(bytes.len(), pdu.frag_length());
        assert_eq!(bytes.len(), 16 + 56 + 8 + 40);
        // frag_length and auth_length, big endian
        assert_eq!(&bytes[8..12], &[0x00, 0x78, 0x00, 0x28]);

        let decoded = BindPdu::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, pdu);
    }

    #[test]
    fn alter_context_shares_layout() {
        let pdu = BindPdu::alter_context(9, sample());
        let bytes = pdu.to_bytes().unwrap();
        assert_eq!(bytes[2], PacketType::AlterContext as u8);
        assert_eq!(BindPdu::from_bytes(&bytes).unwrap(), pdu);
    }

    #[test]
    fn frag_length_mismatch_is_rejected() {
        let mut bytes = BindPdu::bind(1, sample()).to_bytes().unwrap().to_vec();
        bytes.push(0);
        let err = BindPdu::from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::FragLengthMismatch { declared: 72, actual: 73 }
        ));
    }

    #[test]
    fn non_bind_packet_type_is_rejected() {
        let mut bytes = BindPdu::bind(1, sample()).to_bytes().unwrap().to_vec();
        bytes[2] = PacketType::Request as u8;
        let err = BindPdu::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedPacketType(0)));
    }

    #[test]
    fn oversized_pdu_is_rejected() {
        let contexts = (0..255u16)
            .map(|id| PresentationContext::new(id, epm(), vec![NDR_TRANSFER_SYNTAX; 20]))
            .collect();
        let mut request = BindRequest::new(1, 1, 0);
        request.presentation_contexts = contexts;
        let err = BindPdu::bind(1, request).to_bytes().unwrap_err();
        assert!(matches!(err, ProtocolError::OversizedPdu(_)));
    }
}
