//! Interface and transfer syntax identifiers (`p_syntax_id_t`).

use crate::core::cursor::{ByteOrder, WireReader, WireWriter};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Encoded size of one syntax identifier: 16-byte UUID + 4-byte version.
pub const SYNTAX_ID_SIZE: usize = 20;

/// NDR 2.0 transfer syntax, `8a885d04-1ceb-11c9-9fe8-08002b104860` v2.
pub const NDR_TRANSFER_SYNTAX: SyntaxId =
    SyntaxId::new(Uuid::from_u128(0x8a88_5d04_1ceb_11c9_9fe8_0800_2b10_4860), 2);

/// NDR64 transfer syntax, `71710533-beba-4937-8319-b5dbef9ccc36` v1.
pub const NDR64_TRANSFER_SYNTAX: SyntaxId =
    SyntaxId::new(Uuid::from_u128(0x7171_0533_beba_4937_8319_b5db_ef9c_cc36), 1);

/// A syntax identifier: interface UUID plus version.
///
/// Two identifiers are the same syntax iff both fields are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyntaxId {
    pub if_uuid: Uuid,
    /// Major version in the low 16 bits, minor in the high 16 bits
    pub if_version: u32,
}

impl SyntaxId {
    pub const fn new(if_uuid: Uuid, if_version: u32) -> Self {
        Self {
            if_uuid,
            if_version,
        }
    }

    pub const fn with_versions(if_uuid: Uuid, major: u16, minor: u16) -> Self {
        Self::new(if_uuid, ((minor as u32) << 16) | major as u32)
    }

    /// Bind time feature negotiation syntax for the given feature bitmask.
    ///
    /// The UUID is `6cb71c2c-9812-4540` followed by the little-endian bitmask
    /// and six zero bytes.
    pub fn bind_time_features(bitmask: u16) -> Self {
        let [lo, hi] = bitmask.to_le_bytes();
        let d4 = [lo, hi, 0, 0, 0, 0, 0, 0];
        Self::new(Uuid::from_fields(0x6cb7_1c2c, 0x9812, 0x4540, &d4), 1)
    }

    pub fn major_version(&self) -> u16 {
        (self.if_version & 0xFFFF) as u16
    }

    pub fn minor_version(&self) -> u16 {
        (self.if_version >> 16) as u16
    }

    /// Writes the UUID in NDR layout followed by the version.
    ///
    /// `time_low`, `time_mid` and `time_hi_and_version` follow `order`; the
    /// trailing eight bytes are written as-is.
    pub fn encode(&self, writer: &mut WireWriter, order: ByteOrder) {
        let (time_low, time_mid, time_hi, tail) = self.if_uuid.as_fields();
        writer.put_u32(time_low, order);
        writer.put_u16(time_mid, order);
        writer.put_u16(time_hi, order);
        writer.put_slice(tail);
        writer.put_u32(self.if_version, order);
    }

    pub fn decode(reader: &mut WireReader<'_>, order: ByteOrder) -> Result<Self> {
        reader.ensure("syntax id", SYNTAX_ID_SIZE)?;
        let time_low = reader.read_u32("if_uuid", order)?;
        let time_mid = reader.read_u16("if_uuid", order)?;
        let time_hi = reader.read_u16("if_uuid", order)?;
        let tail: [u8; 8] = reader.read_array("if_uuid")?;
        let if_version = reader.read_u32("if_version", order)?;
        Ok(Self {
            if_uuid: Uuid::from_fields(time_low, time_mid, time_hi, &tail),
            if_version,
        })
    }
}

impl fmt::Display for SyntaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} v{}.{}",
            self.if_uuid.hyphenated(),
            self.major_version(),
            self.minor_version()
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const NDR_LE: [u8; 16] = [
        0x04, 0x5d, 0x88, 0x8a, 0xeb, 0x1c, 0xc9, 0x11, 0x9f, 0xe8, 0x08, 0x00, 0x2b, 0x10, 0x48,
        0x60,
    ];
    const NDR_BE: [u8; 16] = [
        0x8a, 0x88, 0x5d, 0x04, 0x1c, 0xeb, 0x11, 0xc9, 0x9f, 0xe8, 0x08, 0x00, 0x2b, 0x10, 0x48,
        0x60,
    ];

    #[test]
    fn ndr_uuid_little_endian_vector() {
        let mut writer = WireWriter::new();
        NDR_TRANSFER_SYNTAX.encode(&mut writer, ByteOrder::Little);
        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), SYNTAX_ID_SIZE);
        assert_eq!(&bytes[..16], &NDR_LE);
        assert_eq!(&bytes[16..], &[0x02, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn ndr_uuid_big_endian_vector() {
        let mut writer = WireWriter::new();
        NDR_TRANSFER_SYNTAX.encode(&mut writer, ByteOrder::Big);
        let bytes = writer.into_bytes();
        assert_eq!(&bytes[..16], &NDR_BE);
        assert_eq!(&bytes[16..], &[0x00, 0x00, 0x00, 0x02]);
    }

    #[test]
    fn big_endian_is_field_wise_not_whole_block() {
        let mut reversed = NDR_LE;
        reversed.reverse();
        assert_ne!(NDR_BE, reversed);
    }

    #[test]
    fn decode_recovers_uuid() {
        let mut data = NDR_BE.to_vec();
        data.extend_from_slice(&[0, 0, 0, 2]);
        let id = SyntaxId::decode(&mut WireReader::new(&data), ByteOrder::Big).unwrap();
        assert_eq!(id, NDR_TRANSFER_SYNTAX);
        assert_eq!(
            id.if_uuid.to_string(),
            "8a885d04-1ceb-11c9-9fe8-08002b104860"
        );
    }

    #[test]
    fn decode_short_input_fails() {
        let data = [0u8; 19];
        assert!(SyntaxId::decode(&mut WireReader::new(&data), ByteOrder::Little).is_err());
    }

    #[test]
    fn version_halves() {
        let id = SyntaxId::with_versions(Uuid::nil(), 3, 1);
        assert_eq!(id.if_version, 0x0001_0003);
        assert_eq!(id.major_version(), 3);
        assert_eq!(id.minor_version(), 1);
        assert_eq!(
            id.to_string(),
            "00000000-0000-0000-0000-000000000000 v3.1"
        );
    }

    #[test]
    fn bind_time_feature_uuid() {
        let id = SyntaxId::bind_time_features(0x0003);
        assert_eq!(
            id.if_uuid.to_string(),
            "6cb71c2c-9812-4540-0300-000000000000"
        );
        assert_eq!(id.if_version, 1);
    }
}
