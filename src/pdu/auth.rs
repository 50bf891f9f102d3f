//! # Security Trailer
//!
//! The optional authentication verifier at the tail of a connection-oriented PDU.
//!
//! ## Wire Format
//! ```text
//! [auth_pad(auth_pad_length)]
//! [auth_type(1)] [auth_level(1)] [auth_pad_length(1)] [auth_reserved(1)] [auth_context_id(4)]
//! [auth_value(auth_length)]
//! ```
//!
//! Its presence is signalled by the header's `auth_length`, which counts only
//! `auth_value`. Decoding works from the end of the fragment backwards, so the
//! trailer is located before the body fields are read.

use crate::core::cursor::{ByteOrder, WireReader, WireWriter};
use crate::error::{constants, ProtocolError, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Size of the fixed `sec_trailer` fields.
pub const SEC_TRAILER_SIZE: usize = 8;

/// The trailer starts on this boundary relative to the body.
pub const AUTH_PAD_ALIGNMENT: usize = 4;

/// Security provider identifier (`auth_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthType {
    None,
    GssNegotiate,
    WinNt,
    GssSchannel,
    GssKerberos,
    Netlogon,
    Default,
    Other(u8),
}

impl From<u8> for AuthType {
    fn from(value: u8) -> Self {
        match value {
            0x00 => AuthType::None,
            0x09 => AuthType::GssNegotiate,
            0x0A => AuthType::WinNt,
            0x0E => AuthType::GssSchannel,
            0x10 => AuthType::GssKerberos,
            0x44 => AuthType::Netlogon,
            0xFF => AuthType::Default,
            other => AuthType::Other(other),
        }
    }
}

impl From<AuthType> for u8 {
    fn from(value: AuthType) -> Self {
        match value {
            AuthType::None => 0x00,
            AuthType::GssNegotiate => 0x09,
            AuthType::WinNt => 0x0A,
            AuthType::GssSchannel => 0x0E,
            AuthType::GssKerberos => 0x10,
            AuthType::Netlogon => 0x44,
            AuthType::Default => 0xFF,
            AuthType::Other(raw) => raw,
        }
    }
}

/// Protection level (`auth_level`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthLevel {
    Default,
    None,
    Connect,
    Call,
    Packet,
    PacketIntegrity,
    PacketPrivacy,
    Other(u8),
}

impl From<u8> for AuthLevel {
    fn from(value: u8) -> Self {
        match value {
            0 => AuthLevel::Default,
            1 => AuthLevel::None,
            2 => AuthLevel::Connect,
            3 => AuthLevel::Call,
            4 => AuthLevel::Packet,
            5 => AuthLevel::PacketIntegrity,
            6 => AuthLevel::PacketPrivacy,
            other => AuthLevel::Other(other),
        }
    }
}

impl From<AuthLevel> for u8 {
    fn from(value: AuthLevel) -> Self {
        match value {
            AuthLevel::Default => 0,
            AuthLevel::None => 1,
            AuthLevel::Connect => 2,
            AuthLevel::Call => 3,
            AuthLevel::Packet => 4,
            AuthLevel::PacketIntegrity => 5,
            AuthLevel::PacketPrivacy => 6,
            AuthLevel::Other(raw) => raw,
        }
    }
}

/// Authentication verifier (`auth_verifier_co_t`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityTrailer {
    pub auth_type: AuthType,
    pub auth_level: AuthLevel,
    /// Recomputed from the body length on encode
    pub auth_pad_length: u8,
    pub auth_reserved: u8,
    pub auth_context_id: u32,
    /// Opaque security provider token
    pub auth_value: Bytes,
}

impl SecurityTrailer {
    pub fn new(
        auth_type: AuthType,
        auth_level: AuthLevel,
        auth_context_id: u32,
        auth_value: impl Into<Bytes>,
    ) -> Self {
        Self {
            auth_type,
            auth_level,
            auth_pad_length: 0,
            auth_reserved: 0,
            auth_context_id,
            auth_value: auth_value.into(),
        }
    }

    /// Padding needed after a body of `body_len` bytes.
    pub fn pad_for(body_len: usize) -> usize {
        (AUTH_PAD_ALIGNMENT - body_len % AUTH_PAD_ALIGNMENT) % AUTH_PAD_ALIGNMENT
    }

    /// Value for the header's `auth_length` field.
    pub fn auth_length(&self) -> Result<u16> {
        u16::try_from(self.auth_value.len())
            .map_err(|_| ProtocolError::OversizedPdu(self.auth_value.len()))
    }

    /// Bytes this trailer occupies after a body of `body_len` bytes, padding included.
    pub fn encoded_len(&self, body_len: usize) -> usize {
        Self::pad_for(body_len) + SEC_TRAILER_SIZE + self.auth_value.len()
    }

    /// Writes the optional trailer and returns the `auth_length` to declare.
    ///
    /// `body_len` is the number of body bytes already written after the common header.
    pub fn encode(
        trailer: Option<&Self>,
        writer: &mut WireWriter,
        body_len: usize,
        order: ByteOrder,
    ) -> Result<u16> {
        let Some(trailer) = trailer else {
            return Ok(0);
        };
        let auth_length = trailer.auth_length()?;
        let pad = Self::pad_for(body_len);

        writer.put_zeros(pad);
        writer.put_u8(trailer.auth_type.into());
        writer.put_u8(trailer.auth_level.into());
        // pad < AUTH_PAD_ALIGNMENT
        writer.put_u8(pad as u8);
        writer.put_u8(trailer.auth_reserved);
        writer.put_u32(trailer.auth_context_id, order);
        writer.put_slice(&trailer.auth_value);

        Ok(auth_length)
    }

    /// Splits the trailer off the end of `body`.
    ///
    /// Returns the body with trailer and padding removed, and the trailer if
    /// `auth_length` is nonzero.
    pub fn split_from_tail<'a>(
        body: &'a [u8],
        auth_length: u16,
        order: ByteOrder,
    ) -> Result<(&'a [u8], Option<Self>)> {
        if auth_length == 0 {
            return Ok((body, None));
        }

        let total = SEC_TRAILER_SIZE + usize::from(auth_length);
        if total > body.len() {
            return Err(ProtocolError::MalformedInput {
                field: constants::ERR_AUTH_LENGTH_TOO_LARGE,
                needed: total,
                available: body.len(),
            });
        }
        let trailer_start = body.len() - total;

        let mut reader = WireReader::new(&body[trailer_start..]);
        let auth_type = AuthType::from(reader.read_u8("auth_type")?);
        let auth_level = AuthLevel::from(reader.read_u8("auth_level")?);
        let auth_pad_length = reader.read_u8("auth_pad_length")?;
        let auth_reserved = reader.read_u8("auth_reserved")?;
        let auth_context_id = reader.read_u32("auth_context_id", order)?;
        let auth_value = Bytes::copy_from_slice(reader.read_bytes("auth_value", reader.remaining())?);

        let pad = usize::from(auth_pad_length);
        if pad > trailer_start {
            return Err(ProtocolError::MalformedInput {
                field: constants::ERR_AUTH_PAD_TOO_LARGE,
                needed: pad,
                available: trailer_start,
            });
        }

        let trailer = Self {
            auth_type,
            auth_level,
            auth_pad_length,
            auth_reserved,
            auth_context_id,
            auth_value,
        };
        Ok((&body[..trailer_start - pad], Some(trailer)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ntlm_trailer() -> SecurityTrailer {
        SecurityTrailer::new(
            AuthType::WinNt,
            AuthLevel::PacketIntegrity,
            0x0102_0304,
            vec![0xAA; 12],
        )
    }

    #[test]
    fn absent_trailer_writes_nothing() {
        let mut writer = WireWriter::new();
        let auth_length = SecurityTrailer::encode(None, &mut writer, 13, ByteOrder::Little).unwrap();
        assert_eq!(auth_length, 0);
        assert!(writer.is_empty());
    }

    #[test]
    fn pads_to_four_bytes() {
        assert_eq!(SecurityTrailer::pad_for(56), 0);
        assert_eq!(SecurityTrailer::pad_for(57), 3);
        assert_eq!(SecurityTrailer::pad_for(58), 2);
        assert_eq!(SecurityTrailer::pad_for(59), 1);
    }

    #[test]
    fn encode_then_split_recovers_body_and_trailer() {
        let body = [0x11u8; 6];
        let trailer = ntlm_trailer();

        let mut writer = WireWriter::new();
        writer.put_slice(&body);
        let auth_length =
            SecurityTrailer::encode(Some(&trailer), &mut writer, body.len(), ByteOrder::Big)
                .unwrap();
        assert_eq!(auth_length, 12);
        assert_eq!(writer.len(), body.len() + trailer.encoded_len(body.len()));

        let bytes = writer.into_bytes();
        // pad(2) then sec_trailer
        assert_eq!(&bytes[6..8], &[0, 0]);
        assert_eq!(bytes[8], 0x0A);
        assert_eq!(bytes[10], 2);
        assert_eq!(&bytes[12..16], &[0x01, 0x02, 0x03, 0x04]);

        let (rest, decoded) =
            SecurityTrailer::split_from_tail(&bytes, auth_length, ByteOrder::Big).unwrap();
        assert_eq!(rest, &body);
        let decoded = decoded.unwrap();
        assert_eq!(decoded.auth_pad_length, 2);
        assert_eq!(decoded.auth_context_id, 0x0102_0304);
        assert_eq!(decoded.auth_value.as_ref(), &[0xAA; 12]);
    }

    #[test]
    fn split_without_auth_length_is_identity() {
        let body = [1u8, 2, 3];
        let (rest, trailer) = SecurityTrailer::split_from_tail(&body, 0, ByteOrder::Little).unwrap();
        assert_eq!(rest, &body);
        assert!(trailer.is_none());
    }

    #[test]
    fn auth_length_beyond_body_is_malformed() {
        let body = [0u8; 10];
        let err = SecurityTrailer::split_from_tail(&body, 4, ByteOrder::Little).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedInput { needed: 12, .. }));
    }

    #[test]
    fn pad_beyond_body_is_malformed() {
        // sec_trailer claiming 3 pad bytes with nothing before it
        let body = [0x0A, 0x02, 0x03, 0x00, 0, 0, 0, 0, 0xFF];
        let err = SecurityTrailer::split_from_tail(&body, 1, ByteOrder::Little).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedInput { .. }));
    }

    #[test]
    fn auth_type_codes_roundtrip_unknown() {
        assert_eq!(AuthType::from(0x0A), AuthType::WinNt);
        assert_eq!(u8::from(AuthType::from(0x77)), 0x77);
        assert_eq!(AuthLevel::from(6), AuthLevel::PacketPrivacy);
        assert_eq!(u8::from(AuthLevel::Other(9)), 9);
    }
}
