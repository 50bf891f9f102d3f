//! # Common PDU Header
//!
//! The 16-byte header that precedes every connection-oriented PDU.
//!
//! ## Wire Format
//! ```text
//! [rpc_vers(1)] [rpc_vers_minor(1)] [PTYPE(1)] [pfc_flags(1)]
//! [packed_drep(4)] [frag_length(2)] [auth_length(2)] [call_id(4)]
//! ```
//!
//! `frag_length`, `auth_length` and `call_id` follow the byte order declared by
//! `packed_drep`, like every other integer in the message.

use crate::config::{RPC_VERSION, RPC_VERSION_MINOR};
use crate::core::cursor::{ByteOrder, WireReader, WireWriter};
use crate::error::{constants, ProtocolError, Result};

/// Size of the common header in bytes.
pub const COMMON_HEADER_SIZE: usize = 16;

/// Byte offset of `frag_length` inside the common header.
pub const FRAG_LENGTH_OFFSET: usize = 8;

/// Connection-oriented packet types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    Request = 0,
    Response = 2,
    Fault = 3,
    Bind = 11,
    BindAck = 12,
    BindNak = 13,
    AlterContext = 14,
    AlterContextResp = 15,
    Auth3 = 16,
    Shutdown = 17,
    CoCancel = 18,
    Orphaned = 19,
}

impl PacketType {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(PacketType::Request),
            2 => Ok(PacketType::Response),
            3 => Ok(PacketType::Fault),
            11 => Ok(PacketType::Bind),
            12 => Ok(PacketType::BindAck),
            13 => Ok(PacketType::BindNak),
            14 => Ok(PacketType::AlterContext),
            15 => Ok(PacketType::AlterContextResp),
            16 => Ok(PacketType::Auth3),
            17 => Ok(PacketType::Shutdown),
            18 => Ok(PacketType::CoCancel),
            19 => Ok(PacketType::Orphaned),
            other => Err(ProtocolError::UnknownPacketType(other)),
        }
    }

    /// Returns true for the packet types whose body is a bind request.
    pub fn carries_bind_body(self) -> bool {
        matches!(self, PacketType::Bind | PacketType::AlterContext)
    }
}

/// The `pfc_flags` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PfcFlags(u8);

impl PfcFlags {
    pub const FIRST_FRAG: u8 = 0x01;
    pub const LAST_FRAG: u8 = 0x02;
    /// Same bit as `PENDING_CANCEL`; in bind PDUs it requests header signing.
    pub const SUPPORT_HEADER_SIGN: u8 = 0x04;
    pub const PENDING_CANCEL: u8 = 0x04;
    pub const CONC_MPX: u8 = 0x10;
    pub const DID_NOT_EXECUTE: u8 = 0x20;
    pub const MAYBE: u8 = 0x40;
    pub const OBJECT_UUID: u8 = 0x80;

    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    /// First and last fragment set: an unfragmented PDU.
    pub const fn complete() -> Self {
        Self(Self::FIRST_FRAG | Self::LAST_FRAG)
    }

    pub const fn contains(self, bit: u8) -> bool {
        self.0 & bit == bit
    }

    #[must_use]
    pub const fn with(self, bit: u8) -> Self {
        Self(self.0 | bit)
    }

    pub const fn is_first_frag(self) -> bool {
        self.contains(Self::FIRST_FRAG)
    }

    pub const fn is_last_frag(self) -> bool {
        self.contains(Self::LAST_FRAG)
    }
}

/// Integer representation nibble of `packed_drep`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegerRepresentation {
    BigEndian = 0,
    LittleEndian = 1,
}

/// Character representation nibble of `packed_drep`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterRepresentation {
    Ascii = 0,
    Ebcdic = 1,
}

/// Floating point representation byte of `packed_drep`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatRepresentation {
    Ieee = 0,
    Vax = 1,
    Cray = 2,
    Ibm = 3,
}

/// The 4-byte data representation label of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataRepresentation {
    pub integer: IntegerRepresentation,
    pub character: CharacterRepresentation,
    pub floating: FloatRepresentation,
}

impl DataRepresentation {
    /// Little-endian, ASCII, IEEE: `10 00 00 00`.
    pub const fn ndr() -> Self {
        Self {
            integer: IntegerRepresentation::LittleEndian,
            character: CharacterRepresentation::Ascii,
            floating: FloatRepresentation::Ieee,
        }
    }

    pub const fn big_endian() -> Self {
        Self {
            integer: IntegerRepresentation::BigEndian,
            character: CharacterRepresentation::Ascii,
            floating: FloatRepresentation::Ieee,
        }
    }

    /// Label for the given integer byte order, ASCII and IEEE otherwise.
    pub const fn for_order(order: ByteOrder) -> Self {
        match order {
            ByteOrder::Little => Self::ndr(),
            ByteOrder::Big => Self::big_endian(),
        }
    }

    pub fn is_canonical(&self) -> bool {
        *self == Self::ndr()
    }

    /// Byte order every integer of the message is written in.
    pub fn byte_order(&self) -> ByteOrder {
        match self.integer {
            IntegerRepresentation::LittleEndian => ByteOrder::Little,
            IntegerRepresentation::BigEndian => ByteOrder::Big,
        }
    }

    pub fn to_bytes(self) -> [u8; 4] {
        [
            ((self.integer as u8) << 4) | self.character as u8,
            self.floating as u8,
            0,
            0,
        ]
    }

    pub fn from_bytes(raw: [u8; 4]) -> Self {
        let integer = if raw[0] & 0xF0 == 0 {
            IntegerRepresentation::BigEndian
        } else {
            IntegerRepresentation::LittleEndian
        };
        let character = if raw[0] & 0x0F == 0 {
            CharacterRepresentation::Ascii
        } else {
            CharacterRepresentation::Ebcdic
        };
        let floating = match raw[1] {
            0 => FloatRepresentation::Ieee,
            1 => FloatRepresentation::Vax,
            2 => FloatRepresentation::Cray,
            _ => FloatRepresentation::Ibm,
        };
        Self {
            integer,
            character,
            floating,
        }
    }
}

impl Default for DataRepresentation {
    fn default() -> Self {
        Self::ndr()
    }
}

/// Decoded common header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PduHeader {
    pub rpc_vers: u8,
    pub rpc_vers_minor: u8,
    pub packet_type: PacketType,
    pub flags: PfcFlags,
    pub drep: DataRepresentation,
    /// Total fragment length including this header and any trailer
    pub frag_length: u16,
    /// Length of the auth_value only, excluding the 8-byte sec_trailer
    pub auth_length: u16,
    pub call_id: u32,
}

impl PduHeader {
    /// Header for an unfragmented PDU; lengths are filled in at encode.
    pub fn new(packet_type: PacketType, call_id: u32, drep: DataRepresentation) -> Self {
        Self {
            rpc_vers: RPC_VERSION,
            rpc_vers_minor: RPC_VERSION_MINOR,
            packet_type,
            flags: PfcFlags::complete(),
            drep,
            frag_length: 0,
            auth_length: 0,
            call_id,
        }
    }

    pub fn encode(&self, writer: &mut WireWriter) {
        let order = self.drep.byte_order();
        writer.put_u8(self.rpc_vers);
        writer.put_u8(self.rpc_vers_minor);
        writer.put_u8(self.packet_type as u8);
        writer.put_u8(self.flags.raw());
        writer.put_slice(&self.drep.to_bytes());
        writer.put_u16(self.frag_length, order);
        writer.put_u16(self.auth_length, order);
        writer.put_u32(self.call_id, order);
    }

    pub fn decode(reader: &mut WireReader<'_>) -> Result<Self> {
        reader.ensure("common header", COMMON_HEADER_SIZE)?;

        let rpc_vers = reader.read_u8("rpc_vers")?;
        if rpc_vers != RPC_VERSION {
            return Err(ProtocolError::UnsupportedVersion(rpc_vers));
        }
        let rpc_vers_minor = reader.read_u8("rpc_vers_minor")?;
        let packet_type = PacketType::from_u8(reader.read_u8("PTYPE")?)?;
        let flags = PfcFlags::from_raw(reader.read_u8("pfc_flags")?);
        let drep = DataRepresentation::from_bytes(reader.read_array("packed_drep")?);

        let order = drep.byte_order();
        let frag_length = reader.read_u16("frag_length", order)?;
        let auth_length = reader.read_u16("auth_length", order)?;
        let call_id = reader.read_u32("call_id", order)?;

        if usize::from(frag_length) < COMMON_HEADER_SIZE {
            return Err(ProtocolError::InvalidHeader(
                constants::ERR_FRAG_LENGTH_TOO_SMALL,
            ));
        }

        Ok(Self {
            rpc_vers,
            rpc_vers_minor,
            packet_type,
            flags,
            drep,
            frag_length,
            auth_length,
            call_id,
        })
    }

    /// Reads only `frag_length` from the first 16 bytes of a stream.
    pub fn peek_frag_length(buf: &[u8]) -> Option<u16> {
        if buf.len() < COMMON_HEADER_SIZE {
            return None;
        }
        let drep = DataRepresentation::from_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let raw = [buf[FRAG_LENGTH_OFFSET], buf[FRAG_LENGTH_OFFSET + 1]];
        Some(match drep.byte_order() {
            ByteOrder::Little => u16::from_le_bytes(raw),
            ByteOrder::Big => u16::from_be_bytes(raw),
        })
    }
}
