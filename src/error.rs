//! # Error Types
//!
//! Error handling for the bind codec and the framing pieces around it.
//!
//! Every codec failure is reported as a [`ProtocolError`]. Decoding builds a fresh
//! value and only hands it back on full success, so an error never leaves a
//! half-populated request behind.
//!
//! ## Error Categories
//! - **Malformed input**: the buffer ran out before a declared field or count could be read
//! - **Oversized lists**: a sequence would not fit its 8-bit wire count on encode
//! - **Header errors**: bad version, unknown packet type, inconsistent fragment length
//! - **Configuration errors**: invalid or unreadable configuration
//!
//! ## Example Usage
//! ```rust
//! use dcerpc_bind::error::{ProtocolError, Result};
//! use dcerpc_bind::pdu::BindPdu;
//! use tracing::{error, info};
//!
//! fn parse(frame: &[u8]) -> Result<BindPdu> {
//!     BindPdu::from_bytes(frame)
//! }
//!
//! match parse(&[0x05, 0x00]) {
//!     Ok(pdu) => info!(call_id = pdu.call_id, "parsed bind"),
//!     Err(e) => error!(error = %e, "rejected bind"),
//! }
//! ```

use std::io;
use thiserror::Error;

/// Static error strings shared by header and trailer validation.
pub mod constants {
    pub const ERR_FRAG_LENGTH_TOO_SMALL: &str = "frag_length smaller than the common header";
    pub const ERR_FRAG_LENGTH_TOO_LARGE: &str = "frag_length exceeds the configured maximum";
    pub const ERR_AUTH_LENGTH_TOO_LARGE: &str = "auth_length exceeds the fragment body";
    pub const ERR_AUTH_PAD_TOO_LARGE: &str = "auth_pad_length exceeds the fragment body";
}

// ProtocolError is the single error type for encode, decode and configuration
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed input: {field} needs {needed} bytes, {available} available")]
    MalformedInput {
        field: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("Oversized list: {what} has {len} entries, the wire count holds at most {max}")]
    OversizedList {
        what: &'static str,
        len: usize,
        max: usize,
    },

    #[error("PDU too large: {0} bytes")]
    OversizedPdu(usize),

    #[error("Invalid PDU header: {0}")]
    InvalidHeader(&'static str),

    #[error("Unsupported RPC version: {0}")]
    UnsupportedVersion(u8),

    #[error("Unknown packet type: {0}")]
    UnknownPacketType(u8),

    #[error("Unexpected packet type: {0}")]
    UnexpectedPacketType(u8),

    #[error("frag_length mismatch: header declares {declared} bytes, buffer holds {actual}")]
    FragLengthMismatch { declared: usize, actual: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
