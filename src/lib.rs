//! # dcerpc-bind
//!
//! Byte-exact encoding and decoding of the connection-oriented DCE/RPC `bind`
//! request and its `alter_context` twin: the message a client sends to propose
//! interface/transfer-syntax pairs and fragment sizes before any call can flow.
//!
//! ## Layout
//! - [`core`]: byte cursor, common header, stream framing
//! - [`pdu`]: the bind body, syntax identifiers, security trailer
//! - [`config`]: defaults and limits, loadable from TOML or the environment
//! - [`utils`]: logging setup and codec metrics
//!
//! ## Example
//! ```rust
//! use dcerpc_bind::core::header::DataRepresentation;
//! use dcerpc_bind::pdu::{BindPdu, BindRequest, PresentationContext, SyntaxId};
//! use uuid::Uuid;
//!
//! let epm = SyntaxId::new(Uuid::from_u128(0xe1af8308_5d1f_11c9_91a4_08002b14a0fa), 3);
//! let request = BindRequest::new(4280, 4280, 0).with_context(PresentationContext::ndr(0, epm));
//! let pdu = BindPdu::bind(1, request).with_drep(DataRepresentation::big_endian());
//!
//! let bytes = pdu.to_bytes()?;
//! assert_eq!(bytes.len(), 16 + 56);
//! assert_eq!(BindPdu::from_bytes(&bytes)?, pdu);
//! # Ok::<(), dcerpc_bind::error::ProtocolError>(())
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod pdu;
pub mod utils;

pub use crate::core::cursor::{ByteOrder, WireReader, WireWriter};
pub use crate::core::header::{DataRepresentation, PacketType, PduHeader, PfcFlags};
pub use crate::error::{ProtocolError, Result};
pub use crate::pdu::{BindPdu, BindRequest, PresentationContext, SecurityTrailer, SyntaxId};
