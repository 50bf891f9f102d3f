//! # Core Framing Components
//!
//! Low-level byte handling shared by every PDU body codec.
//!
//! ## Components
//! - **Cursor**: bounds-checked reader/writer with explicit byte order
//! - **Header**: the 16-byte common connection-oriented header
//! - **Codec**: Tokio codec splitting a byte stream into fragments
//!
//! ## Wire Format
//! ```text
//! [rpc_vers(1)] [minor(1)] [PTYPE(1)] [flags(1)] [drep(4)] [frag_length(2)] [auth_length(2)] [call_id(4)] [body(N)]
//! ```
//!
//! ## Safety
//! - `frag_length` is validated against the configured maximum before buffering
//! - Declared counts are checked against the bytes present before allocation

pub mod codec;
pub mod cursor;
pub mod header;
