//! # PDU Bodies
//!
//! Message bodies that follow the common header.
//!
//! ## Components
//! - **Bind**: `bind` / `alter_context` presentation negotiation request
//! - **Syntax**: interface and transfer syntax identifiers
//! - **Auth**: optional security trailer at the end of a fragment

pub mod auth;
pub mod bind;
pub mod syntax;

pub use auth::{AuthLevel, AuthType, SecurityTrailer};
pub use bind::{BindPdu, BindRequest, PresentationContext};
pub use syntax::{SyntaxId, NDR64_TRANSFER_SYNTAX, NDR_TRANSFER_SYNTAX};
