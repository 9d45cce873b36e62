//! SAML 2.0 types and data structures.
//!
//! The outbound [`AuthnRequest`] and the parsed, validated [`AuthnResponse`].

mod authn_request;
mod constants;
mod response;

pub use authn_request::*;
pub use constants::*;
pub use response::*;
