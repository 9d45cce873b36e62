//! SAML 2.0 Service Provider protocol primitives.
//!
//! This crate is the protocol-library half of the service provider. It knows
//! how to talk SAML but nothing about HTTP frameworks, sessions or events:
//!
//! - **AuthnRequest construction** - Build requests asking the IdP to authenticate a user
//! - **Response parsing and validation** - Turn a POSTed `SAMLResponse` into an identity
//! - **Bindings** - HTTP-Redirect (outbound) and HTTP-POST (inbound) encodings
//! - **Metadata** - Read the IdP descriptor and render SP metadata
//!
//! # Architecture
//!
//! - [`types`] - Core SAML types and constants
//! - [`bindings`] - POST and Redirect binding implementations
//! - [`metadata`] - IdP descriptor reading and SP metadata rendering
//! - [`client`] - The [`ProtocolClient`] / [`ClientFactory`] seams and the built-in [`BasicClient`]
//! - [`signature`] - The [`SignatureVerifier`] seam for XML signature checks
//! - [`error`] - Error types for SAML operations
//!
//! # Example
//!
//! ```rust,ignore
//! use samlsp_protocol::{BasicClientFactory, ClientFactory, ClientSettings, IdpMetadata};
//!
//! let client = BasicClientFactory::default().build_client(&settings, &metadata)?;
//! let prepared = client.prepare_authentication_request("https://app.example.com/")?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bindings;
pub mod client;
pub mod error;
pub mod metadata;
mod parser;
pub mod signature;
pub mod types;

pub use client::{
    BasicClient, BasicClientFactory, ClientFactory, ClientSettings, PreparedRequest,
    ProtocolClient, ProtocolPolicy,
};
pub use error::{SamlError, SamlResult};
pub use metadata::{IdpDescriptor, IdpMetadata};
pub use signature::{SignatureScope, SignatureVerifier};
pub use types::*;
