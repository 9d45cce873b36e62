//! # samlsp-server
//!
//! A small application protected by the SAML service provider: an index
//! page showing who is logged in and an `/admin` page that sends anonymous
//! users through SSO.
//!
//! The binary uses the built-in client, which has no signature verifier, so
//! it refuses to start while signed assertions are required. Run it with
//! `SAML_WANT_ASSERTIONS_SIGNED=false` against a test IdP.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
pub mod config;

pub use app::{app_router, register_listeners};
pub use config::ServerConfig;
