//! # samlsp-axum
//!
//! Axum integration for the SAML 2.0 service provider.
//!
//! ```rust,ignore
//! use samlsp_axum::{SamlSp, SessionManager};
//! use samlsp_core::SamlSettings;
//! use samlsp_session::MemorySessionStore;
//!
//! let sp = SamlSp::builder(SamlSettings::from_env()?).init().await?;
//! let sessions = SessionManager::new(Arc::new(MemorySessionStore::new()));
//! let app = sessions.wrap(Router::new().merge(sp.router()));
//! ```
//!
//! # Architecture
//!
//! - [`extension`] - [`SamlSp`] builder: settings, metadata fetch, listeners
//! - [`endpoints`] - SSO, ACS, logout and metadata orchestrators and handlers
//! - [`return_to`] - Post-login navigation target resolution
//! - [`binder`] - The default session binder
//! - [`session_layer`] - Cookie-backed session middleware
//! - [`fetch`] - IdP metadata retrieval
//! - [`request`] - Request root and query of the current request

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod binder;
pub mod endpoints;
pub mod extension;
pub mod fetch;
pub mod request;
pub mod return_to;
pub mod session_layer;

pub use binder::{DefaultSessionBinder, SessionRecord, SESSION_KEY};
pub use endpoints::{saml_router, SamlState, SpRedirect};
pub use extension::{SamlSp, SamlSpBuilder};
pub use fetch::fetch_metadata;
pub use request::RequestContext;
pub use session_layer::{SessionCookieConfig, SessionManager};
