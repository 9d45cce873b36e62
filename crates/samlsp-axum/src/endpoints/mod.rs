//! SAML endpoint handlers.
//!
//! Each endpoint has an orchestrator that does the work against a
//! [`RequestContext`](crate::RequestContext) and a thin axum handler around
//! it:
//!
//! - **SSO** - [`start_login`] / [`sso`]
//! - **ACS** - [`handle_acs`] / [`acs`]
//! - **Logout** - [`start_logout`] / [`logout`]
//! - **Metadata** - [`render_metadata`] / [`metadata`]

mod acs;
mod logout;
mod metadata;
mod response;
mod router;
mod sso;
mod state;

pub use acs::*;
pub use logout::*;
pub use metadata::*;
pub use response::*;
pub use router::*;
pub use sso::*;
pub use state::*;
