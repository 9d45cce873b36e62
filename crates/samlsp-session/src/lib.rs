//! # samlsp-session
//!
//! Session handling for the SAML service provider.
//!
//! A [`Session`] is the mutable key/value map attached to one request. A
//! [`SessionStore`] persists that map between requests under an opaque
//! session ID carried by a cookie.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod session;
pub mod store;

pub use error::{SessionError, SessionResult};
pub use session::{Session, SessionData};
pub use store::{new_session_id, MemorySessionStore, SessionStore};
