//! # samlsp-core
//!
//! Core types for the SAML service provider.
//!
//! - [`config`] - SP settings loaded from the environment or built in code
//! - [`error`] - The error taxonomy shared by every orchestrator
//! - [`event`] - The typed event bus carrying authentication outcomes

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod event;

pub use config::SamlSettings;
pub use error::{Error, Result};
pub use event::{
    AuthError, Authenticated, BoxError, Event, EventBus, EventContext, Listener, ListenerResult,
    LoggedOut, SubscriptionId,
};
