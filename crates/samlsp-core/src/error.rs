//! Error handling for the SAML service provider.
//!
//! Startup failures ([`Error::MetadataFetch`], [`Error::Http`],
//! [`Error::Configuration`]) abort initialization. Per-request protocol
//! failures are routed to the `AuthError` event channel instead of being
//! returned to the caller; [`Error::MissingResponse`] and listener failures
//! are the only per-request errors that reach the HTTP response.

use samlsp_protocol::SamlError;
use samlsp_session::SessionError;
use thiserror::Error;

/// Result type alias using the service provider error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for service provider operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The IdP metadata endpoint answered with a non-success status.
    #[error("unexpected status code {status} fetching metadata from {url}")]
    MetadataFetch {
        /// Metadata URL.
        url: String,
        /// HTTP status received.
        status: u16,
        /// Response body, kept for diagnostics.
        body: String,
    },

    /// Transport failure while fetching metadata.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Invalid SP settings or unusable IdP metadata.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The ACS request carried no `SAMLResponse` form field.
    #[error("Missing SAMLResponse POST data")]
    MissingResponse,

    /// The response failed parsing or validation.
    #[error("SAML response rejected: {0}")]
    ProtocolValidation(#[from] SamlError),

    /// The response was accepted but produced no identity.
    #[error("Unknown SAML error, please check logs")]
    UnknownProtocol,

    /// An event listener failed.
    #[error("{event} listener failed: {source}")]
    Listener {
        /// Name of the event being delivered.
        event: &'static str,
        /// The listener's error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Session storage failure.
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

impl Error {
    /// Returns the HTTP status code used when this error reaches a response.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::ProtocolValidation(e) => e.http_status(),
            Self::MetadataFetch { .. }
            | Self::Http(_)
            | Self::Configuration(_)
            | Self::MissingResponse
            | Self::UnknownProtocol
            | Self::Listener { .. }
            | Self::Session(_) => 500,
        }
    }

    /// Maps a client construction failure: metadata and settings problems
    /// are configuration errors, anything else is a protocol error.
    #[must_use]
    pub fn from_client_build(err: SamlError) -> Self {
        if err.is_configuration() {
            Self::Configuration(err.to_string())
        } else {
            Self::ProtocolValidation(err)
        }
    }
}
