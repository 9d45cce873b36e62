//! Protocol-level failures.
//!
//! Variants fall in three groups: the message could not be decoded, the
//! message decoded but is not trustworthy, or the SP itself is misconfigured.
//! Only the last group is fatal to the SP; the orchestrators turn the other
//! two into `error` events.

use thiserror::Error;

/// Result alias for protocol operations.
pub type SamlResult<T> = Result<T, SamlError>;

/// Everything that can go wrong between the wire and a validated identity.
#[derive(Debug, Error)]
pub enum SamlError {
    /// Structurally wrong message.
    #[error("malformed SAML message: {0}")]
    InvalidResponse(String),

    /// The XML itself did not parse.
    #[error("XML error: {0}")]
    XmlParse(String),

    /// A required signature is missing or did not verify.
    #[error("signature rejected: {0}")]
    SignatureInvalid(String),

    /// A required element or attribute is absent.
    #[error("{0} is missing")]
    MissingElement(String),

    /// `NotOnOrAfter` has passed.
    #[error("assertion has expired")]
    AssertionExpired,

    /// `NotBefore` lies in the future.
    #[error("assertion is not valid yet")]
    AssertionNotYetValid,

    /// The audience restriction names another SP.
    #[error("audience mismatch: wanted {expected}, assertion is for {actual}")]
    InvalidAudience {
        /// Our entity ID.
        expected: String,
        /// Audiences found.
        actual: String,
    },

    /// The message was issued by someone other than the configured IdP.
    #[error("issuer mismatch: wanted {expected}, message is from {actual}")]
    InvalidIssuer {
        /// IdP entity ID from metadata.
        expected: String,
        /// Issuer found.
        actual: String,
    },

    /// The response was addressed to another endpoint.
    #[error("destination mismatch: wanted {expected}, message is for {actual}")]
    InvalidDestination {
        /// Our ACS URL.
        expected: String,
        /// `Destination` found.
        actual: String,
    },

    /// `InResponseTo` matches no request we sent.
    #[error("response does not answer a request issued by this SP")]
    UnsolicitedResponse,

    /// The IdP answered with a non-success status.
    #[error("IdP refused authentication: {0}")]
    AuthenticationFailed(String),

    /// A binding this SP does not handle here.
    #[error("binding {0} is not supported")]
    UnsupportedBinding(String),

    /// Bad base64 payload.
    #[error("payload is not valid base64: {0}")]
    Base64Decode(String),

    /// Bad DEFLATE payload.
    #[error("payload could not be inflated: {0}")]
    Deflate(String),

    /// IdP metadata is unusable.
    #[error("IdP metadata: {0}")]
    Metadata(String),

    /// Unsupported or inconsistent SP settings.
    #[error("SP configuration: {0}")]
    Configuration(String),
}

impl SamlError {
    /// Status used when the error reaches an HTTP response: 400 for
    /// undecodable input, 401 for untrusted input, 500 for configuration.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidResponse(_)
            | Self::MissingElement(_)
            | Self::Base64Decode(_)
            | Self::Deflate(_)
            | Self::XmlParse(_)
            | Self::UnsupportedBinding(_) => 400,
            Self::SignatureInvalid(_)
            | Self::AuthenticationFailed(_)
            | Self::AssertionExpired
            | Self::AssertionNotYetValid
            | Self::InvalidAudience { .. }
            | Self::InvalidIssuer { .. }
            | Self::InvalidDestination { .. }
            | Self::UnsolicitedResponse => 401,
            Self::Metadata(_) | Self::Configuration(_) => 500,
        }
    }

    /// Whether the SP cannot work at all, as opposed to one bad message.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Metadata(_) | Self::Configuration(_))
    }
}

macro_rules! from_error {
    ($source:ty => $variant:ident) => {
        impl From<$source> for SamlError {
            fn from(err: $source) -> Self {
                Self::$variant(err.to_string())
            }
        }
    };
}

from_error!(quick_xml::Error => XmlParse);
from_error!(quick_xml::events::attributes::AttrError => XmlParse);
from_error!(base64::DecodeError => Base64Decode);
// Only the DEFLATE codec does I/O here.
from_error!(std::io::Error => Deflate);
