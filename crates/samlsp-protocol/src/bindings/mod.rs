//! Message transport encodings.
//!
//! AuthnRequests leave through [`HttpRedirectBinding`] (raw DEFLATE, base64,
//! URL encoding) and responses arrive through [`HttpPostBinding`] (base64
//! form field).
//!
//! ```rust,ignore
//! use samlsp_protocol::bindings::{HttpPostBinding, HttpRedirectBinding};
//!
//! let location = HttpRedirectBinding::encode_request(&xml, sso_url, Some("/next"))?;
//! let message = HttpPostBinding::decode_response(&form_field, None)?;
//! ```

mod post;
mod redirect;

pub use post::*;
pub use redirect::*;

/// Which side of the exchange a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamlMessageType {
    /// Sent by the SP.
    Request,
    /// Sent by the IdP.
    Response,
}

impl SamlMessageType {
    /// Query or form field carrying the message.
    #[must_use]
    pub const fn form_param(&self) -> &'static str {
        match self {
            Self::Request => "SAMLRequest",
            Self::Response => "SAMLResponse",
        }
    }
}

/// A message taken off the wire, still unparsed.
#[derive(Debug, Clone)]
pub struct DecodedMessage {
    /// Message XML.
    pub xml: String,
    /// Request or response.
    pub message_type: SamlMessageType,
    /// `RelayState` that travelled with it.
    pub relay_state: Option<String>,
}
