//! Form-posted messages: plain base64, no compression.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::{DecodedMessage, SamlMessageType};
use crate::error::{SamlError, SamlResult};

/// HTTP-POST binding codec.
pub struct HttpPostBinding;

impl HttpPostBinding {
    /// Decodes the `SAMLResponse` form field.
    ///
    /// IdPs commonly wrap the base64 payload across lines, so ASCII
    /// whitespace is dropped before decoding.
    pub fn decode_response(
        saml_response: &str,
        relay_state: Option<&str>,
    ) -> SamlResult<DecodedMessage> {
        let compact: String = saml_response
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();

        if compact.is_empty() {
            return Err(SamlError::InvalidResponse(
                "empty SAMLResponse parameter".to_string(),
            ));
        }

        let bytes = STANDARD.decode(compact)?;
        let xml = String::from_utf8(bytes).map_err(|e| {
            SamlError::InvalidResponse(format!("SAMLResponse is not UTF-8: {e}"))
        })?;

        Ok(DecodedMessage {
            message_type: SamlMessageType::Response,
            relay_state: relay_state.map(str::to_owned),
            xml,
        })
    }

    /// Encodes a message the way an IdP would post it.
    #[must_use]
    pub fn encode(xml: &str) -> String {
        STANDARD.encode(xml)
    }
}
