//! HTTP-Redirect binding.

use std::io::{Read, Write};

use base64::{engine::general_purpose::STANDARD, Engine};
use flate2::{read::DeflateDecoder, write::DeflateEncoder, Compression};

use crate::error::{SamlError, SamlResult};

use super::{DecodedMessage, SamlMessageType};

/// Query-string transport for SAML messages.
pub struct HttpRedirectBinding;

impl HttpRedirectBinding {
    /// Builds the IdP URL carrying `xml` as `SAMLRequest`.
    ///
    /// `destination` may already have a query; the message parameters are
    /// appended to it.
    pub fn encode_request(
        xml: &str,
        destination: &str,
        relay_state: Option<&str>,
    ) -> SamlResult<String> {
        let payload = STANDARD.encode(deflate_compress(xml.as_bytes())?);

        let mut query = format!(
            "{}={}",
            SamlMessageType::Request.form_param(),
            urlencoding::encode(&payload)
        );
        if let Some(relay) = relay_state {
            query.push_str("&RelayState=");
            query.push_str(&urlencoding::encode(relay));
        }

        let joiner = if destination.contains('?') { '&' } else { '?' };
        Ok(format!("{destination}{joiner}{query}"))
    }

    /// Extracts and inflates the message carried by a redirect URL.
    pub fn decode_url(url: &str) -> SamlResult<DecodedMessage> {
        let url = url::Url::parse(url)
            .map_err(|e| SamlError::InvalidResponse(format!("not a URL: {e}")))?;

        let field = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        };

        let (payload, message_type) = [SamlMessageType::Request, SamlMessageType::Response]
            .into_iter()
            .find_map(|kind| field(kind.form_param()).map(|payload| (payload, kind)))
            .ok_or_else(|| {
                SamlError::MissingElement("SAMLRequest or SAMLResponse parameter".to_string())
            })?;

        let inflated = deflate_decompress(&STANDARD.decode(payload)?)?;
        let xml = String::from_utf8(inflated)
            .map_err(|e| SamlError::InvalidResponse(format!("message is not UTF-8: {e}")))?;

        Ok(DecodedMessage {
            xml,
            message_type,
            relay_state: field("RelayState"),
        })
    }
}

/// Raw DEFLATE, no zlib header.
fn deflate_compress(data: &[u8]) -> SamlResult<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn deflate_decompress(data: &[u8]) -> SamlResult<Vec<u8>> {
    let mut inflated = Vec::new();
    DeflateDecoder::new(data).read_to_end(&mut inflated)?;
    Ok(inflated)
}
