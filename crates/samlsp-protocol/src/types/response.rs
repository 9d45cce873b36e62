//! Parsed SAML Response types.
//!
//! What the service provider keeps from an IdP `samlp:Response` once it has
//! been decoded and validated.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status_codes;

/// Identity attributes: attribute name to its ordered values.
pub type Attributes = BTreeMap<String, Vec<String>>;

/// Subject identifier taken from `saml:Subject/saml:NameID`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameId {
    /// Identifier text.
    pub value: String,
    /// `Format` attribute URI, when the IdP sent one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl NameId {
    /// Name ID without a format.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            format: None,
        }
    }
}

impl std::fmt::Display for NameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// SAML protocol status of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Top-level status code URI.
    pub code: String,

    /// Nested second-level status code URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_code: Option<String>,

    /// Optional status message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Status {
    /// Creates a success status.
    #[must_use]
    pub fn success() -> Self {
        Self {
            code: status_codes::SUCCESS.to_string(),
            sub_code: None,
            message: None,
        }
    }

    /// Returns true if this is a success status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == status_codes::SUCCESS
    }

    /// Human-readable description used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = self.sub_code.as_deref().unwrap_or(&self.code).to_string();
        if let Some(message) = &self.message {
            out.push_str(": ");
            out.push_str(message);
        }
        out
    }
}

/// Assertion validity window and audience restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditions {
    /// Earliest instant the assertion is valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,

    /// Instant from which the assertion is no longer valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_on_or_after: Option<DateTime<Utc>>,

    /// Audience URIs the assertion is restricted to.
    #[serde(default)]
    pub audiences: Vec<String>,
}

/// A validated authentication response.
///
/// Produced by [`ProtocolClient::parse_response`](crate::ProtocolClient::parse_response)
/// after status, issuer, destination, conditions and signatures were checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthnResponse {
    /// Response ID.
    pub id: String,

    /// IdP entity ID that issued the response.
    pub issuer: String,

    /// ID of the request this answers, absent for unsolicited responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<String>,

    /// Destination the IdP addressed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// Response status.
    pub status: Status,

    /// Assertion subject.
    pub name_id: NameId,

    /// Session index from the authentication statement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_index: Option<String>,

    /// Assertion conditions.
    #[serde(default)]
    pub conditions: Conditions,

    /// Identity attributes.
    #[serde(default)]
    pub attributes: Attributes,

    /// Whether the response envelope carried a verified signature.
    #[serde(default)]
    pub response_signed: bool,

    /// Whether the assertion carried a verified signature.
    #[serde(default)]
    pub assertion_signed: bool,
}

impl AuthnResponse {
    /// String form of the subject.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.name_id.value
    }

    /// Returns the values of an attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&[String]> {
        self.attributes.get(name).map(Vec::as_slice)
    }
}
