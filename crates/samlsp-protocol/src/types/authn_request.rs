//! The `samlp:AuthnRequest` message an SP sends to start a login.

use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};

use super::{NameIdFormat, SamlBinding, SAMLP_NS, SAML_NS};

/// Login request addressed to an identity provider.
///
/// Optional attributes are left out of the serialized document when unset,
/// so the IdP applies its own defaults for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthnRequest {
    /// `ID` attribute, echoed back as `InResponseTo`.
    pub id: String,
    /// `IssueInstant`, second precision.
    pub issue_instant: DateTime<Utc>,
    /// Entity ID of the requesting SP.
    pub issuer: String,
    /// Where the IdP posts its response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion_consumer_service_url: Option<String>,
    /// IdP endpoint the request is sent to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// Binding URI the IdP should answer with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_binding: Option<String>,
    /// Format URI for `NameIDPolicy`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_id_format: Option<String>,
    /// Ask the IdP to re-authenticate even with a live IdP session.
    #[serde(default)]
    pub force_authn: bool,
    /// Forbid the IdP from interacting with the user.
    #[serde(default)]
    pub is_passive: bool,
}

impl AuthnRequest {
    /// Fresh request with a random `id-` prefixed ID, stamped now.
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            id: format!("id-{}", uuid::Uuid::new_v4().simple()),
            issue_instant: Utc::now(),
            issuer: issuer.into(),
            assertion_consumer_service_url: None,
            destination: None,
            protocol_binding: None,
            name_id_format: None,
            force_authn: false,
            is_passive: false,
        }
    }

    /// Sets the ACS URL.
    #[must_use]
    pub fn with_acs_url(self, url: impl Into<String>) -> Self {
        Self {
            assertion_consumer_service_url: Some(url.into()),
            ..self
        }
    }

    /// Sets `Destination`.
    #[must_use]
    pub fn with_destination(self, url: impl Into<String>) -> Self {
        Self {
            destination: Some(url.into()),
            ..self
        }
    }

    /// Sets the response binding.
    #[must_use]
    pub fn with_binding(self, binding: SamlBinding) -> Self {
        Self {
            protocol_binding: Some(binding.uri().to_owned()),
            ..self
        }
    }

    /// Requests a NameID format.
    #[must_use]
    pub fn with_name_id_format(self, format: NameIdFormat) -> Self {
        Self {
            name_id_format: Some(format.uri().to_owned()),
            ..self
        }
    }

    /// Sets `ForceAuthn`.
    #[must_use]
    pub const fn force_authn(mut self, on: bool) -> Self {
        self.force_authn = on;
        self
    }

    /// Sets `IsPassive`.
    #[must_use]
    pub const fn is_passive(mut self, on: bool) -> Self {
        self.is_passive = on;
        self
    }

    /// Known binding behind `protocol_binding`, if it names one.
    #[must_use]
    pub fn parsed_binding(&self) -> Option<SamlBinding> {
        self.protocol_binding
            .as_deref()
            .and_then(SamlBinding::from_uri)
    }

    /// Renders the request as a compact, unsigned XML document.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut xml = format!(
            r#"<samlp:AuthnRequest xmlns:samlp="{SAMLP_NS}" xmlns:saml="{SAML_NS}" ID="{}" Version="2.0" IssueInstant="{}""#,
            escape(self.id.as_str()),
            self.issue_instant
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        );

        let optional = [
            ("Destination", self.destination.as_deref()),
            (
                "AssertionConsumerServiceURL",
                self.assertion_consumer_service_url.as_deref(),
            ),
            ("ProtocolBinding", self.protocol_binding.as_deref()),
            ("ForceAuthn", self.force_authn.then_some("true")),
            ("IsPassive", self.is_passive.then_some("true")),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                // Writing into a String cannot fail.
                let _ = write!(xml, r#" {name}="{}""#, escape(value));
            }
        }

        let _ = write!(
            xml,
            "><saml:Issuer>{}</saml:Issuer>",
            escape(self.issuer.as_str())
        );
        if let Some(format) = &self.name_id_format {
            let _ = write!(
                xml,
                r#"<samlp:NameIDPolicy Format="{}" AllowCreate="true"/>"#,
                escape(format.as_str())
            );
        }
        xml.push_str("</samlp:AuthnRequest>");
        xml
    }
}
