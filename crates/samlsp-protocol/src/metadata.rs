//! IdP metadata reading and SP metadata rendering.
//!
//! [`IdpMetadata`] is the raw document fetched once at startup. Clients read
//! the parts they need from it through [`IdpDescriptor::parse`] every time
//! they are built, so the raw XML is the only thing held for the process
//! lifetime.

use std::sync::Arc;

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::client::ClientSettings;
use crate::error::{SamlError, SamlResult};
use crate::types::{NameIdFormat, SamlBinding, MD_NS, SAMLP_NS};

/// Raw IdP metadata XML, immutable and cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdpMetadata(Arc<str>);

impl IdpMetadata {
    /// Wraps a metadata document.
    #[must_use]
    pub fn new(xml: impl Into<Arc<str>>) -> Self {
        Self(xml.into())
    }

    /// The raw XML.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reads the IdP descriptor out of the document.
    pub fn descriptor(&self) -> SamlResult<IdpDescriptor> {
        IdpDescriptor::parse(&self.0)
    }
}

impl From<String> for IdpMetadata {
    fn from(xml: String) -> Self {
        Self::new(xml)
    }
}

/// The parts of an `IDPSSODescriptor` the service provider relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdpDescriptor {
    /// IdP entity ID, the expected `Issuer` of responses.
    pub entity_id: String,
    /// `SingleSignOnService` endpoints in document order.
    pub sso_services: Vec<(SamlBinding, String)>,
    /// Base64 DER signing certificates.
    pub signing_certificates: Vec<String>,
    /// Attribute names and friendly names the IdP advertises.
    pub attributes: Vec<String>,
    /// Whether the IdP asks for signed AuthnRequests.
    pub want_authn_requests_signed: bool,
}

impl IdpDescriptor {
    /// Parses the first entity carrying an `IDPSSODescriptor`.
    ///
    /// Works on a bare `EntityDescriptor` as well as on an
    /// `EntitiesDescriptor` aggregate.
    pub fn parse(xml: &str) -> SamlResult<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut entity_id = String::new();
        let mut current = IdpDescriptor::default();
        let mut in_idp = false;
        // (in signing KeyDescriptor, in X509Certificate)
        let mut key_state = (false, false);
        let mut cert_buf = String::new();

        loop {
            match reader.read_event() {
                Ok(Event::DocType(_)) => {
                    return Err(SamlError::Metadata("DOCTYPE is not allowed".to_string()));
                }
                Ok(Event::Start(e)) => {
                    let name = local_name(&e);
                    match name.as_str() {
                        "EntityDescriptor" => {
                            entity_id = attr(&e, "entityID")?.unwrap_or_default();
                        }
                        "IDPSSODescriptor" => {
                            in_idp = true;
                            current = IdpDescriptor {
                                entity_id: entity_id.clone(),
                                want_authn_requests_signed: attr(&e, "WantAuthnRequestsSigned")?
                                    .is_some_and(|v| v == "true" || v == "1"),
                                ..IdpDescriptor::default()
                            };
                        }
                        "KeyDescriptor" if in_idp => {
                            key_state.0 = attr(&e, "use")?.map_or(true, |u| u == "signing");
                        }
                        "X509Certificate" if in_idp && key_state.0 => {
                            key_state.1 = true;
                            cert_buf.clear();
                        }
                        _ if in_idp => current.read_element(&name, &e)?,
                        _ => {}
                    }
                }
                Ok(Event::Empty(e)) if in_idp => {
                    let name = local_name(&e);
                    current.read_element(&name, &e)?;
                }
                Ok(Event::Text(t)) if key_state.1 => {
                    cert_buf.push_str(&t.unescape()?);
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"X509Certificate" if key_state.1 => {
                        key_state.1 = false;
                        let cert: String =
                            cert_buf.chars().filter(|c| !c.is_ascii_whitespace()).collect();
                        if !cert.is_empty() {
                            current.signing_certificates.push(cert);
                        }
                    }
                    b"KeyDescriptor" => key_state = (false, false),
                    b"IDPSSODescriptor" => {
                        if current.entity_id.is_empty() {
                            return Err(SamlError::Metadata(
                                "EntityDescriptor has no entityID".to_string(),
                            ));
                        }
                        return Ok(current);
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(SamlError::Metadata(format!("XML parse error: {e}"))),
                _ => {}
            }
        }

        Err(SamlError::Metadata(
            "no IDPSSODescriptor found in metadata".to_string(),
        ))
    }

    fn read_element(&mut self, name: &str, e: &BytesStart<'_>) -> SamlResult<()> {
        match name {
            "SingleSignOnService" => {
                let binding = attr(e, "Binding")?.as_deref().and_then(SamlBinding::from_uri);
                if let (Some(binding), Some(location)) = (binding, attr(e, "Location")?) {
                    self.sso_services.push((binding, location));
                }
            }
            "Attribute" => {
                self.attributes.extend(attr(e, "Name")?);
                self.attributes.extend(attr(e, "FriendlyName")?);
            }
            _ => {}
        }
        Ok(())
    }

    /// First SSO endpoint for a binding.
    #[must_use]
    pub fn sso_service(&self, binding: SamlBinding) -> Option<&str> {
        self.sso_services
            .iter()
            .find(|(b, _)| *b == binding)
            .map(|(_, location)| location.as_str())
    }

    /// Whether the IdP advertises an attribute under this name.
    #[must_use]
    pub fn advertises_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attr(e: &BytesStart<'_>, key: &str) -> SamlResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == key.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Renders SP metadata for the given client settings.
#[must_use]
pub fn render_sp_metadata(settings: &ClientSettings) -> String {
    let policy = &settings.policy;
    let name_id_formats: String = NameIdFormat::SUPPORTED
        .iter()
        .map(|f| format!("\n        <md:NameIDFormat>{}</md:NameIDFormat>", f.uri()))
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<md:EntityDescriptor xmlns:md="{MD_NS}" entityID="{}">
    <md:SPSSODescriptor AuthnRequestsSigned="{}" WantAssertionsSigned="{}" protocolSupportEnumeration="{SAMLP_NS}">{name_id_formats}
        <md:AssertionConsumerService Binding="{}" Location="{}" index="0" isDefault="true"/>
    </md:SPSSODescriptor>
</md:EntityDescriptor>"#,
        escape(settings.entity_id.as_str()),
        policy.authn_requests_signed,
        policy.want_assertions_signed,
        SamlBinding::HttpPost.uri(),
        escape(settings.acs_url.as_str()),
    )
}
