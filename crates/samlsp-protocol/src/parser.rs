//! Extraction of a `samlp:Response` document into plain data.
//!
//! This pass only reads; every trust decision is made by the client that
//! consumes [`ParsedResponse`].

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{SamlError, SamlResult};
use crate::types::{Conditions, NameId, Status};

/// One `saml:Attribute` as it appeared in the assertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RawAttribute {
    pub name: String,
    pub friendly_name: Option<String>,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ParsedAssertion {
    pub id: String,
    pub issuer: Option<String>,
    pub name_id: Option<NameId>,
    pub session_index: Option<String>,
    pub conditions: Conditions,
    pub attributes: Vec<RawAttribute>,
    pub signed: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct ParsedResponse {
    pub id: String,
    pub issuer: Option<String>,
    pub in_response_to: Option<String>,
    pub destination: Option<String>,
    pub status: Option<Status>,
    pub signed: bool,
    pub encrypted_assertions: usize,
    pub assertions: Vec<ParsedAssertion>,
}

/// Reads a decoded response document.
pub(crate) fn parse_response(xml: &str) -> SamlResult<ParsedResponse> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut response: Option<ParsedResponse> = None;
    let mut text = String::new();
    let mut root_closed = false;

    loop {
        let event = reader.read_event()?;
        if root_closed {
            trailing_content(&event)?;
        }
        match event {
            Event::DocType(_) => {
                return Err(SamlError::InvalidResponse(
                    "DOCTYPE is not allowed in SAML messages".to_string(),
                ));
            }
            Event::Start(e) => {
                let name = local_name(&e);
                open(&mut response, &path, &name, &e)?;
                path.push(name);
                text.clear();
            }
            Event::Empty(e) => {
                let name = local_name(&e);
                open(&mut response, &path, &name, &e)?;
                path.push(name);
                close(&mut response, &path, "")?;
                path.pop();
                root_closed = path.is_empty();
            }
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c.into_inner())),
            Event::End(_) => {
                close(&mut response, &path, text.trim())?;
                text.clear();
                path.pop();
                root_closed = path.is_empty();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    response.ok_or_else(|| SamlError::MissingElement("samlp:Response".to_string()))
}

/// Only comments, processing instructions and whitespace may follow the
/// root element.
fn trailing_content(event: &Event<'_>) -> SamlResult<()> {
    let stray = match event {
        Event::Start(_) | Event::Empty(_) | Event::CData(_) => true,
        Event::Text(t) => !t.iter().all(u8::is_ascii_whitespace),
        _ => false,
    };
    if stray {
        return Err(SamlError::InvalidResponse(
            "content after the root element".to_string(),
        ));
    }
    Ok(())
}

fn open(
    response: &mut Option<ParsedResponse>,
    path: &[String],
    name: &str,
    e: &BytesStart<'_>,
) -> SamlResult<()> {
    let parent = path.last().map(String::as_str);

    if path.is_empty() {
        if name != "Response" {
            return Err(SamlError::InvalidResponse(format!(
                "unexpected root element {name}"
            )));
        }
        *response = Some(ParsedResponse {
            id: attr(e, "ID")?.unwrap_or_default(),
            issuer: None,
            in_response_to: attr(e, "InResponseTo")?,
            destination: attr(e, "Destination")?,
            status: None,
            signed: false,
            encrypted_assertions: 0,
            assertions: Vec::new(),
        });
        return Ok(());
    }

    let Some(response) = response.as_mut() else {
        return Ok(());
    };

    match (parent, name) {
        (Some("Response"), "Signature") => response.signed = true,
        (Some("Response"), "EncryptedAssertion") => response.encrypted_assertions += 1,
        (Some("Response"), "Assertion") => response.assertions.push(ParsedAssertion {
            id: attr(e, "ID")?.unwrap_or_default(),
            ..ParsedAssertion::default()
        }),
        (Some("Status"), "StatusCode") => {
            response.status = Some(Status {
                code: attr(e, "Value")?.unwrap_or_default(),
                sub_code: None,
                message: None,
            });
        }
        (Some("StatusCode"), "StatusCode") => {
            if let Some(status) = response.status.as_mut() {
                status.sub_code = status.sub_code.take().or(attr(e, "Value")?);
            }
        }
        _ => {
            let Some(assertion) = response.assertions.last_mut() else {
                return Ok(());
            };
            match (parent, name) {
                (Some("Assertion"), "Signature") => assertion.signed = true,
                (Some("Subject"), "NameID") => {
                    assertion.name_id = Some(NameId {
                        value: String::new(),
                        format: attr(e, "Format")?,
                    });
                }
                (Some("Assertion"), "Conditions") => {
                    assertion.conditions.not_before = time_attr(e, "NotBefore")?;
                    assertion.conditions.not_on_or_after = time_attr(e, "NotOnOrAfter")?;
                }
                (Some("Assertion"), "AuthnStatement") => {
                    assertion.session_index = attr(e, "SessionIndex")?;
                }
                (Some("AttributeStatement"), "Attribute") => {
                    assertion.attributes.push(RawAttribute {
                        name: attr(e, "Name")?.unwrap_or_default(),
                        friendly_name: attr(e, "FriendlyName")?,
                        values: Vec::new(),
                    });
                }
                _ => {}
            }
        }
    }
    Ok(())
}

fn close(response: &mut Option<ParsedResponse>, path: &[String], text: &str) -> SamlResult<()> {
    let Some(response) = response.as_mut() else {
        return Ok(());
    };
    let name = path.last().map(String::as_str);
    let parent = path.len().checked_sub(2).map(|i| path[i].as_str());

    match (parent, name) {
        (Some("Response"), Some("Issuer")) => response.issuer = Some(text.to_string()),
        (Some("Status"), Some("StatusMessage")) => {
            if let Some(status) = response.status.as_mut() {
                status.message = Some(text.to_string());
            }
        }
        _ => {
            let Some(assertion) = response.assertions.last_mut() else {
                return Ok(());
            };
            match (parent, name) {
                (Some("Assertion"), Some("Issuer")) => assertion.issuer = Some(text.to_string()),
                (Some("Subject"), Some("NameID")) => {
                    if let Some(name_id) = assertion.name_id.as_mut() {
                        name_id.value = text.to_string();
                    }
                }
                (Some("AudienceRestriction"), Some("Audience")) => {
                    assertion.conditions.audiences.push(text.to_string());
                }
                (Some("Attribute"), Some("AttributeValue")) => {
                    if let Some(attribute) = assertion.attributes.last_mut() {
                        attribute.values.push(text.to_string());
                    }
                }
                _ => {}
            }
        }
    }
    Ok(())
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

fn time_attr(e: &BytesStart<'_>, key: &str) -> SamlResult<Option<DateTime<Utc>>> {
    attr(e, key)?
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|err| SamlError::InvalidResponse(format!("invalid {key} '{raw}': {err}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
    ID="_resp1" InResponseTo="id-123" Destination="http://localhost/saml/acs/" Version="2.0" IssueInstant="2024-01-01T00:00:00Z">
  <saml:Issuer>https://idp.example.com/metadata</saml:Issuer>
  <samlp:Status>
    <samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/>
  </samlp:Status>
  <saml:Assertion ID="_assert1" Version="2.0" IssueInstant="2024-01-01T00:00:00Z">
    <saml:Issuer>https://idp.example.com/metadata</saml:Issuer>
    <ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:SignatureValue>abc</ds:SignatureValue></ds:Signature>
    <saml:Subject>
      <saml:NameID Format="urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress">alice&amp;co@example.com</saml:NameID>
    </saml:Subject>
    <saml:Conditions NotBefore="2024-01-01T00:00:00Z" NotOnOrAfter="2024-01-01T00:05:00Z">
      <saml:AudienceRestriction><saml:Audience>http://localhost/saml/metadata/</saml:Audience></saml:AudienceRestriction>
    </saml:Conditions>
    <saml:AuthnStatement AuthnInstant="2024-01-01T00:00:00Z" SessionIndex="sess-9"/>
    <saml:AttributeStatement>
      <saml:Attribute Name="memberOf" NameFormat="urn:oasis:names:tc:SAML:2.0:attrname-format:basic">
        <saml:AttributeValue>admins</saml:AttributeValue>
        <saml:AttributeValue><![CDATA[staff]]></saml:AttributeValue>
      </saml:Attribute>
      <saml:Attribute Name="urn:oid:0.9.2342.19200300.100.1.3" FriendlyName="mail">
        <saml:AttributeValue>alice@example.com</saml:AttributeValue>
        <saml:AttributeValue/>
      </saml:Attribute>
    </saml:AttributeStatement>
  </saml:Assertion>
</samlp:Response>"#;

    #[test]
    fn parse_full_response() {
        let parsed = parse_response(RESPONSE).unwrap();

        assert_eq!(parsed.id, "_resp1");
        assert_eq!(parsed.in_response_to.as_deref(), Some("id-123"));
        assert_eq!(parsed.destination.as_deref(), Some("http://localhost/saml/acs/"));
        assert_eq!(parsed.issuer.as_deref(), Some("https://idp.example.com/metadata"));
        assert!(parsed.status.as_ref().unwrap().is_success());
        assert!(!parsed.signed);
        assert_eq!(parsed.assertions.len(), 1);

        let assertion = &parsed.assertions[0];
        assert_eq!(assertion.id, "_assert1");
        assert!(assertion.signed);
        let name_id = assertion.name_id.as_ref().unwrap();
        assert_eq!(name_id.value, "alice&co@example.com");
        assert_eq!(
            name_id.format.as_deref(),
            Some("urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress")
        );
        assert_eq!(assertion.session_index.as_deref(), Some("sess-9"));
        assert_eq!(assertion.conditions.audiences, vec!["http://localhost/saml/metadata/"]);
        assert!(assertion.conditions.not_before.is_some());

        assert_eq!(assertion.attributes.len(), 2);
        assert_eq!(assertion.attributes[0].name, "memberOf");
        assert_eq!(assertion.attributes[0].values, vec!["admins", "staff"]);
        assert_eq!(assertion.attributes[1].friendly_name.as_deref(), Some("mail"));
        assert_eq!(assertion.attributes[1].values, vec!["alice@example.com", ""]);
    }

    #[test]
    fn nested_status_codes() {
        let xml = r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="r">
  <samlp:Status>
    <samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Responder">
      <samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:AuthnFailed"/>
    </samlp:StatusCode>
    <samlp:StatusMessage>locked out</samlp:StatusMessage>
  </samlp:Status>
</samlp:Response>"#;
        let status = parse_response(xml).unwrap().status.unwrap();

        assert!(!status.is_success());
        assert_eq!(
            status.sub_code.as_deref(),
            Some("urn:oasis:names:tc:SAML:2.0:status:AuthnFailed")
        );
        assert_eq!(status.message.as_deref(), Some("locked out"));
    }

    #[test]
    fn rejects_doctype() {
        let xml = r#"<?xml version="1.0"?><!DOCTYPE r [<!ENTITY big "boom">]><samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol"/>"#;
        assert!(matches!(parse_response(xml), Err(SamlError::InvalidResponse(_))));
    }

    #[test]
    fn rejects_other_roots() {
        let xml = r#"<samlp:AuthnRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="x"/>"#;
        assert!(matches!(parse_response(xml), Err(SamlError::InvalidResponse(_))));
        assert!(matches!(parse_response(""), Err(SamlError::MissingElement(_))));
    }

    #[test]
    fn counts_encrypted_assertions() {
        let xml = r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="r">
  <saml:EncryptedAssertion><xenc:EncryptedData xmlns:xenc="http://www.w3.org/2001/04/xmlenc#"/></saml:EncryptedAssertion>
</samlp:Response>"#;
        let parsed = parse_response(xml).unwrap();
        assert_eq!(parsed.encrypted_assertions, 1);
        assert!(parsed.assertions.is_empty());
    }

    #[test]
    fn rejects_a_second_root() {
        let xml = r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_signed">
  <saml:Assertion ID="a1"><saml:Subject><saml:NameID>alice</saml:NameID></saml:Subject></saml:Assertion>
</samlp:Response>
<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_signed">
  <saml:Assertion ID="a1"><saml:Subject><saml:NameID>mallory</saml:NameID></saml:Subject></saml:Assertion>
</samlp:Response>"#;
        assert!(matches!(parse_response(xml), Err(SamlError::InvalidResponse(_))));

        let empty_then_more = r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="r"/><x/>"#;
        assert!(matches!(parse_response(empty_then_more), Err(SamlError::InvalidResponse(_))));
    }

    #[test]
    fn trailing_comment_and_whitespace_are_fine() {
        let xml = "<samlp:Response xmlns:samlp=\"urn:oasis:names:tc:SAML:2.0:protocol\" ID=\"r\"/>\n<!-- idp build 42 -->\n";
        assert_eq!(parse_response(xml).unwrap().id, "r");
    }

    #[test]
    fn trailing_text_is_rejected() {
        let xml = r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="r"/>junk"#;
        assert!(matches!(parse_response(xml), Err(SamlError::InvalidResponse(_))));
    }

    #[test]
    fn nested_conditions_do_not_override_the_assertion() {
        let xml = r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="r">
  <saml:Assertion ID="a">
    <saml:Conditions NotOnOrAfter="2024-01-01T00:05:00Z"/>
    <saml:Advice>
      <saml:Conditions NotOnOrAfter="2099-01-01T00:00:00Z"/>
      <saml:AuthnStatement SessionIndex="forged"/>
    </saml:Advice>
    <saml:AuthnStatement SessionIndex="real"/>
  </saml:Assertion>
</samlp:Response>"#;
        let parsed = parse_response(xml).unwrap();
        let assertion = &parsed.assertions[0];
        assert_eq!(
            assertion.conditions.not_on_or_after.unwrap().to_rfc3339(),
            "2024-01-01T00:05:00+00:00"
        );
        assert_eq!(assertion.session_index.as_deref(), Some("real"));
    }

    #[test]
    fn invalid_timestamp() {
        let xml = r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="r">
  <saml:Assertion ID="a"><saml:Conditions NotBefore="yesterday"/></saml:Assertion>
</samlp:Response>"#;
        assert!(matches!(parse_response(xml), Err(SamlError::InvalidResponse(_))));
    }
}
