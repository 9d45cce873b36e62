//! Shared fixtures for the endpoint tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use samlsp_axum::{SamlSp, SamlSpBuilder, SessionManager};
use samlsp_core::SamlSettings;
use samlsp_protocol::{
    Attributes, AuthnResponse, ClientFactory, ClientSettings, Conditions, IdpMetadata, NameId,
    PreparedRequest, ProtocolClient, SamlBinding, SamlError, SamlResult, Status,
};
use samlsp_session::{MemorySessionStore, SessionData, SessionStore};
use tower::ServiceExt;

pub const HOST: &str = "localhost";

/// What the mock client answers to `parse_response`.
#[derive(Debug, Clone)]
pub enum Outcome {
    Success {
        subject: String,
        attributes: Attributes,
    },
    NoIdentity,
    Rejected,
}

impl Outcome {
    pub fn jdoe() -> Self {
        let mut attributes = Attributes::new();
        attributes.insert("mail".to_string(), vec!["jdoe@example.com".to_string()]);
        attributes.insert(
            "memberOf".to_string(),
            vec!["admins".to_string(), "staff".to_string()],
        );
        Self::Success {
            subject: "jdoe".to_string(),
            attributes,
        }
    }
}

/// Client factory returning canned results and recording the settings it
/// was asked to build clients for.
pub struct MockFactory {
    outcome: Outcome,
    built: Mutex<Vec<ClientSettings>>,
}

impl MockFactory {
    pub fn new(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            built: Mutex::new(Vec::new()),
        })
    }

    pub fn built(&self) -> Vec<ClientSettings> {
        self.built.lock().unwrap().clone()
    }
}

impl ClientFactory for MockFactory {
    fn build_client(
        &self,
        settings: &ClientSettings,
        _metadata: &IdpMetadata,
    ) -> SamlResult<Box<dyn ProtocolClient>> {
        self.built.lock().unwrap().push(settings.clone());
        Ok(Box::new(MockClient {
            settings: settings.clone(),
            outcome: self.outcome.clone(),
        }))
    }
}

struct MockClient {
    settings: ClientSettings,
    outcome: Outcome,
}

impl ProtocolClient for MockClient {
    fn prepare_authentication_request(&self, relay_state: &str) -> SamlResult<PreparedRequest> {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("SAMLRequest", "fZBNT8MwDIb")
            .append_pair("RelayState", relay_state)
            .finish();
        Ok(PreparedRequest {
            request_id: "id-mock".to_string(),
            headers: vec![
                (
                    "Location".to_string(),
                    format!("https://idp.example.com/sso?{query}"),
                ),
                ("X-Saml-Request".to_string(), "id-mock".to_string()),
            ],
        })
    }

    fn parse_response(
        &self,
        _encoded: &str,
        binding: SamlBinding,
    ) -> SamlResult<Option<AuthnResponse>> {
        assert_eq!(binding, SamlBinding::HttpPost);
        match &self.outcome {
            Outcome::Success {
                subject,
                attributes,
            } => Ok(Some(AuthnResponse {
                id: "_response".to_string(),
                issuer: "https://idp.example.com/metadata".to_string(),
                in_response_to: None,
                destination: Some(self.settings.acs_url.clone()),
                status: Status::success(),
                name_id: NameId::new(subject.clone()),
                session_index: Some("_session".to_string()),
                conditions: Conditions::default(),
                attributes: attributes.clone(),
                response_signed: false,
                assertion_signed: true,
            })),
            Outcome::NoIdentity => Ok(None),
            Outcome::Rejected => Err(SamlError::SignatureInvalid(
                "assertion is not signed".to_string(),
            )),
        }
    }

    fn render_metadata(&self) -> SamlResult<String> {
        Ok(format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<md:EntityDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata" entityID="{}">
  <md:SPSSODescriptor protocolSupportEnumeration="urn:oasis:names:tc:SAML:2.0:protocol">
    <md:AssertionConsumerService Binding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST" Location="{}" index="1"/>
  </md:SPSSODescriptor>
</md:EntityDescriptor>"#,
            self.settings.entity_id, self.settings.acs_url
        ))
    }
}

pub fn settings() -> SamlSettings {
    SamlSettings::new("http://idp.example.com/metadata").with_prefix("/saml")
}

pub fn builder(settings: SamlSettings, factory: Arc<MockFactory>) -> SamlSpBuilder {
    SamlSp::builder(settings).client_factory(factory)
}

/// Application under test: SAML routes behind the session middleware.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemorySessionStore>,
}

impl TestApp {
    pub fn new(builder: SamlSpBuilder) -> Self {
        let sp = builder
            .init_with_metadata(IdpMetadata::new(String::new()))
            .unwrap();
        let store = Arc::new(MemorySessionStore::new());
        let router = SessionManager::new(store.clone()).wrap(sp.router());
        Self { router, store }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn session(&self, cookie: &str) -> Option<SessionData> {
        let id = cookie.split_once('=').unwrap().1;
        self.store.load(id).await.unwrap()
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, HOST)
        .body(Body::empty())
        .unwrap()
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, HOST)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn post_form(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    post_form_with_cookie(uri, fields, None)
}

pub fn post_form_with_cookie(
    uri: &str,
    fields: &[(&str, &str)],
    cookie: Option<&str>,
) -> Request<Body> {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish();
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::HOST, HOST)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

pub fn location(response: &Response<Body>) -> String {
    response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string()
}

/// `name=value` part of the first `Set-Cookie` header.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().split(';').next().unwrap().to_string())
}

pub fn set_cookie_header(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string())
}

pub fn query_param(url: &str, name: &str) -> Option<String> {
    let parsed = url::Url::parse(url).unwrap();
    parsed
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
