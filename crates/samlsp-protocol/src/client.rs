//! Protocol client seams and the built-in client.
//!
//! The web layer never touches XML. It asks a [`ClientFactory`] for a fresh
//! [`ProtocolClient`] per operation and calls one of three methods on it:
//! prepare an AuthnRequest, parse a response, render SP metadata.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::bindings::{HttpPostBinding, HttpRedirectBinding};
use crate::error::{SamlError, SamlResult};
use crate::metadata::{render_sp_metadata, IdpDescriptor, IdpMetadata};
use crate::parser::{self, ParsedAssertion, ParsedResponse};
use crate::signature::{SignatureScope, SignatureVerifier};
use crate::types::{Attributes, AuthnRequest, AuthnResponse, SamlBinding};

/// Upper bound applied to the configured clock skew (one day).
const MAX_CLOCK_SKEW_SECS: u64 = 86_400;

/// Signing and validation policy of the service provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolPolicy {
    /// Accept responses that do not answer a tracked request.
    pub allow_unsolicited: bool,
    /// Sign outgoing AuthnRequests.
    pub authn_requests_signed: bool,
    /// Sign outgoing LogoutRequests (advertised only).
    pub logout_requests_signed: bool,
    /// Require a signed assertion.
    pub want_assertions_signed: bool,
    /// Require a signed response envelope.
    pub want_response_signed: bool,
    /// Keep attributes the IdP metadata does not advertise.
    pub allow_unknown_attributes: bool,
    /// Tolerance for `NotBefore` / `NotOnOrAfter`, in seconds.
    pub clock_skew_secs: u64,
}

impl Default for ProtocolPolicy {
    fn default() -> Self {
        Self {
            allow_unsolicited: true,
            authn_requests_signed: false,
            logout_requests_signed: true,
            want_assertions_signed: true,
            want_response_signed: false,
            allow_unknown_attributes: true,
            clock_skew_secs: 180,
        }
    }
}

/// Per-request client settings.
///
/// `entity_id` and `acs_url` depend on the externally visible scheme and
/// host, so they are recomputed for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// SP entity ID (the metadata endpoint URL).
    pub entity_id: String,
    /// Assertion consumer service URL.
    pub acs_url: String,
    /// Signing and validation policy.
    pub policy: ProtocolPolicy,
}

/// An AuthnRequest ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    /// ID of the issued request.
    pub request_id: String,
    /// Response headers to emit, including `Location`.
    pub headers: Vec<(String, String)>,
}

impl PreparedRequest {
    /// Removes and returns the `Location` header.
    pub fn take_location(&mut self) -> Option<String> {
        let index = self
            .headers
            .iter()
            .position(|(name, _)| name.eq_ignore_ascii_case("location"))?;
        Some(self.headers.remove(index).1)
    }
}

/// A protocol client bound to one SP configuration and one IdP.
pub trait ProtocolClient: Send + Sync {
    /// Builds an AuthnRequest carrying `relay_state`.
    fn prepare_authentication_request(&self, relay_state: &str) -> SamlResult<PreparedRequest>;

    /// Decodes and validates a response.
    ///
    /// `Ok(None)` means the response was well formed but carried no identity.
    fn parse_response(
        &self,
        encoded: &str,
        binding: SamlBinding,
    ) -> SamlResult<Option<AuthnResponse>>;

    /// Renders SP metadata.
    fn render_metadata(&self) -> SamlResult<String>;
}

/// Builds protocol clients.
pub trait ClientFactory: Send + Sync {
    /// Builds a client for these settings and this IdP.
    ///
    /// Fails with a configuration-kind [`SamlError`] when the metadata
    /// cannot be read or the settings are unsupported.
    fn build_client(
        &self,
        settings: &ClientSettings,
        metadata: &IdpMetadata,
    ) -> SamlResult<Box<dyn ProtocolClient>>;

    /// Rejects a policy no client from this factory can satisfy.
    ///
    /// Called once at startup, before any request is served.
    fn check_policy(&self, _policy: &ProtocolPolicy) -> SamlResult<()> {
        Ok(())
    }
}

/// Factory for [`BasicClient`].
#[derive(Clone, Default)]
pub struct BasicClientFactory {
    verifier: Option<Arc<dyn SignatureVerifier>>,
}

impl BasicClientFactory {
    /// Creates a factory without a signature verifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the verifier used for XML signatures.
    #[must_use]
    pub fn with_verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }
}

impl std::fmt::Debug for BasicClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicClientFactory")
            .field("verifier", &self.verifier.is_some())
            .finish()
    }
}

impl ClientFactory for BasicClientFactory {
    fn build_client(
        &self,
        settings: &ClientSettings,
        metadata: &IdpMetadata,
    ) -> SamlResult<Box<dyn ProtocolClient>> {
        let client = BasicClient::new(settings.clone(), metadata, self.verifier.clone())?;
        Ok(Box::new(client))
    }

    fn check_policy(&self, policy: &ProtocolPolicy) -> SamlResult<()> {
        BasicClient::check_policy(policy, self.verifier.is_some())
    }
}

/// The built-in protocol client.
///
/// Sends unsigned AuthnRequests over HTTP-Redirect and accepts
/// HTTP-POST responses.
pub struct BasicClient {
    settings: ClientSettings,
    idp: IdpDescriptor,
    verifier: Option<Arc<dyn SignatureVerifier>>,
    outstanding: HashSet<String>,
}

impl BasicClient {
    /// Creates a client.
    pub fn new(
        settings: ClientSettings,
        metadata: &IdpMetadata,
        verifier: Option<Arc<dyn SignatureVerifier>>,
    ) -> SamlResult<Self> {
        Self::check_policy(&settings.policy, verifier.is_some())?;
        let idp = metadata.descriptor()?;
        Ok(Self {
            settings,
            idp,
            verifier,
            outstanding: HashSet::new(),
        })
    }

    /// Policy flags this client cannot honor.
    ///
    /// Required signatures can only be checked with a verifier; without one
    /// every response would be rejected.
    pub fn check_policy(policy: &ProtocolPolicy, has_verifier: bool) -> SamlResult<()> {
        if policy.authn_requests_signed {
            return Err(SamlError::Configuration(
                "signed AuthnRequests require a custom client factory".to_string(),
            ));
        }
        if !has_verifier && (policy.want_assertions_signed || policy.want_response_signed) {
            return Err(SamlError::Configuration(
                "signed assertions or responses are required but no signature verifier is configured"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Request IDs this client accepts as `InResponseTo`.
    #[must_use]
    pub fn with_outstanding_requests<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outstanding.extend(ids.into_iter().map(Into::into));
        self
    }

    /// The IdP this client talks to.
    #[must_use]
    pub fn idp(&self) -> &IdpDescriptor {
        &self.idp
    }

    /// Validates a response against an explicit clock.
    pub fn parse_response_at(
        &self,
        encoded: &str,
        binding: SamlBinding,
        now: DateTime<Utc>,
    ) -> SamlResult<Option<AuthnResponse>> {
        if binding != SamlBinding::HttpPost {
            return Err(SamlError::UnsupportedBinding(binding.uri().to_string()));
        }

        let message = HttpPostBinding::decode_response(encoded, None)?;
        let parsed = parser::parse_response(&message.xml)?;
        self.validate(&message.xml, parsed, now)
    }

    fn validate(
        &self,
        document: &str,
        mut parsed: ParsedResponse,
        now: DateTime<Utc>,
    ) -> SamlResult<Option<AuthnResponse>> {
        let policy = &self.settings.policy;

        let status = parsed
            .status
            .take()
            .ok_or_else(|| SamlError::MissingElement("samlp:Status".to_string()))?;
        if !status.is_success() {
            return Err(SamlError::AuthenticationFailed(status.describe()));
        }

        if let Some(issuer) = &parsed.issuer {
            self.check_issuer(issuer)?;
        }

        if let Some(destination) = &parsed.destination {
            if destination != &self.settings.acs_url {
                return Err(SamlError::InvalidDestination {
                    expected: self.settings.acs_url.clone(),
                    actual: destination.clone(),
                });
            }
        }

        if !policy.allow_unsolicited {
            let solicited = parsed
                .in_response_to
                .as_ref()
                .is_some_and(|id| self.outstanding.contains(id));
            if !solicited {
                return Err(SamlError::UnsolicitedResponse);
            }
        }

        if parsed.assertions.len() > 1 {
            return Err(SamlError::InvalidResponse(format!(
                "expected one assertion, found {}",
                parsed.assertions.len()
            )));
        }
        let Some(assertion) = parsed.assertions.pop() else {
            if parsed.encrypted_assertions > 0 {
                return Err(SamlError::InvalidResponse(
                    "encrypted assertions are not supported".to_string(),
                ));
            }
            debug!(response_id = %parsed.id, "Response carried no assertion");
            return Ok(None);
        };

        let response_signed = self.check_signature(
            document,
            SignatureScope::Response,
            &parsed.id,
            parsed.signed,
            policy.want_response_signed,
        )?;
        let assertion_signed = self.check_signature(
            document,
            SignatureScope::Assertion,
            &assertion.id,
            assertion.signed,
            policy.want_assertions_signed,
        )?;

        if let Some(issuer) = &assertion.issuer {
            self.check_issuer(issuer)?;
        }

        self.check_conditions(&assertion, now)?;

        let name_id = assertion
            .name_id
            .clone()
            .filter(|n| !n.value.is_empty())
            .ok_or_else(|| SamlError::MissingElement("saml:NameID".to_string()))?;

        let attributes = self.collect_attributes(&assertion);

        Ok(Some(AuthnResponse {
            id: parsed.id,
            issuer: parsed
                .issuer
                .or(assertion.issuer)
                .unwrap_or_else(|| self.idp.entity_id.clone()),
            in_response_to: parsed.in_response_to,
            destination: parsed.destination,
            status,
            name_id,
            session_index: assertion.session_index,
            conditions: assertion.conditions,
            attributes,
            response_signed,
            assertion_signed,
        }))
    }

    fn check_issuer(&self, issuer: &str) -> SamlResult<()> {
        if issuer != self.idp.entity_id {
            return Err(SamlError::InvalidIssuer {
                expected: self.idp.entity_id.clone(),
                actual: issuer.to_string(),
            });
        }
        Ok(())
    }

    /// Returns whether a verified signature covers the element.
    fn check_signature(
        &self,
        document: &str,
        scope: SignatureScope,
        element_id: &str,
        present: bool,
        required: bool,
    ) -> SamlResult<bool> {
        if !present {
            if required {
                return Err(SamlError::SignatureInvalid(format!(
                    "{} is not signed",
                    scope.element()
                )));
            }
            return Ok(false);
        }

        match &self.verifier {
            Some(verifier) => {
                verifier.verify(document, scope, element_id, &self.idp.signing_certificates)?;
                Ok(true)
            }
            None if required => Err(SamlError::SignatureInvalid(
                "no signature verifier configured".to_string(),
            )),
            None => {
                warn!(element = scope.element(), "Ignoring unverified signature");
                Ok(false)
            }
        }
    }

    fn check_conditions(&self, assertion: &ParsedAssertion, now: DateTime<Utc>) -> SamlResult<()> {
        let skew_secs = self.settings.policy.clock_skew_secs.min(MAX_CLOCK_SKEW_SECS);
        let skew = Duration::seconds(i64::try_from(skew_secs).unwrap_or_default());
        let conditions = &assertion.conditions;

        if let Some(not_before) = conditions.not_before {
            if now + skew < not_before {
                return Err(SamlError::AssertionNotYetValid);
            }
        }
        if let Some(not_on_or_after) = conditions.not_on_or_after {
            if now - skew >= not_on_or_after {
                return Err(SamlError::AssertionExpired);
            }
        }

        if !conditions.audiences.is_empty()
            && !conditions.audiences.iter().any(|a| a == &self.settings.entity_id)
        {
            return Err(SamlError::InvalidAudience {
                expected: self.settings.entity_id.clone(),
                actual: conditions.audiences.join(", "),
            });
        }
        Ok(())
    }

    fn collect_attributes(&self, assertion: &ParsedAssertion) -> Attributes {
        let mut attributes = Attributes::new();
        for raw in &assertion.attributes {
            let known = self.idp.advertises_attribute(&raw.name)
                || raw
                    .friendly_name
                    .as_deref()
                    .is_some_and(|f| self.idp.advertises_attribute(f));
            if !known && !self.settings.policy.allow_unknown_attributes {
                debug!(attribute = %raw.name, "Dropping attribute not advertised by IdP");
                continue;
            }
            let key = raw.friendly_name.clone().unwrap_or_else(|| raw.name.clone());
            attributes
                .entry(key)
                .or_default()
                .extend(raw.values.iter().cloned());
        }
        attributes
    }
}

impl ProtocolClient for BasicClient {
    fn prepare_authentication_request(&self, relay_state: &str) -> SamlResult<PreparedRequest> {
        let destination = self.idp.sso_service(SamlBinding::HttpRedirect).ok_or_else(|| {
            SamlError::Configuration("IdP has no HTTP-Redirect SingleSignOnService".to_string())
        })?;

        let request = AuthnRequest::new(&self.settings.entity_id)
            .with_acs_url(&self.settings.acs_url)
            .with_destination(destination)
            .with_binding(SamlBinding::HttpPost);

        let location =
            HttpRedirectBinding::encode_request(&request.to_xml(), destination, Some(relay_state))?;

        debug!(request_id = %request.id, destination, "Prepared AuthnRequest");

        Ok(PreparedRequest {
            request_id: request.id,
            headers: vec![("Location".to_string(), location)],
        })
    }

    fn parse_response(
        &self,
        encoded: &str,
        binding: SamlBinding,
    ) -> SamlResult<Option<AuthnResponse>> {
        self.parse_response_at(encoded, binding, Utc::now())
    }

    fn render_metadata(&self) -> SamlResult<String> {
        Ok(render_sp_metadata(&self.settings))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const IDP_ENTITY: &str = "https://idp.example.com/metadata";
    const SP_ENTITY: &str = "http://localhost/saml/metadata/";
    const ACS: &str = "http://localhost/saml/acs/";

    fn idp_metadata() -> IdpMetadata {
        IdpMetadata::new(format!(
            r#"<md:EntityDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata" entityID="{IDP_ENTITY}">
  <md:IDPSSODescriptor protocolSupportEnumeration="urn:oasis:names:tc:SAML:2.0:protocol">
    <md:KeyDescriptor use="signing"><ds:KeyInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:X509Data><ds:X509Certificate>CERT</ds:X509Certificate></ds:X509Data></ds:KeyInfo></md:KeyDescriptor>
    <md:SingleSignOnService Binding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect" Location="https://idp.example.com/sso"/>
    <saml:Attribute xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" Name="urn:oid:0.9.2342.19200300.100.1.3" FriendlyName="mail"/>
  </md:IDPSSODescriptor>
</md:EntityDescriptor>"#
        ))
    }

    fn settings(policy: ProtocolPolicy) -> ClientSettings {
        ClientSettings {
            entity_id: SP_ENTITY.to_string(),
            acs_url: ACS.to_string(),
            policy,
        }
    }

    fn relaxed() -> ProtocolPolicy {
        ProtocolPolicy {
            want_assertions_signed: false,
            ..ProtocolPolicy::default()
        }
    }

    fn response_xml(assertion_extra: &str, conditions: &str) -> String {
        format!(
            r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_r1" Destination="{ACS}" Version="2.0">
  <saml:Issuer>{IDP_ENTITY}</saml:Issuer>
  <samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status>
  <saml:Assertion ID="_a1" Version="2.0">
    <saml:Issuer>{IDP_ENTITY}</saml:Issuer>{assertion_extra}
    <saml:Subject><saml:NameID>alice</saml:NameID></saml:Subject>
    {conditions}
    <saml:AttributeStatement>
      <saml:Attribute Name="urn:oid:0.9.2342.19200300.100.1.3" FriendlyName="mail"><saml:AttributeValue>alice@example.com</saml:AttributeValue></saml:Attribute>
      <saml:Attribute Name="memberOf"><saml:AttributeValue>admins</saml:AttributeValue><saml:AttributeValue>staff</saml:AttributeValue></saml:Attribute>
    </saml:AttributeStatement>
  </saml:Assertion>
</samlp:Response>"#
        )
    }

    fn client(policy: ProtocolPolicy) -> BasicClient {
        BasicClient::new(settings(policy), &idp_metadata(), None).unwrap()
    }

    fn verified(policy: ProtocolPolicy) -> (BasicClient, Arc<CountingVerifier>) {
        let verifier = Arc::new(CountingVerifier::default());
        let client =
            BasicClient::new(settings(policy), &idp_metadata(), Some(verifier.clone())).unwrap();
        (client, verifier)
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn parse(client: &BasicClient, xml: &str) -> SamlResult<Option<AuthnResponse>> {
        client.parse_response_at(&HttpPostBinding::encode(xml), SamlBinding::HttpPost, now())
    }

    /// Accepts everything and counts calls.
    #[derive(Default)]
    struct CountingVerifier {
        calls: AtomicUsize,
    }

    impl SignatureVerifier for CountingVerifier {
        fn verify(
            &self,
            _document: &str,
            _scope: SignatureScope,
            _element_id: &str,
            certificates: &[String],
        ) -> SamlResult<()> {
            assert_eq!(certificates, ["CERT".to_string()]);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn prepare_request_targets_redirect_endpoint() {
        let client = client(relaxed());
        let mut prepared = client
            .prepare_authentication_request("http://localhost/next")
            .unwrap();

        let location = prepared.take_location().unwrap();
        assert!(prepared.headers.is_empty());
        assert!(location.starts_with("https://idp.example.com/sso?SAMLRequest="));

        let decoded = HttpRedirectBinding::decode_url(&location).unwrap();
        assert_eq!(decoded.relay_state.as_deref(), Some("http://localhost/next"));
        assert!(decoded.xml.contains(&format!(r#"ID="{}""#, prepared.request_id)));
        assert!(decoded.xml.contains(r#"AssertionConsumerServiceURL="http://localhost/saml/acs/""#));
        assert!(decoded.xml.contains("bindings:HTTP-POST"));
    }

    #[test]
    fn signed_authn_requests_are_refused() {
        let policy = ProtocolPolicy {
            authn_requests_signed: true,
            ..ProtocolPolicy::default()
        };
        let result = BasicClientFactory::new().build_client(&settings(policy), &idp_metadata());
        assert!(matches!(result, Err(SamlError::Configuration(_))));
    }

    #[test]
    fn broken_metadata_is_a_configuration_error() {
        let result = BasicClientFactory::new().build_client(
            &settings(relaxed()),
            &IdpMetadata::new("<nothing/>"),
        );
        let err = result.err().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn parse_valid_response() {
        let response = parse(&client(relaxed()), &response_xml("", ""))
            .unwrap()
            .unwrap();

        assert_eq!(response.subject(), "alice");
        assert_eq!(response.issuer, IDP_ENTITY);
        assert_eq!(response.attribute("mail"), Some(&["alice@example.com".to_string()][..]));
        assert_eq!(response.attribute("memberOf").map(<[String]>::len), Some(2));
        assert!(!response.assertion_signed);
    }

    #[test]
    fn unknown_attributes_can_be_dropped() {
        let policy = ProtocolPolicy {
            allow_unknown_attributes: false,
            ..relaxed()
        };
        let response = parse(&client(policy), &response_xml("", "")).unwrap().unwrap();

        assert!(response.attribute("mail").is_some());
        assert!(response.attribute("memberOf").is_none());
    }

    #[test]
    fn redirect_binding_is_unsupported_for_responses() {
        let result = client(relaxed()).parse_response("abc", SamlBinding::HttpRedirect);
        assert!(matches!(result, Err(SamlError::UnsupportedBinding(_))));
    }

    #[test]
    fn unsigned_assertion_is_rejected_by_default() {
        let (client, verifier) = verified(ProtocolPolicy::default());
        let result = parse(&client, &response_xml("", ""));
        assert!(matches!(result, Err(SamlError::SignatureInvalid(_))));
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn required_signatures_need_a_verifier() {
        for policy in [
            ProtocolPolicy::default(),
            ProtocolPolicy {
                want_response_signed: true,
                ..relaxed()
            },
        ] {
            let built =
                BasicClientFactory::new().build_client(&settings(policy.clone()), &idp_metadata());
            assert!(matches!(built, Err(SamlError::Configuration(_))));
            assert!(BasicClientFactory::new().check_policy(&policy).is_err());
        }

        let factory =
            BasicClientFactory::new().with_verifier(Arc::new(CountingVerifier::default()));
        assert!(factory.check_policy(&ProtocolPolicy::default()).is_ok());
        assert!(BasicClientFactory::new().check_policy(&relaxed()).is_ok());
    }

    #[test]
    fn signed_assertion_goes_through_verifier() {
        let (client, verifier) = verified(ProtocolPolicy::default());

        let signature = r#"<ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#"/>"#;
        let response = parse(&client, &response_xml(signature, "")).unwrap().unwrap();

        assert!(response.assertion_signed);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn time_conditions_honor_clock_skew() {
        let client = client(relaxed());

        let within_skew = r#"<saml:Conditions NotBefore="2024-06-01T12:02:00Z" NotOnOrAfter="2024-06-01T12:10:00Z"/>"#;
        assert!(parse(&client, &response_xml("", within_skew)).is_ok());

        let future = r#"<saml:Conditions NotBefore="2024-06-01T12:10:00Z"/>"#;
        assert!(matches!(
            parse(&client, &response_xml("", future)),
            Err(SamlError::AssertionNotYetValid)
        ));

        let expired = r#"<saml:Conditions NotOnOrAfter="2024-06-01T11:50:00Z"/>"#;
        assert!(matches!(
            parse(&client, &response_xml("", expired)),
            Err(SamlError::AssertionExpired)
        ));
    }

    #[test]
    fn audience_must_match_entity_id() {
        let conditions = r#"<saml:Conditions><saml:AudienceRestriction><saml:Audience>https://other.example/</saml:Audience></saml:AudienceRestriction></saml:Conditions>"#;
        let result = parse(&client(relaxed()), &response_xml("", conditions));
        assert!(matches!(result, Err(SamlError::InvalidAudience { .. })));
    }

    #[test]
    fn issuer_and_destination_are_checked() {
        let client = client(relaxed());

        let wrong_issuer = response_xml("", "").replacen(IDP_ENTITY, "https://evil.example/", 1);
        assert!(matches!(
            parse(&client, &wrong_issuer),
            Err(SamlError::InvalidIssuer { .. })
        ));

        let wrong_destination = response_xml("", "").replace(ACS, "https://evil.example/acs/");
        assert!(matches!(
            parse(&client, &wrong_destination),
            Err(SamlError::InvalidDestination { .. })
        ));
    }

    #[test]
    fn unsolicited_responses_follow_policy() {
        let policy = ProtocolPolicy {
            allow_unsolicited: false,
            ..relaxed()
        };
        let strict = client(policy.clone());
        assert!(matches!(
            parse(&strict, &response_xml("", "")),
            Err(SamlError::UnsolicitedResponse)
        ));

        let tracking = client(policy).with_outstanding_requests(["id-42"]);
        let solicited = response_xml("", "").replacen(r#"ID="_r1""#, r#"ID="_r1" InResponseTo="id-42""#, 1);
        assert!(parse(&tracking, &solicited).unwrap().is_some());
    }

    #[test]
    fn failed_status_is_an_authentication_error() {
        let xml = r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="r">
  <samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Responder"/></samlp:Status>
</samlp:Response>"#;
        assert!(matches!(
            parse(&client(relaxed()), xml),
            Err(SamlError::AuthenticationFailed(_))
        ));
    }

    #[test]
    fn success_without_assertion_is_empty() {
        let xml = r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="r">
  <samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status>
</samlp:Response>"#;
        assert!(parse(&client(relaxed()), xml).unwrap().is_none());
    }

    #[test]
    fn metadata_reflects_settings() {
        let (client, _) = verified(ProtocolPolicy::default());
        let xml = client.render_metadata().unwrap();
        assert!(xml.contains(r#"entityID="http://localhost/saml/metadata/""#));
        assert!(xml.contains(r#"Location="http://localhost/saml/acs/""#));
    }
}
