//! Assertion Consumer Service endpoint.
//!
//! Receives the IdP's response over HTTP-POST, validates it and publishes
//! the outcome on the event bus. Validation failures never reach the
//! browser as errors: they are published as `AuthError` and the browser is
//! redirected like on success.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Extensions, HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
};
use samlsp_core::{AuthError, Authenticated, Error, EventContext, Result};
use samlsp_protocol::SamlBinding;
use samlsp_session::Session;
use tracing::{debug, info, warn};

use crate::request::RequestContext;
use crate::return_to::normalize_relay_state;
use crate::session_layer::request_session;

use super::response::{error_response, SpRedirect};
use super::state::SamlState;

/// Fields of the ACS form post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcsForm {
    /// `SAMLResponse`, still base64 encoded.
    pub saml_response: Option<String>,
    /// `RelayState`.
    pub relay_state: Option<String>,
}

impl AcsForm {
    /// Parses an `application/x-www-form-urlencoded` body.
    ///
    /// A field that is present but empty is kept as `Some("")`.
    #[must_use]
    pub fn parse(body: &[u8]) -> Self {
        let mut form = Self::default();
        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "SAMLResponse" if form.saml_response.is_none() => {
                    form.saml_response = Some(value.into_owned());
                }
                "RelayState" if form.relay_state.is_none() => {
                    form.relay_state = Some(value.into_owned());
                }
                _ => {}
            }
        }
        form
    }
}

/// Validates a posted response and publishes the outcome.
///
/// Returns [`Error::MissingResponse`] without publishing anything when the
/// form has no `SAMLResponse`. Listener failures are returned as is.
pub async fn handle_acs(
    state: &SamlState,
    request: &RequestContext,
    form: &AcsForm,
    session: Session,
) -> Result<SpRedirect> {
    let client = state.build_client(request.url_root())?;

    let saml_response = form.saml_response.as_deref().ok_or(Error::MissingResponse)?;
    debug!(bytes = saml_response.len(), "Received SAMLResponse");

    let ctx = EventContext::new(session, request.url_root());

    let outcome = client
        .parse_response(saml_response, SamlBinding::HttpPost)
        .map_err(Error::from)
        .and_then(|parsed| parsed.ok_or(Error::UnknownProtocol));

    match outcome {
        Ok(response) => {
            info!(
                subject = %response.subject(),
                issuer = %response.issuer,
                attributes = response.attributes.len(),
                "SAML login succeeded"
            );
            let event = Authenticated {
                subject: response.subject().to_string(),
                attributes: response.attributes.clone(),
                response: Arc::new(response),
            };
            state.events().publish(&ctx, &event).await?;
        }
        Err(error) => {
            warn!(error = %error, "SAML login failed");
            let event = AuthError {
                error: Arc::new(error),
            };
            state.events().publish(&ctx, &event).await?;
        }
    }

    let target = normalize_relay_state(
        form.relay_state.as_deref(),
        request.url_root(),
        &state.settings().default_redirect,
    );
    Ok(SpRedirect::to(target))
}

/// `GET|POST <prefix>/acs/`
pub async fn acs(
    State(state): State<SamlState>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
    extensions: Extensions,
    body: Bytes,
) -> Response {
    let request =
        RequestContext::from_parts(&headers, &uri, state.settings().trust_forwarded_headers);

    let form = if method == Method::POST && is_form_post(&headers) {
        AcsForm::parse(&body)
    } else {
        AcsForm::default()
    };

    match handle_acs(&state, &request, &form, request_session(&extensions)).await {
        Ok(redirect) => redirect.into_response(),
        Err(e) => error_response(&e),
    }
}

fn is_form_post(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| {
            v.trim_start()
                .to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        })
}
