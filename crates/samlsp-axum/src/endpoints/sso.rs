//! Login endpoint.
//!
//! Starts SP-initiated SSO: builds an AuthnRequest carrying the return
//! target as relay state and redirects the browser to the IdP.

use axum::{
    extract::State,
    http::{HeaderMap, Uri},
    response::{IntoResponse, Response},
};
use samlsp_core::{Error, Result};
use tracing::debug;

use crate::request::RequestContext;
use crate::return_to::resolve_return_to;

use super::response::{error_response, SpRedirect};
use super::state::SamlState;

/// Builds the redirect to the IdP.
///
/// The `next` query parameter is honored only when it lies under the
/// request root.
pub fn start_login(state: &SamlState, request: &RequestContext) -> Result<SpRedirect> {
    let client = state.build_client(request.url_root())?;

    let return_to = resolve_return_to(
        request.query_param("next"),
        request.url_root(),
        &state.settings().default_redirect,
    );

    let mut prepared = client
        .prepare_authentication_request(&return_to)
        .map_err(Error::from_client_build)?;

    let location = prepared.take_location().ok_or_else(|| {
        Error::Configuration("authentication request has no Location header".to_string())
    })?;

    debug!(request_id = %prepared.request_id, %return_to, "Redirecting to IdP for login");

    Ok(SpRedirect::to(location)
        .with_headers(prepared.headers)
        .no_cache())
}

/// `GET|POST <prefix>/sso/`
pub async fn sso(State(state): State<SamlState>, headers: HeaderMap, uri: Uri) -> Response {
    let request =
        RequestContext::from_parts(&headers, &uri, state.settings().trust_forwarded_headers);

    match start_login(&state, &request) {
        Ok(redirect) => redirect.into_response(),
        Err(e) => error_response(&e),
    }
}
