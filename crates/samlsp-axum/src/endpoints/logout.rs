//! Local logout endpoint.
//!
//! Publishes `LoggedOut` and redirects to the default target. No message
//! is sent to the IdP.

use axum::{
    extract::State,
    http::{Extensions, HeaderMap, Uri},
    response::{IntoResponse, Response},
};
use samlsp_core::{EventContext, LoggedOut, Result};
use samlsp_session::Session;
use tracing::info;

use crate::request::RequestContext;
use crate::return_to::logout_target;
use crate::session_layer::request_session;

use super::response::{error_response, SpRedirect};
use super::state::SamlState;

/// Publishes the logout and builds the redirect.
pub async fn start_logout(
    state: &SamlState,
    request: &RequestContext,
    session: Session,
) -> Result<SpRedirect> {
    // No protocol work on logout; building still surfaces configuration errors.
    state.build_client(request.url_root())?;

    let ctx = EventContext::new(session, request.url_root());
    state.events().publish(&ctx, &LoggedOut).await?;

    info!("SAML logout");
    Ok(SpRedirect::to(logout_target(
        request.url_root(),
        &state.settings().default_redirect,
    )))
}

/// `GET|POST <prefix>/logout/`
pub async fn logout(
    State(state): State<SamlState>,
    headers: HeaderMap,
    uri: Uri,
    extensions: Extensions,
) -> Response {
    let request =
        RequestContext::from_parts(&headers, &uri, state.settings().trust_forwarded_headers);

    match start_logout(&state, &request, request_session(&extensions)).await {
        Ok(redirect) => redirect.into_response(),
        Err(e) => error_response(&e),
    }
}
