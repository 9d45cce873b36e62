//! SP metadata endpoint.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use samlsp_core::{Error, Result};

use crate::request::RequestContext;

use super::response::error_response;
use super::state::SamlState;

/// Renders SP metadata for the request root.
pub fn render_metadata(state: &SamlState, request: &RequestContext) -> Result<String> {
    state
        .build_client(request.url_root())?
        .render_metadata()
        .map_err(Error::from_client_build)
}

/// `GET|POST <prefix>/metadata/`
pub async fn metadata(State(state): State<SamlState>, headers: HeaderMap, uri: Uri) -> Response {
    let request =
        RequestContext::from_parts(&headers, &uri, state.settings().trust_forwarded_headers);

    match render_metadata(&state, &request) {
        Ok(xml) => (StatusCode::OK, [(header::CONTENT_TYPE, "text/xml")], xml).into_response(),
        Err(e) => error_response(&e),
    }
}
