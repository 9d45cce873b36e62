//! SAML endpoint router.

use axum::{routing::get, Router};

use super::acs::acs;
use super::logout::logout;
use super::metadata::metadata;
use super::sso::sso;
use super::state::SamlState;

/// Creates the router for the SAML endpoints.
///
/// # Routes
///
/// | Method | Path | Handler | Description |
/// |--------|------|---------|-------------|
/// | GET, POST | `<prefix>/sso/` | [`sso`] | Redirect to the IdP |
/// | GET, POST | `<prefix>/acs/` | [`acs`] | Consume the IdP response |
/// | GET, POST | `<prefix>/logout/` | [`logout`] | Local logout |
/// | GET, POST | `<prefix>/metadata/` | [`metadata`] | SP metadata |
pub fn saml_router(state: SamlState) -> Router {
    let settings = state.settings();
    let (sso_path, acs_path, logout_path, metadata_path) = (
        settings.route("sso"),
        settings.route("acs"),
        settings.route("logout"),
        settings.route("metadata"),
    );

    Router::new()
        .route(&sso_path, get(sso).post(sso))
        .route(&acs_path, get(acs).post(acs))
        .route(&logout_path, get(logout).post(logout))
        .route(&metadata_path, get(metadata).post(metadata))
        .with_state(state)
}
