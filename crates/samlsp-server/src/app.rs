//! Application routes and listeners.

use axum::{
    extract::State,
    http::{Extensions, HeaderMap, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use samlsp_axum::{
    session_layer::request_session, RequestContext, SamlSp, SamlSpBuilder, SamlState,
    SessionManager, SessionRecord, SpRedirect,
};
use tracing::{info, warn};

/// Attribute listing a principal's groups.
pub const GROUPS_ATTRIBUTE: &str = "memberOf";

/// Subscribes the application's own listeners.
///
/// On login the principal is logged with its groups; failed logins are
/// logged with their cause.
pub fn register_listeners(builder: SamlSpBuilder) -> SamlSpBuilder {
    builder
        .on_authenticated(|_, event| {
            let groups = event
                .attributes
                .get(GROUPS_ATTRIBUTE)
                .map(|g| g.join(", "))
                .unwrap_or_default();
            info!(principal = %event.subject, %groups, "Principal logged in");
            Ok(())
        })
        .on_error(|ctx, event| {
            warn!(url_root = %ctx.url_root, error = %event.error, "SAML login failed");
            Ok(())
        })
}

/// Application routes plus the SAML endpoints, behind the session layer.
///
/// # Routes
///
/// | Method | Path | Description |
/// |--------|------|-------------|
/// | GET | `/` | Who is logged in |
/// | GET | `/admin` | Groups of the logged-in user, SSO for anonymous users |
pub fn app_router(sp: &SamlSp, sessions: SessionManager) -> Router {
    let app = Router::new()
        .route("/", get(index))
        .route("/admin", get(admin))
        .with_state(sp.state().clone())
        .merge(sp.router());
    sessions.wrap(app)
}

async fn index(extensions: Extensions) -> Response {
    match current_user(&extensions) {
        Some(record) => format!("Logged in as {}", record.subject).into_response(),
        None => "Not logged in".into_response(),
    }
}

async fn admin(
    State(state): State<SamlState>,
    headers: HeaderMap,
    uri: Uri,
    extensions: Extensions,
) -> Response {
    let Some(record) = current_user(&extensions) else {
        let request =
            RequestContext::from_parts(&headers, &uri, state.settings().trust_forwarded_headers);
        let here = request.under_root(uri.path());
        let login = format!(
            "{}?next={}",
            state.settings().route("sso"),
            urlencoding::encode(&here)
        );
        return SpRedirect::to(login).into_response();
    };

    let groups = record
        .attributes
        .get(GROUPS_ATTRIBUTE)
        .map(|g| g.join(", "))
        .unwrap_or_default();
    format!("Admin area for {} (groups: {groups})", record.subject).into_response()
}

fn current_user(extensions: &Extensions) -> Option<SessionRecord> {
    match SessionRecord::load(&request_session(extensions)) {
        Ok(record) => record,
        Err(e) => {
            warn!(error = %e, "Unreadable session record");
            None
        }
    }
}
