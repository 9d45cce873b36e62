//! Cookie-backed session middleware.
//!
//! Loads the session named by the session cookie, exposes it to handlers as
//! a request extension and writes it back after the handler ran, but only
//! when it was modified. A session emptied during the request is deleted
//! and its cookie expired.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, Extensions, HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use samlsp_session::{new_session_id, Session, SessionStore};
use tracing::{debug, error};

/// Cookie attributes for the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookieConfig {
    /// Cookie name.
    pub name: String,
    /// Cookie path.
    pub path: String,
    /// Adds `Secure`.
    pub secure: bool,
    /// `SameSite` value.
    pub same_site: String,
    /// Session lifetime, also used as `Max-Age`.
    pub ttl: Duration,
}

impl Default for SessionCookieConfig {
    fn default() -> Self {
        Self {
            name: "samlsp_session".to_string(),
            path: "/".to_string(),
            secure: false,
            same_site: "Lax".to_string(),
            ttl: Duration::from_secs(8 * 3600),
        }
    }
}

impl SessionCookieConfig {
    /// `Set-Cookie` value binding `session_id`.
    #[must_use]
    pub fn build_cookie(&self, session_id: &str) -> String {
        self.cookie(session_id, self.ttl.as_secs())
    }

    /// `Set-Cookie` value expiring the cookie.
    #[must_use]
    pub fn expired_cookie(&self) -> String {
        self.cookie("", 0)
    }

    fn cookie(&self, value: &str, max_age: u64) -> String {
        let mut cookie = format!("{}={}; Path={}", self.name, value, self.path);
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; HttpOnly");
        cookie.push_str(&format!("; SameSite={}", self.same_site));
        cookie.push_str(&format!("; Max-Age={max_age}"));
        cookie
    }

    /// Session ID from the request's `Cookie` headers.
    #[must_use]
    pub fn parse_session_cookie(&self, headers: &HeaderMap) -> Option<String> {
        let prefix = format!("{}=", self.name);
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .find_map(|part| part.trim().strip_prefix(&prefix).map(str::to_string))
            .filter(|id| !id.is_empty())
    }
}

/// Session store plus cookie settings, used as middleware state.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    cookie: SessionCookieConfig,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("cookie", &self.cookie)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a manager with default cookie settings.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            cookie: SessionCookieConfig::default(),
        }
    }

    /// Replaces the cookie settings.
    #[must_use]
    pub fn with_cookie(mut self, cookie: SessionCookieConfig) -> Self {
        self.cookie = cookie;
        self
    }

    /// Cookie settings.
    #[must_use]
    pub fn cookie(&self) -> &SessionCookieConfig {
        &self.cookie
    }

    /// Wraps every route of `router` with the session middleware.
    pub fn wrap(self, router: Router) -> Router {
        router.layer(middleware::from_fn_with_state(self, session_middleware))
    }
}

/// The session of the current request, or a detached empty one when no
/// session middleware is installed.
#[must_use]
pub fn request_session(extensions: &Extensions) -> Session {
    extensions.get::<Session>().cloned().unwrap_or_default()
}

/// Middleware loading and persisting the request's session.
pub async fn session_middleware(
    State(manager): State<SessionManager>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_id = manager.cookie.parse_session_cookie(request.headers());

    let loaded = match &cookie_id {
        Some(id) => match manager.store.load(id).await {
            Ok(data) => data.map(|data| (id.clone(), data)),
            Err(e) => {
                error!(error = %e, "Failed to load session");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        },
        None => None,
    };

    let (session_id, session) = match loaded {
        Some((id, data)) => (Some(id), Session::from_data(data)),
        None => (None, Session::new()),
    };

    request.extensions_mut().insert(session.clone());
    let mut response = next.run(request).await;

    if !session.is_modified() {
        return response;
    }

    let set_cookie = if session.is_empty() {
        if let Some(id) = &session_id {
            if let Err(e) = manager.store.delete(id).await {
                error!(error = %e, "Failed to delete session");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
            debug!("Session deleted");
        }
        cookie_id.map(|_| manager.cookie.expired_cookie())
    } else {
        let id = match session_id {
            Some(old) if session.needs_new_id() => {
                if let Err(e) = manager.store.delete(&old).await {
                    error!(error = %e, "Failed to delete session");
                    return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                }
                debug!("Session ID rotated");
                new_session_id()
            }
            Some(id) => id,
            None => new_session_id(),
        };
        if let Err(e) = manager
            .store
            .save(&id, &session.data(), manager.cookie.ttl)
            .await
        {
            error!(error = %e, "Failed to save session");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        Some(manager.cookie.build_cookie(&id))
    };

    if let Some(cookie) = set_cookie {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => error!(error = %e, "Session cookie is not a valid header value"),
        }
    }

    response
}
