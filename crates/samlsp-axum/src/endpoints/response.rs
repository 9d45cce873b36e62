//! Responses produced by the SAML endpoints.

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use samlsp_core::Error;
use tracing::warn;

/// A `302 Found` with extra headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpRedirect {
    /// Redirect target.
    pub location: String,
    /// Additional headers, in order.
    pub headers: Vec<(String, String)>,
}

impl SpRedirect {
    /// Redirects to `location`.
    #[must_use]
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            headers: Vec::new(),
        }
    }

    /// Appends headers.
    #[must_use]
    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Forbids caching of the redirect.
    #[must_use]
    pub fn no_cache(self) -> Self {
        self.with_headers([
            ("Cache-Control".to_string(), "no-cache, no-store".to_string()),
            ("Pragma".to_string(), "no-cache".to_string()),
        ])
    }

    /// Value of the first header named `name`.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl IntoResponse for SpRedirect {
    fn into_response(self) -> Response {
        let Ok(location) = HeaderValue::from_str(&self.location) else {
            return error_response(&Error::Configuration(format!(
                "redirect target is not a valid header value: {}",
                self.location
            )));
        };

        let mut response = StatusCode::FOUND.into_response();
        let headers = response.headers_mut();
        headers.insert(header::LOCATION, location);

        for (name, value) in self.headers {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => warn!(header = %name, "Dropping invalid redirect header"),
            }
        }

        response
    }
}

/// Renders an error as a plain-text response with its HTTP status.
pub fn error_response(err: &Error) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        err.to_string(),
    )
        .into_response()
}
