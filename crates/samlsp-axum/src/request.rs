//! Per-request view of the externally visible URL.

use axum::http::{header, HeaderMap, Uri};

/// Request root and query of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    url_root: String,
    query: Vec<(String, String)>,
}

impl RequestContext {
    /// Builds the context from request parts.
    ///
    /// The root is `scheme://host/`. With `trust_forwarded` set, the first
    /// `X-Forwarded-Proto` / `X-Forwarded-Host` values take precedence over
    /// the request URI and `Host` header.
    #[must_use]
    pub fn from_parts(headers: &HeaderMap, uri: &Uri, trust_forwarded: bool) -> Self {
        let forwarded = |name: &str| {
            trust_forwarded
                .then(|| first_value(headers, name))
                .flatten()
        };

        let scheme = forwarded("x-forwarded-proto")
            .or_else(|| uri.scheme_str().map(str::to_string))
            .unwrap_or_else(|| "http".to_string());

        let host = forwarded("x-forwarded-host")
            .or_else(|| first_value(headers, header::HOST.as_str()))
            .or_else(|| uri.authority().map(|a| a.as_str().to_string()))
            .unwrap_or_else(|| "localhost".to_string());

        let query = uri
            .query()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();

        Self {
            url_root: format!("{}://{}/", scheme.to_ascii_lowercase(), host),
            query,
        }
    }

    /// The request root, always ending in `/`.
    #[must_use]
    pub fn url_root(&self) -> &str {
        &self.url_root
    }

    /// First value of a query parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// `path` resolved under the request root.
    #[must_use]
    pub fn under_root(&self, path: &str) -> String {
        format!("{}{}", self.url_root.trim_end_matches('/'), path)
    }
}

fn first_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
