//! Server configuration.
//!
//! Configuration is loaded from environment variables with sensible
//! defaults. SAML settings are read separately by
//! [`SamlSettings::from_env`](samlsp_core::SamlSettings::from_env).

use std::time::Duration;

use samlsp_axum::SessionCookieConfig;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,

    /// Port to bind to.
    pub port: u16,

    /// Mark the session cookie `Secure`.
    pub cookie_secure: bool,

    /// Session lifetime.
    pub session_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cookie_secure: false,
            session_ttl: Duration::from_secs(8 * 3600),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Self {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("SAMLSP_HOST").unwrap_or(defaults.host);
        let port = lookup("SAMLSP_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        let cookie_secure = lookup("SAMLSP_COOKIE_SECURE")
            .map(|v| !matches!(v.trim(), "false" | "0" | ""))
            .unwrap_or(defaults.cookie_secure);
        let session_ttl = lookup("SAMLSP_SESSION_TTL_SECS")
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.session_ttl);

        Self {
            host,
            port,
            cookie_secure,
            session_ttl,
        }
    }

    /// Address to bind to.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Session cookie settings.
    #[must_use]
    pub fn session_cookie(&self) -> SessionCookieConfig {
        SessionCookieConfig {
            secure: self.cookie_secure,
            ttl: self.session_ttl,
            ..SessionCookieConfig::default()
        }
    }
}
