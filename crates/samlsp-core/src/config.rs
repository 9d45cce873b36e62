//! Service provider configuration.
//!
//! Configuration is loaded from environment variables with sensible defaults,
//! or built in code with [`SamlSettings::new`] and the `with_*` setters.

use std::time::Duration;

use samlsp_protocol::ProtocolPolicy;

use crate::error::{Error, Result};

/// Service provider settings, fixed at initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamlSettings {
    /// Where the IdP metadata is fetched from.
    pub metadata_url: String,

    /// Route prefix, normalized to a leading `/` and no trailing `/`.
    pub prefix: String,

    /// Path (or same-origin URL) used after logout and when no target is given.
    pub default_redirect: String,

    /// Register the default session binder.
    pub use_sessions: bool,

    /// Derive the request root from `X-Forwarded-Proto` / `X-Forwarded-Host`.
    pub trust_forwarded_headers: bool,

    /// Timeout of the metadata request.
    pub metadata_timeout: Duration,

    /// Signing and validation policy handed to every protocol client.
    pub policy: ProtocolPolicy,
}

impl SamlSettings {
    /// Creates settings with defaults for everything but the metadata URL.
    #[must_use]
    pub fn new(metadata_url: impl Into<String>) -> Self {
        Self {
            metadata_url: metadata_url.into(),
            prefix: "/saml".to_string(),
            default_redirect: "/".to_string(),
            use_sessions: true,
            trust_forwarded_headers: false,
            metadata_timeout: Duration::from_secs(10),
            policy: ProtocolPolicy::default(),
        }
    }

    /// Loads settings from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let metadata_url = lookup("SAML_METADATA_URL").ok_or_else(|| {
            Error::Configuration("SAML_METADATA_URL environment variable is required".to_string())
        })?;

        let flag = |key: &str, default: bool| {
            lookup(key)
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(default)
        };
        let number = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        let defaults = ProtocolPolicy::default();
        let policy = ProtocolPolicy {
            allow_unsolicited: flag("SAML_ALLOW_UNSOLICITED", defaults.allow_unsolicited),
            authn_requests_signed: flag(
                "SAML_AUTHN_REQUESTS_SIGNED",
                defaults.authn_requests_signed,
            ),
            logout_requests_signed: flag(
                "SAML_LOGOUT_REQUESTS_SIGNED",
                defaults.logout_requests_signed,
            ),
            want_assertions_signed: flag(
                "SAML_WANT_ASSERTIONS_SIGNED",
                defaults.want_assertions_signed,
            ),
            want_response_signed: flag("SAML_WANT_RESPONSE_SIGNED", defaults.want_response_signed),
            allow_unknown_attributes: flag(
                "SAML_ALLOW_UNKNOWN_ATTRIBUTES",
                defaults.allow_unknown_attributes,
            ),
            clock_skew_secs: number("SAML_CLOCK_SKEW_SECS", defaults.clock_skew_secs),
        };

        let settings = Self::new(metadata_url)
            .with_prefix(lookup("SAML_PREFIX").unwrap_or_else(|| "/saml".to_string()))
            .with_default_redirect(lookup("SAML_DEFAULT_REDIRECT").unwrap_or_else(|| "/".to_string()))
            .with_sessions(flag("SAML_USE_SESSIONS", true))
            .with_trusted_forwarded_headers(flag("SAML_TRUST_FORWARDED_HEADERS", false))
            .with_metadata_timeout(Duration::from_secs(number("SAML_METADATA_TIMEOUT_SECS", 10)))
            .with_policy(policy);

        settings.validate()?;
        Ok(settings)
    }

    /// Sets the route prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl AsRef<str>) -> Self {
        self.prefix = normalize_prefix(prefix.as_ref());
        self
    }

    /// Sets the default redirect.
    #[must_use]
    pub fn with_default_redirect(mut self, path: impl Into<String>) -> Self {
        self.default_redirect = path.into();
        self
    }

    /// Enables or disables the default session binder.
    #[must_use]
    pub const fn with_sessions(mut self, enabled: bool) -> Self {
        self.use_sessions = enabled;
        self
    }

    /// Trusts `X-Forwarded-*` headers when computing the request root.
    #[must_use]
    pub const fn with_trusted_forwarded_headers(mut self, trusted: bool) -> Self {
        self.trust_forwarded_headers = trusted;
        self
    }

    /// Sets the metadata request timeout.
    #[must_use]
    pub const fn with_metadata_timeout(mut self, timeout: Duration) -> Self {
        self.metadata_timeout = timeout;
        self
    }

    /// Sets the protocol policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ProtocolPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Checks the settings for values the orchestrators cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.metadata_url.trim().is_empty() {
            return Err(Error::Configuration("metadata URL is empty".to_string()));
        }
        // Resolved under the request root by every leg.
        let redirect = self.default_redirect.as_str();
        if !redirect.starts_with('/') {
            return Err(Error::Configuration(format!(
                "default redirect '{redirect}' must be a path starting with '/'"
            )));
        }
        if self.metadata_timeout.is_zero() {
            return Err(Error::Configuration(
                "metadata timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Path of one of the SP endpoints, e.g. `route("acs")` is `/saml/acs/`.
    #[must_use]
    pub fn route(&self, name: &str) -> String {
        format!("{}/{}/", self.prefix, name)
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
