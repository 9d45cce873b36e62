//! Where the browser goes after a protocol exchange.
//!
//! Login validates the requested target against the request root before
//! the round trip to the IdP. On the way back the relay state is only
//! re-anchored under the root: a relay that does not already start with
//! the root has the root prepended instead of being discarded.

/// Target sent to the IdP as relay state when login starts.
///
/// `next` is kept only when it starts with `url_root`; otherwise the
/// default redirect is used.
#[must_use]
pub fn resolve_return_to(next: Option<&str>, url_root: &str, default_redirect: &str) -> String {
    match next {
        Some(next) if next.starts_with(url_root) => next.to_string(),
        _ => default_redirect.to_string(),
    }
}

/// Target of the redirect issued by the ACS.
///
/// An empty or absent relay falls back to the default redirect. The result
/// is anchored under the request root.
#[must_use]
pub fn normalize_relay_state(
    relay_state: Option<&str>,
    url_root: &str,
    default_redirect: &str,
) -> String {
    let target = relay_state
        .filter(|relay| !relay.is_empty())
        .unwrap_or(default_redirect);
    anchor(target, url_root)
}

/// Target of the redirect issued by the logout endpoint: the default
/// redirect path under the request root.
#[must_use]
pub fn logout_target(url_root: &str, default_redirect: &str) -> String {
    anchor(default_redirect, url_root)
}

fn anchor(target: &str, url_root: &str) -> String {
    if target.starts_with(url_root) {
        target.to_string()
    } else {
        format!("{}{}", url_root.trim_end_matches('/'), target)
    }
}
