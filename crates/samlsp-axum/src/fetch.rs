//! IdP metadata retrieval.

use std::time::Duration;

use samlsp_core::{Error, Result};
use samlsp_protocol::IdpMetadata;
use tracing::{debug, info, warn};

/// Fetches the IdP metadata document once.
///
/// Any non-2xx status is [`Error::MetadataFetch`] carrying the status and
/// body. Connection failures and timeouts are [`Error::Http`].
pub async fn fetch_metadata(url: &str, timeout: Duration) -> Result<IdpMetadata> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;

    debug!(url, "Fetching IdP metadata");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::Http(format!("GET {url} failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        // The body is diagnostic only; a failed read must not hide the status.
        let body = response.text().await.unwrap_or_else(|e| {
            warn!(url, error = %e, "Could not read metadata error body");
            String::new()
        });
        return Err(Error::MetadataFetch {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| Error::Http(format!("reading metadata body from {url} failed: {e}")))?;

    info!(url, bytes = body.len(), "Fetched IdP metadata");
    Ok(IdpMetadata::new(body))
}
