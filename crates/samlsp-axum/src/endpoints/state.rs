//! Shared endpoint state.

use std::sync::Arc;

use samlsp_core::{Error, EventBus, Result, SamlSettings};
use samlsp_protocol::{ClientFactory, ClientSettings, IdpMetadata, ProtocolClient};

/// State shared by the SAML endpoints of one application instance.
///
/// Settings, metadata and listeners are fixed once the instance is built.
/// Protocol clients are not cached: every request builds its own from the
/// request root.
#[derive(Clone)]
pub struct SamlState {
    inner: Arc<Inner>,
}

struct Inner {
    settings: SamlSettings,
    metadata: IdpMetadata,
    factory: Arc<dyn ClientFactory>,
    events: EventBus,
}

impl std::fmt::Debug for SamlState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamlState")
            .field("settings", &self.inner.settings)
            .field("metadata_bytes", &self.inner.metadata.as_str().len())
            .field("events", &self.inner.events)
            .finish()
    }
}

impl SamlState {
    /// Creates the state.
    pub fn new(
        settings: SamlSettings,
        metadata: IdpMetadata,
        factory: Arc<dyn ClientFactory>,
        events: EventBus,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                metadata,
                factory,
                events,
            }),
        }
    }

    /// SP settings.
    #[must_use]
    pub fn settings(&self) -> &SamlSettings {
        &self.inner.settings
    }

    /// IdP metadata fetched at startup.
    #[must_use]
    pub fn metadata(&self) -> &IdpMetadata {
        &self.inner.metadata
    }

    /// The instance's event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// Protocol settings for a request arriving under `url_root`.
    ///
    /// The entity ID is the absolute metadata URL and the ACS is the
    /// absolute ACS URL, both derived from the request.
    #[must_use]
    pub fn client_settings(&self, url_root: &str) -> ClientSettings {
        let settings = &self.inner.settings;
        let base = url_root.trim_end_matches('/');
        ClientSettings {
            entity_id: format!("{base}{}", settings.route("metadata")),
            acs_url: format!("{base}{}", settings.route("acs")),
            policy: settings.policy.clone(),
        }
    }

    /// Builds a fresh protocol client for a request arriving under `url_root`.
    pub fn build_client(&self, url_root: &str) -> Result<Box<dyn ProtocolClient>> {
        self.inner
            .factory
            .build_client(&self.client_settings(url_root), &self.inner.metadata)
            .map_err(Error::from_client_build)
    }
}
