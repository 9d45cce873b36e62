//! The SAML service provider extension.
//!
//! [`SamlSp::builder`] collects settings, an optional client factory and
//! event listeners; [`SamlSpBuilder::init`] fetches the IdP metadata once
//! and freezes everything into the state shared by the endpoints.

use std::sync::Arc;

use axum::Router;
use samlsp_core::{
    AuthError, Authenticated, Error, Event, EventBus, EventContext, Listener, ListenerResult,
    LoggedOut, Result, SamlSettings,
};
use samlsp_protocol::{BasicClientFactory, ClientFactory, IdpMetadata};
use tracing::info;

use crate::binder::DefaultSessionBinder;
use crate::endpoints::{saml_router, SamlState};
use crate::fetch::fetch_metadata;

/// An initialized service provider.
#[derive(Debug, Clone)]
pub struct SamlSp {
    state: SamlState,
}

impl SamlSp {
    /// Starts configuring a service provider.
    ///
    /// With sessions enabled the default session binder is subscribed
    /// first, so it runs before any listener added through the builder.
    #[must_use]
    pub fn builder(settings: SamlSettings) -> SamlSpBuilder {
        let mut events = EventBus::new();
        if settings.use_sessions {
            let binder = Arc::new(DefaultSessionBinder);
            events.subscribe::<Authenticated>(binder.clone());
            events.subscribe::<LoggedOut>(binder);
        }
        SamlSpBuilder {
            settings,
            factory: Arc::new(BasicClientFactory::new()),
            events,
        }
    }

    /// The SAML endpoints, mounted under the configured prefix.
    pub fn router(&self) -> Router {
        saml_router(self.state.clone())
    }

    /// Shared endpoint state.
    #[must_use]
    pub fn state(&self) -> &SamlState {
        &self.state
    }

    /// Settings in effect.
    #[must_use]
    pub fn settings(&self) -> &SamlSettings {
        self.state.settings()
    }
}

/// Builder for [`SamlSp`].
pub struct SamlSpBuilder {
    settings: SamlSettings,
    factory: Arc<dyn ClientFactory>,
    events: EventBus,
}

impl std::fmt::Debug for SamlSpBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamlSpBuilder")
            .field("settings", &self.settings)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl SamlSpBuilder {
    /// Replaces the protocol client factory.
    #[must_use]
    pub fn client_factory(mut self, factory: Arc<dyn ClientFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Subscribes a listener.
    #[must_use]
    pub fn subscribe<E: Event>(mut self, listener: Arc<dyn Listener<E>>) -> Self {
        self.events.subscribe(listener);
        self
    }

    /// Subscribes a closure.
    #[must_use]
    pub fn on<E, F>(mut self, listener: F) -> Self
    where
        E: Event,
        F: Fn(&EventContext, &E) -> ListenerResult + Send + Sync + 'static,
    {
        self.events.subscribe_fn(listener);
        self
    }

    /// Subscribes a closure to [`Authenticated`].
    #[must_use]
    pub fn on_authenticated<F>(self, listener: F) -> Self
    where
        F: Fn(&EventContext, &Authenticated) -> ListenerResult + Send + Sync + 'static,
    {
        self.on::<Authenticated, F>(listener)
    }

    /// Subscribes a closure to [`LoggedOut`].
    #[must_use]
    pub fn on_logged_out<F>(self, listener: F) -> Self
    where
        F: Fn(&EventContext, &LoggedOut) -> ListenerResult + Send + Sync + 'static,
    {
        self.on::<LoggedOut, F>(listener)
    }

    /// Subscribes a closure to [`AuthError`].
    #[must_use]
    pub fn on_error<F>(self, listener: F) -> Self
    where
        F: Fn(&EventContext, &AuthError) -> ListenerResult + Send + Sync + 'static,
    {
        self.on::<AuthError, F>(listener)
    }

    /// Mutable access to the event bus, e.g. to keep subscription IDs.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Validates settings, fetches the IdP metadata and builds the SP.
    ///
    /// Fails with the fetch error when the metadata cannot be retrieved.
    pub async fn init(self) -> Result<SamlSp> {
        self.settings.validate()?;
        let metadata =
            fetch_metadata(&self.settings.metadata_url, self.settings.metadata_timeout).await?;
        self.init_with_metadata(metadata)
    }

    /// Builds the SP from metadata obtained elsewhere.
    ///
    /// Fails when the client factory cannot honor the configured policy.
    pub fn init_with_metadata(self, metadata: IdpMetadata) -> Result<SamlSp> {
        self.settings.validate()?;
        self.factory
            .check_policy(&self.settings.policy)
            .map_err(Error::from_client_build)?;

        info!(
            metadata_url = %self.settings.metadata_url,
            prefix = %self.settings.prefix,
            sessions = self.settings.use_sessions,
            events = ?self.events,
            "SAML service provider initialized"
        );

        Ok(SamlSp {
            state: SamlState::new(self.settings, metadata, self.factory, self.events),
        })
    }
}
