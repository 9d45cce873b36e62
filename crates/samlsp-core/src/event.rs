//! Typed event bus.
//!
//! Protocol outcomes are published on three channels:
//!
//! | Event | When |
//! |-------|------|
//! | [`Authenticated`] | the ACS accepted a response |
//! | [`LoggedOut`] | the logout endpoint was hit |
//! | [`AuthError`] | the ACS rejected a response |
//!
//! Each application instance owns its own [`EventBus`]. Listeners are
//! registered while the instance is being set up and run sequentially, in
//! subscription order, inside the request that produced the event. A
//! failing listener stops delivery and its error is returned to the
//! publisher.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use samlsp_protocol::{Attributes, AuthnResponse};
use samlsp_session::Session;
use tracing::error;

use crate::error::{Error, Result};

/// Boxed listener error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result returned by listeners.
pub type ListenerResult = std::result::Result<(), BoxError>;

/// Request context handed to listeners.
#[derive(Debug, Clone)]
pub struct EventContext {
    /// Session of the current request.
    pub session: Session,
    /// Externally visible root of the current request, e.g. `http://localhost/`.
    pub url_root: String,
}

impl EventContext {
    /// Creates a context.
    #[must_use]
    pub fn new(session: Session, url_root: impl Into<String>) -> Self {
        Self {
            session,
            url_root: url_root.into(),
        }
    }
}

/// A user was authenticated by the IdP.
#[derive(Debug, Clone)]
pub struct Authenticated {
    /// String form of the assertion subject.
    pub subject: String,
    /// Identity attributes.
    pub attributes: Attributes,
    /// The full validated response.
    pub response: Arc<AuthnResponse>,
}

/// The user logged out locally.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggedOut;

/// The ACS could not authenticate the user.
#[derive(Debug, Clone)]
pub struct AuthError {
    /// Why.
    pub error: Arc<Error>,
}

/// An event kind with its own channel on the bus.
pub trait Event: Send + Sync + Sized + 'static {
    /// Name used in logs and listener errors.
    const NAME: &'static str;

    /// The channel carrying this event.
    fn channel(bus: &EventBus) -> &Channel<Self>;

    /// Mutable access for registration.
    fn channel_mut(bus: &mut EventBus) -> &mut Channel<Self>;
}

impl Event for Authenticated {
    const NAME: &'static str = "authenticated";

    fn channel(bus: &EventBus) -> &Channel<Self> {
        &bus.authenticated
    }

    fn channel_mut(bus: &mut EventBus) -> &mut Channel<Self> {
        &mut bus.authenticated
    }
}

impl Event for LoggedOut {
    const NAME: &'static str = "logged-out";

    fn channel(bus: &EventBus) -> &Channel<Self> {
        &bus.logged_out
    }

    fn channel_mut(bus: &mut EventBus) -> &mut Channel<Self> {
        &mut bus.logged_out
    }
}

impl Event for AuthError {
    const NAME: &'static str = "error";

    fn channel(bus: &EventBus) -> &Channel<Self> {
        &bus.auth_error
    }

    fn channel_mut(bus: &mut EventBus) -> &mut Channel<Self> {
        &mut bus.auth_error
    }
}

/// A subscriber to one event kind.
#[async_trait]
pub trait Listener<E: Event>: Send + Sync {
    /// Handles one event.
    async fn on_event(&self, ctx: &EventContext, event: &E) -> ListenerResult;
}

/// Adapts a synchronous closure into a [`Listener`].
struct FnListener<F>(F);

#[async_trait]
impl<E, F> Listener<E> for FnListener<F>
where
    E: Event,
    F: Fn(&EventContext, &E) -> ListenerResult + Send + Sync,
{
    async fn on_event(&self, ctx: &EventContext, event: &E) -> ListenerResult {
        (self.0)(ctx, event)
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Listeners of one event kind, in subscription order.
pub struct Channel<E: Event> {
    listeners: Vec<(SubscriptionId, Arc<dyn Listener<E>>)>,
}

impl<E: Event> Default for Channel<E> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }
}

impl<E: Event> Channel<E> {
    fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }
}

/// Per-instance publish/subscribe registry.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    authenticated: Channel<Authenticated>,
    logged_out: Channel<LoggedOut>,
    auth_error: Channel<AuthError>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("authenticated", &self.authenticated.listeners.len())
            .field("logged_out", &self.logged_out.listeners.len())
            .field("auth_error", &self.auth_error.listeners.len())
            .finish()
    }
}

impl EventBus {
    /// Creates a bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a listener for `E`.
    pub fn subscribe<E: Event>(&mut self, listener: Arc<dyn Listener<E>>) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        E::channel_mut(self).listeners.push((id, listener));
        id
    }

    /// Appends a closure listener for `E`.
    pub fn subscribe_fn<E, F>(&mut self, listener: F) -> SubscriptionId
    where
        E: Event,
        F: Fn(&EventContext, &E) -> ListenerResult + Send + Sync + 'static,
    {
        self.subscribe::<E>(Arc::new(FnListener(listener)))
    }

    /// Removes a listener from whichever channel holds it.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.authenticated.remove(id) || self.logged_out.remove(id) || self.auth_error.remove(id)
    }

    /// Number of listeners for `E`.
    #[must_use]
    pub fn listener_count<E: Event>(&self) -> usize {
        E::channel(self).listeners.len()
    }

    /// Delivers `event` to every listener of `E`, in order.
    ///
    /// Stops at the first failing listener and returns [`Error::Listener`].
    pub async fn publish<E: Event>(&self, ctx: &EventContext, event: &E) -> Result<()> {
        for (id, listener) in &E::channel(self).listeners {
            if let Err(source) = listener.on_event(ctx, event).await {
                error!(event = E::NAME, subscription = id.0, error = %source, "Event listener failed");
                return Err(Error::Listener {
                    event: E::NAME,
                    source,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use samlsp_protocol::{Conditions, NameId, Status};
    use std::sync::Mutex;

    fn ctx() -> EventContext {
        EventContext::new(Session::new(), "http://localhost/")
    }

    fn authenticated(subject: &str) -> Authenticated {
        let response = AuthnResponse {
            id: "r".into(),
            issuer: "https://idp".into(),
            in_response_to: None,
            destination: None,
            status: Status::success(),
            name_id: NameId::new(subject),
            session_index: None,
            conditions: Conditions::default(),
            attributes: Attributes::new(),
            response_signed: false,
            assertion_signed: true,
        };
        Authenticated {
            subject: subject.to_string(),
            attributes: Attributes::new(),
            response: Arc::new(response),
        }
    }

    /// Writes the subject into the session.
    struct SessionWriter;

    #[async_trait]
    impl Listener<Authenticated> for SessionWriter {
        async fn on_event(&self, ctx: &EventContext, event: &Authenticated) -> ListenerResult {
            ctx.session.insert("subject", &event.subject)?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn listeners_run_in_subscription_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();

        for name in ["first", "second"] {
            let log = log.clone();
            bus.subscribe_fn(move |_ctx: &EventContext, _event: &LoggedOut| {
                log.lock().map_err(|e| e.to_string())?.push(name);
                Ok(())
            });
        }

        bus.publish(&ctx(), &LoggedOut).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn failing_listener_stops_delivery() {
        let reached = Arc::new(Mutex::new(false));
        let mut bus = EventBus::new();

        bus.subscribe_fn(|_ctx: &EventContext, _event: &LoggedOut| Err("boom".into()));
        let flag = reached.clone();
        bus.subscribe_fn(move |_ctx: &EventContext, _event: &LoggedOut| {
            *flag.lock().map_err(|e| e.to_string())? = true;
            Ok(())
        });

        let err = bus.publish(&ctx(), &LoggedOut).await.unwrap_err();
        assert!(matches!(err, Error::Listener { event: "logged-out", .. }));
        assert_eq!(err.http_status(), 500);
        assert!(!*reached.lock().unwrap());
    }

    #[tokio::test]
    async fn channels_are_separate() {
        let mut bus = EventBus::new();
        bus.subscribe::<Authenticated>(Arc::new(SessionWriter));

        let ctx = ctx();
        bus.publish(&ctx, &LoggedOut).await.unwrap();
        assert!(ctx.session.is_empty());

        bus.publish(&ctx, &authenticated("alice")).await.unwrap();
        assert_eq!(ctx.session.get::<String>("subject").unwrap().as_deref(), Some("alice"));
        assert_eq!(bus.listener_count::<Authenticated>(), 1);
        assert_eq!(bus.listener_count::<AuthError>(), 0);
    }

    #[tokio::test]
    async fn unsubscribe_removes_listener() {
        let mut bus = EventBus::new();
        let id = bus.subscribe_fn(|_ctx: &EventContext, _event: &AuthError| Err("nope".into()));

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));

        let event = AuthError {
            error: Arc::new(Error::UnknownProtocol),
        };
        assert!(bus.publish(&ctx(), &event).await.is_ok());
    }

    #[tokio::test]
    async fn buses_do_not_share_listeners() {
        let mut first = EventBus::new();
        let second = EventBus::new();
        first.subscribe::<Authenticated>(Arc::new(SessionWriter));

        let ctx = ctx();
        second.publish(&ctx, &authenticated("bob")).await.unwrap();
        assert!(ctx.session.is_empty());
        assert_eq!(second.listener_count::<Authenticated>(), 0);
    }
}
