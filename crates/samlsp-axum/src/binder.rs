//! Default session binder.
//!
//! When sessions are enabled the binder is the first listener on the
//! `Authenticated` and `LoggedOut` channels. It stores the subject and
//! attributes under [`SESSION_KEY`] and clears the session on logout.

use async_trait::async_trait;
use samlsp_core::{Authenticated, EventContext, Listener, ListenerResult, LoggedOut};
use samlsp_protocol::Attributes;
use samlsp_session::{Session, SessionResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Session key holding the [`SessionRecord`].
pub const SESSION_KEY: &str = "saml";

/// What the binder stores for an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// String form of the assertion subject.
    pub subject: String,
    /// Identity attributes.
    pub attributes: Attributes,
}

impl SessionRecord {
    /// Reads the record from a session, if present.
    pub fn load(session: &Session) -> SessionResult<Option<Self>> {
        session.get(SESSION_KEY)
    }
}

/// Writes login results into the session and clears it on logout.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSessionBinder;

#[async_trait]
impl Listener<Authenticated> for DefaultSessionBinder {
    async fn on_event(&self, ctx: &EventContext, event: &Authenticated) -> ListenerResult {
        let record = SessionRecord {
            subject: event.subject.clone(),
            attributes: event.attributes.clone(),
        };
        ctx.session.regenerate();
        ctx.session.insert(SESSION_KEY, &record)?;
        debug!(subject = %record.subject, "Bound SAML identity to session");
        Ok(())
    }
}

#[async_trait]
impl Listener<LoggedOut> for DefaultSessionBinder {
    async fn on_event(&self, ctx: &EventContext, _event: &LoggedOut) -> ListenerResult {
        ctx.session.clear();
        Ok(())
    }
}
