use sea_orm::DatabaseConnection;
use tokio::sync::broadcast;

use crate::{AuthPolicy, Limits, ResultEngine, SessionEvent};

mod access;
mod auth;
mod feedback;
mod goals;
mod savings;
mod users;

/// Capacity of the session event channel. Slower subscribers lag and skip.
const SESSION_EVENT_CAPACITY: usize = 64;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    limits: Limits,
    auth_policy: AuthPolicy,
    session_events: broadcast::Sender<SessionEvent>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn auth_policy(&self) -> &AuthPolicy {
        &self.auth_policy
    }

    /// Observe sign-in and sign-out events.
    ///
    /// This is the only place session changes are published; every consumer
    /// subscribes here instead of polling.
    pub fn subscribe_sessions(&self) -> broadcast::Receiver<SessionEvent> {
        self.session_events.subscribe()
    }

    fn publish(&self, event: SessionEvent) {
        // No receivers is not an error.
        if self.session_events.send(event).is_err() {
            tracing::trace!(?event, "no session subscribers");
        }
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    limits: Limits,
    auth_policy: AuthPolicy,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub fn limits(mut self, limits: Limits) -> EngineBuilder {
        self.limits = limits;
        self
    }

    pub fn auth_policy(mut self, auth_policy: AuthPolicy) -> EngineBuilder {
        self.auth_policy = auth_policy;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let (session_events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Ok(Engine {
            database: self.database,
            limits: self.limits,
            auth_policy: self.auth_policy,
            session_events,
        })
    }
}
