use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::session::{Session, SessionId};
use crate::errors::ApplicationError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("session serialization failed: {0}")]
    Serialization(String),
    #[error("session store backend failed: {0}")]
    Backend(String),
}

impl From<StoreError> for ApplicationError {
    fn from(value: StoreError) -> Self {
        Self::Persistence(value.to_string())
    }
}

/// Persistence boundary. The engine is stateless across turns; callers load
/// a session before `handle_turn` and save the returned one after, keeping
/// at most one in-flight turn per session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, StoreError>;
    async fn save(&self, session: &Session) -> Result<(), StoreError>;
}

/// Test/simulation store. Sessions round-trip through their serialized form
/// on every save/load, so anything that survives this store survives a real
/// one.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<String, String>>>,
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        let sessions = match self.sessions.lock() {
            Ok(sessions) => sessions,
            Err(poisoned) => poisoned.into_inner(),
        };

        sessions
            .get(&id.0)
            .map(|raw| {
                serde_json::from_str(raw)
                    .map_err(|error| StoreError::Serialization(error.to_string()))
            })
            .transpose()
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        let raw = serde_json::to_string(session)
            .map_err(|error| StoreError::Serialization(error.to_string()))?;

        let mut sessions = match self.sessions.lock() {
            Ok(sessions) => sessions,
            Err(poisoned) => poisoned.into_inner(),
        };
        sessions.insert(session.id.0.clone(), raw);
        Ok(())
    }
}
