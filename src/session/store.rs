//! Session storage.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{SessionId, SessionState};

/// Result type for session store operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur during session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session not found")]
    NotFound,

    #[error("Session store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the state for a session. Unknown and expired ids yield `None`.
    async fn load(&self, id: &SessionId) -> SessionResult<Option<SessionState>>;

    /// Destroy `old` (if any) and issue a fresh, empty session id.
    async fn regenerate(&self, old: Option<&SessionId>) -> SessionResult<SessionId>;

    /// Persist state for an id previously issued by [`regenerate`](Self::regenerate).
    ///
    /// Fails with [`SessionError::NotFound`] if the id was destroyed or expired.
    async fn save(&self, id: &SessionId, state: &SessionState) -> SessionResult<()>;

    async fn destroy(&self, id: &SessionId) -> SessionResult<()>;
}

struct StoredSession {
    payload: Vec<u8>,
    expires_at: DateTime<Utc>,
}

/// In-memory session store.
///
/// Suitable for development and single-node deployments.
/// Sessions are lost on restart and not shared across nodes. State is kept
/// serialized so callers never share it by reference.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, StoredSession>>,
    ttl: chrono::Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    fn encode(state: &SessionState) -> SessionResult<Vec<u8>> {
        serde_json::to_vec(state).map_err(|e| SessionError::Serialization(e.to_string()))
    }

    fn expiry(&self) -> DateTime<Utc> {
        Utc::now()
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Drop expired sessions.
    pub async fn cleanup(&self) {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.expires_at > now);
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> SessionResult<Option<SessionState>> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                None => return Ok(None),
                Some(stored) if stored.expires_at > now => {
                    let state = serde_json::from_slice(&stored.payload)
                        .map_err(|e| SessionError::Serialization(e.to_string()))?;
                    return Ok(Some(state));
                }
                Some(_) => {}
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.expires_at > now);
        Ok(None)
    }

    async fn regenerate(&self, old: Option<&SessionId>) -> SessionResult<SessionId> {
        let payload = Self::encode(&SessionState::default())?;
        let mut sessions = self.sessions.write().await;
        if let Some(old) = old {
            sessions.remove(old);
        }

        let mut id = SessionId::generate();
        while sessions.contains_key(&id) {
            id = SessionId::generate();
        }
        sessions.insert(
            id,
            StoredSession {
                payload,
                expires_at: self.expiry(),
            },
        );
        Ok(id)
    }

    async fn save(&self, id: &SessionId, state: &SessionState) -> SessionResult<()> {
        let payload = Self::encode(state)?;
        let expires_at = self.expiry();
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(stored) if stored.expires_at > Utc::now() => {
                stored.payload = payload;
                stored.expires_at = expires_at;
                Ok(())
            }
            _ => Err(SessionError::NotFound),
        }
    }

    async fn destroy(&self, id: &SessionId) -> SessionResult<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id);
        Ok(())
    }
}
