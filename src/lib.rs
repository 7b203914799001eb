//! Identity resolution, policy evaluation and shadow-mode authorization
//! diffing for migrating a live application off its legacy auth checks.
//!
//! Requests pass through [`middleware::session_middleware`] and
//! [`middleware::resolve_identity_middleware`], which attach a
//! [`identity::ResolvedIdentity`] to the request. Route guards then enforce
//! the [`policy`] decision while the [`divergence`] logger replays the legacy
//! check for comparison.

pub mod config;
pub mod db;
pub mod divergence;
pub mod identity;
pub mod middleware;
pub mod models;
#[cfg(feature = "server")]
pub mod observability;
pub mod policy;
pub mod routes;
pub mod services;
pub mod session;

use std::{sync::Arc, time::Duration};

use tokio_util::task::TaskTracker;

use crate::{
    config::GatekeeperConfig,
    db::{DbError, DbPool, IdentityMapRepo, memory::MemoryIdentityMapRepo},
    divergence::DivergenceLogger,
    services::IdentityMapService,
    session::{MemorySessionStore, SessionEstablisher, SessionStore},
};

/// How often expired sessions are swept from the in-memory store.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatekeeperConfig>,
    pub db: Option<Arc<DbPool>>,
    pub sessions: Arc<dyn SessionStore>,
    pub establisher: SessionEstablisher,
    /// Identity map writer; `None` when `migration.identity_map` is off.
    pub identity_map: Option<IdentityMapService>,
    pub divergence: Arc<DivergenceLogger>,
    /// Tracks identity map writes so shutdown can wait for them.
    pub task_tracker: TaskTracker,
}

impl AppState {
    /// Connect to the configured database and assemble the state.
    pub async fn new(config: GatekeeperConfig) -> Result<Self, DbError> {
        let db = if config.database.is_none() {
            None
        } else {
            let pool = DbPool::from_config(&config.database).await?;
            if config.database.run_migrations() {
                pool.run_migrations().await?;
            }
            Some(Arc::new(pool))
        };

        let sessions = Arc::new(MemorySessionStore::new(Duration::from_secs(
            config.session.ttl_secs,
        )));
        spawn_session_sweeper(&sessions);

        Ok(Self::with_components(config, db, sessions))
    }

    /// Assemble the state from already-built parts.
    pub fn with_components(
        config: GatekeeperConfig,
        db: Option<Arc<DbPool>>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let task_tracker = TaskTracker::new();

        if config.uses_memory_identity_map() {
            tracing::warn!(
                "Identity map enabled without a database; rows are kept in memory \
                 and lost on restart"
            );
        }

        let identity_map = if config.migration.identity_map {
            let repo: Arc<dyn IdentityMapRepo> = match &db {
                Some(db) => db.identity_map(),
                None => Arc::new(MemoryIdentityMapRepo::new()),
            };
            Some(IdentityMapService::new(repo, task_tracker.clone()))
        } else {
            None
        };

        let establisher = SessionEstablisher::new(sessions.clone(), identity_map.clone());
        let divergence = Arc::new(DivergenceLogger::new(config.migration.divergence_logging));

        Self {
            config: Arc::new(config),
            db,
            sessions,
            establisher,
            identity_map,
            divergence,
            task_tracker,
        }
    }
}

/// Periodically purge expired sessions until the store is dropped.
fn spawn_session_sweeper(store: &Arc<MemorySessionStore>) {
    let store = Arc::downgrade(store);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            let Some(store) = store.upgrade() else {
                break;
            };
            store.cleanup().await;
        }
    });
}
