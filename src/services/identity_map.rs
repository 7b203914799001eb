use std::sync::Arc;

use tokio_util::task::TaskTracker;
use uuid::Uuid;

use crate::{
    db::{DbError, DbResult, IdentityMapRepo},
    identity::ResolvedIdentity,
    models::IdentitySource,
};

/// Records legacy identities against one opaque canonical id.
///
/// All of this is migration bookkeeping. Failures surface as `None` plus a
/// warning and never as an error the caller has to handle, except through
/// [`record_pair`](Self::record_pair). Background writes are at-most-once
/// with no retry; every row can be rebuilt from the legacy sources.
#[derive(Clone)]
pub struct IdentityMapService {
    repo: Arc<dyn IdentityMapRepo>,
    task_tracker: TaskTracker,
}

impl IdentityMapService {
    pub fn new(repo: Arc<dyn IdentityMapRepo>, task_tracker: TaskTracker) -> Self {
        Self { repo, task_tracker }
    }

    /// Get the canonical id for the primary identity, creating it on first sighting.
    ///
    /// The secondary identity, if any, is written in the background and
    /// never affects the return value.
    pub async fn record(&self, identity: &ResolvedIdentity) -> Option<String> {
        if let Some(secondary) = &identity.secondary {
            self.spawn_pair(secondary.kind.into(), secondary.id.clone());
        }

        let source = IdentitySource::from(identity.primary.kind);
        let legacy_id = identity.primary.id.as_str();
        if legacy_id.is_empty() {
            tracing::debug!(source = %source, "Skipping identity map entry without legacy id");
            return None;
        }

        match self.record_pair(source, legacy_id).await {
            Ok(identity_id) => Some(identity_id),
            Err(e) => {
                tracing::warn!(
                    source = %source,
                    legacy_id = legacy_id,
                    error = %e,
                    "Failed to record identity map entry"
                );
                None
            }
        }
    }

    /// Insert-or-ignore one pair, then read back whichever id won.
    pub async fn record_pair(&self, source: IdentitySource, legacy_id: &str) -> DbResult<String> {
        if legacy_id.is_empty() {
            return Err(DbError::Internal(format!(
                "Empty legacy id for identity source '{}'",
                source
            )));
        }

        let candidate = Uuid::new_v4().to_string();
        if self
            .repo
            .insert_if_absent(source, legacy_id, &candidate)
            .await?
        {
            return Ok(candidate);
        }

        self.repo
            .get_identity_id(source, legacy_id)
            .await?
            .ok_or_else(|| {
                DbError::Internal(format!(
                    "Identity map row for {}:{} missing after conflicting insert",
                    source, legacy_id
                ))
            })
    }

    /// Run [`record`](Self::record) without anyone awaiting it.
    pub fn record_detached(&self, identity: ResolvedIdentity) {
        let service = self.clone();
        self.task_tracker.spawn(async move {
            service.record(&identity).await;
        });
    }

    /// Write a single pair in the background.
    pub fn spawn_pair(&self, source: IdentitySource, legacy_id: impl Into<String>) {
        let legacy_id = legacy_id.into();
        if legacy_id.is_empty() {
            tracing::debug!(source = %source, "Skipping identity map entry without legacy id");
            return;
        }

        let service = self.clone();
        self.task_tracker.spawn(async move {
            if let Err(e) = service.record_pair(source, &legacy_id).await {
                tracing::warn!(
                    source = %source,
                    legacy_id = %legacy_id,
                    error = %e,
                    "Failed to record background identity map entry"
                );
            }
        });
    }

    /// Canonical id already recorded for the primary identity, without writing.
    pub async fn lookup(&self, identity: &ResolvedIdentity) -> Option<String> {
        let source = IdentitySource::from(identity.primary.kind);
        match self
            .repo
            .get_identity_id(source, &identity.primary.id)
            .await
        {
            Ok(identity_id) => identity_id,
            Err(e) => {
                tracing::warn!(source = %source, error = %e, "Failed to look up identity map entry");
                None
            }
        }
    }
}
