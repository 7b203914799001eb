//! Repository for the legacy-id to canonical-id correlation table.

use async_trait::async_trait;

use crate::{
    db::error::DbResult,
    models::{IdentityMapRow, IdentitySource},
};

/// Storage for identity map rows.
///
/// Convergence under concurrent first writes relies entirely on the
/// `(source, legacy_id)` uniqueness of the backing store: implementations
/// must make [`insert_if_absent`](Self::insert_if_absent) atomic and must
/// never overwrite an existing row.
#[async_trait]
pub trait IdentityMapRepo: Send + Sync {
    /// Insert `(source, legacy_id) -> identity_id` unless the pair already exists.
    ///
    /// Returns `true` if this call created the row. A conflict is not an error.
    async fn insert_if_absent(
        &self,
        source: IdentitySource,
        legacy_id: &str,
        identity_id: &str,
    ) -> DbResult<bool>;

    /// Get the canonical id stored for a pair.
    ///
    /// Must observe rows written by `insert_if_absent` on the same repo
    /// immediately, so replicated backends read from the primary here.
    async fn get_identity_id(
        &self,
        source: IdentitySource,
        legacy_id: &str,
    ) -> DbResult<Option<String>>;

    /// List every legacy id correlated to one canonical id, oldest first.
    async fn list_by_identity_id(&self, identity_id: &str) -> DbResult<Vec<IdentityMapRow>>;
}
