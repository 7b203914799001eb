use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};

use crate::{
    db::{error::DbResult, repos::IdentityMapRepo},
    models::{IdentityMapRow, IdentitySource},
};

/// Process-local identity map.
///
/// Used when no database is configured. Correlations do not survive a
/// restart, which is acceptable because every row can be rebuilt from
/// the legacy sources.
#[derive(Default)]
pub struct MemoryIdentityMapRepo {
    rows: DashMap<(IdentitySource, String), IdentityMapRow>,
}

impl MemoryIdentityMapRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl IdentityMapRepo for MemoryIdentityMapRepo {
    async fn insert_if_absent(
        &self,
        source: IdentitySource,
        legacy_id: &str,
        identity_id: &str,
    ) -> DbResult<bool> {
        // The entry guard holds the shard lock, so check-and-insert is atomic.
        match self.rows.entry((source, legacy_id.to_string())) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(IdentityMapRow {
                    source,
                    legacy_id: legacy_id.to_string(),
                    identity_id: identity_id.to_string(),
                    created_at: Utc::now(),
                });
                Ok(true)
            }
        }
    }

    async fn get_identity_id(
        &self,
        source: IdentitySource,
        legacy_id: &str,
    ) -> DbResult<Option<String>> {
        Ok(self
            .rows
            .get(&(source, legacy_id.to_string()))
            .map(|row| row.identity_id.clone()))
    }

    async fn list_by_identity_id(&self, identity_id: &str) -> DbResult<Vec<IdentityMapRow>> {
        let mut rows: Vec<IdentityMapRow> = self
            .rows
            .iter()
            .filter(|entry| entry.identity_id == identity_id)
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.source.as_str().cmp(b.source.as_str()))
        });
        Ok(rows)
    }
}
