use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::{
    db::{common::parse_source, error::DbResult, repos::IdentityMapRepo},
    models::{IdentityMapRow, IdentitySource},
};

pub struct PostgresIdentityMapRepo {
    write_pool: PgPool,
    read_pool: PgPool,
}

impl PostgresIdentityMapRepo {
    pub fn new(write_pool: PgPool, read_pool: Option<PgPool>) -> Self {
        let read_pool = read_pool.unwrap_or_else(|| write_pool.clone());
        Self {
            write_pool,
            read_pool,
        }
    }

    fn parse_row(row: &sqlx::postgres::PgRow) -> DbResult<IdentityMapRow> {
        Ok(IdentityMapRow {
            source: parse_source(&row.get::<String, _>("source"))?,
            legacy_id: row.get("legacy_id"),
            identity_id: row.get("identity_id"),
            created_at: row.get("created_at"),
        })
    }
}

#[async_trait]
impl IdentityMapRepo for PostgresIdentityMapRepo {
    async fn insert_if_absent(
        &self,
        source: IdentitySource,
        legacy_id: &str,
        identity_id: &str,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO identity_map (source, legacy_id, identity_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (source, legacy_id) DO NOTHING
            "#,
        )
        .bind(source.as_str())
        .bind(legacy_id)
        .bind(identity_id)
        .bind(chrono::Utc::now())
        .execute(&self.write_pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_identity_id(
        &self,
        source: IdentitySource,
        legacy_id: &str,
    ) -> DbResult<Option<String>> {
        // Read-back after a conflicting insert; a lagging replica could miss the row.
        let identity_id = sqlx::query_scalar::<_, String>(
            "SELECT identity_id FROM identity_map WHERE source = $1 AND legacy_id = $2",
        )
        .bind(source.as_str())
        .bind(legacy_id)
        .fetch_optional(&self.write_pool)
        .await?;

        Ok(identity_id)
    }

    async fn list_by_identity_id(&self, identity_id: &str) -> DbResult<Vec<IdentityMapRow>> {
        let rows = sqlx::query(
            r#"
            SELECT source, legacy_id, identity_id, created_at
            FROM identity_map
            WHERE identity_id = $1
            ORDER BY created_at ASC, source ASC
            "#,
        )
        .bind(identity_id)
        .fetch_all(&self.read_pool)
        .await?;

        rows.iter().map(Self::parse_row).collect()
    }
}
