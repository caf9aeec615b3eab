//! Repository for the read-only lookup tables.

use sqlx::PgPool;

use crate::models::lookup::{LookupEntry, LookupTable};

/// Provides read access to priorities, statuses and types.
pub struct LookupRepo;

impl LookupRepo {
    /// List every entry of a lookup table ordered by id.
    pub async fn list(pool: &PgPool, table: LookupTable) -> Result<Vec<LookupEntry>, sqlx::Error> {
        let query = format!("SELECT id, name FROM {} ORDER BY id ASC", table.table_name());
        sqlx::query_as::<_, LookupEntry>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn project_priorities(pool: &PgPool) -> Result<Vec<LookupEntry>, sqlx::Error> {
        Self::list(pool, LookupTable::ProjectPriorities).await
    }
}
