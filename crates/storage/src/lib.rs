//! SeaORM-backed storage adapter that satisfies the domain storage traits
//! while keeping the database backend swappable (SQLite by default,
//! PostgreSQL via feature flag).

mod entity;
mod migration;
mod payout_store;
mod repair_store;
mod user_store;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use migration::run_migrations;
use ratedesk_domain::storage::{StorageError, StorageResult};
use sea_orm::{Database, DatabaseConnection};

/// Shared storage handle used by operator-facing routers. Cloning is cheap;
/// all clones share one connection pool.
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmStorage {
    /// Connects to the provided database URL and ensures the schema is
    /// present.
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        let db = Database::connect(database_url)
            .await
            .map_err(StorageError::from_source)?;
        run_migrations(&db).await?;
        Ok(Self { db: Arc::new(db) })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }
}
