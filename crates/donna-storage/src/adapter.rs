// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use donna_config::model::StorageConfig;
use donna_core::types::{Credential, Turn, UserRecord};
use donna_core::{AdapterType, DonnaError, HealthStatus, PluginAdapter, StorageAdapter};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`]
    /// is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, DonnaError> {
        self.db.get().ok_or_else(|| DonnaError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, DonnaError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DonnaError> {
        // Shutdown delegates to close if the DB was initialized.
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), DonnaError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| DonnaError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), DonnaError> {
        self.db()?.close().await
    }

    // --- User operations ---

    async fn upsert_user(&self, user: &UserRecord) -> Result<(), DonnaError> {
        queries::users::upsert_user(self.db()?, user).await
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>, DonnaError> {
        queries::users::get_user(self.db()?, user_id).await
    }

    async fn count_users(&self) -> Result<i64, DonnaError> {
        queries::users::count_users(self.db()?).await
    }

    // --- Turn operations ---

    async fn append_turns(&self, user_id: &str, turns: &[Turn]) -> Result<(), DonnaError> {
        queries::turns::append_turns(self.db()?, user_id, turns).await
    }

    async fn recent_turns(&self, user_id: &str, limit: usize) -> Result<Vec<Turn>, DonnaError> {
        queries::turns::recent_turns(self.db()?, user_id, limit).await
    }

    // --- Credential operations ---

    async fn put_credential(&self, user_id: &str, cred: &Credential) -> Result<(), DonnaError> {
        queries::credentials::put_credential(self.db()?, user_id, cred).await
    }

    async fn get_credential(&self, user_id: &str) -> Result<Option<Credential>, DonnaError> {
        queries::credentials::get_credential(self.db()?, user_id).await
    }

    async fn delete_credential(&self, user_id: &str) -> Result<(), DonnaError> {
        queries::credentials::delete_credential(self.db()?, user_id).await
    }
}
