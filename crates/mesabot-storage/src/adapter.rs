// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use mesabot_config::model::StorageConfig;
use mesabot_core::types::{Direction, SessionMirror};
use mesabot_core::{AdapterType, HealthStatus, MesabotError, PluginAdapter, StorageAdapter};

use crate::database::Database;
use crate::models::{StoreCounts, StoredMessage};
use crate::queries;

/// SQLite-backed record store.
///
/// Holds the [`Database`] handle behind a `OnceCell` so construction is
/// cheap and infallible; the file is opened and migrated by
/// [`StorageAdapter::initialize`]. Query logic lives in the typed
/// `queries` modules, this type only routes.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, MesabotError> {
        self.db.get().ok_or_else(|| MesabotError::Storage {
            source: "record store used before initialize()".into(),
        })
    }

    /// Row counts across all tables, for the doctor command.
    pub async fn counts(&self) -> Result<StoreCounts, MesabotError> {
        let db = self.db()?;
        Ok(StoreCounts {
            contacts: queries::contacts::count(db).await?,
            messages: queries::messages::count(db).await?,
            sessions: queries::sessions::count(db).await?,
            ratings: queries::ratings::count(db).await?,
        })
    }

    /// Transcript rows for one sender, oldest first.
    pub async fn transcript(
        &self,
        phone: &str,
        limit: Option<i64>,
    ) -> Result<Vec<StoredMessage>, MesabotError> {
        queries::messages::for_phone(self.db()?, phone, limit).await
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

    async fn health_check(&self) -> Result<HealthStatus, MesabotError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    /// Shutdown on a never-initialized store is a no-op.
    async fn shutdown(&self) -> Result<(), MesabotError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("record store shut down");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), MesabotError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| MesabotError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), MesabotError> {
        self.db()?.close().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn get_or_create_contact(&self, phone: &str) -> Result<i64, MesabotError> {
        queries::contacts::get_or_create(self.db()?, phone).await
    }

    async fn save_message(
        &self,
        phone: &str,
        direction: Direction,
        body: &str,
    ) -> Result<(), MesabotError> {
        queries::messages::save(self.db()?, phone, direction, body).await
    }

    async fn session_mirror(&self, phone: &str) -> Result<Option<SessionMirror>, MesabotError> {
        queries::sessions::get(self.db()?, phone).await
    }

    async fn upsert_session_mirror(
        &self,
        phone: &str,
        mirror: &SessionMirror,
    ) -> Result<(), MesabotError> {
        queries::sessions::upsert(self.db()?, phone, mirror).await
    }

    async fn save_rating(
        &self,
        phone: &str,
        ticket_id: Option<u64>,
        score: u8,
        label: &str,
    ) -> Result<(), MesabotError> {
        queries::ratings::save(self.db()?, phone, ticket_id, score, label).await
    }
}
