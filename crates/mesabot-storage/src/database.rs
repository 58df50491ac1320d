// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;

use mesabot_core::MesabotError;
use tracing::debug;

/// Convert a tokio-rusqlite error into MesabotError::Storage.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> MesabotError {
    MesabotError::Storage {
        source: Box::new(e),
    }
}

fn io_err(e: std::io::Error) -> MesabotError {
    MesabotError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the single serialized SQLite connection.
///
/// Query modules accept `&Database` and go through [`Database::connection`];
/// the background thread serializes every closure, so there is never more
/// than one writer.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open the database at `path`, creating missing parent directories,
    /// then apply connection PRAGMAs and run pending migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, MesabotError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| MesabotError::Storage {
                source: Box::new(e),
            })?;

        conn.call(move |conn| {
            let pragmas = if wal_mode {
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;"
            } else {
                "PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;"
            };
            conn.execute_batch(pragmas)
                .map_err(|e| MesabotError::Storage {
                    source: Box::new(e),
                })?;
            crate::migrations::run_migrations(conn)
        })
        .await
        .map_err(|e| MesabotError::Storage {
            source: Box::new(e),
        })?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// Returns the underlying serialized connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL so the main database file is complete on disk.
    ///
    /// The connection itself is released when the `Database` is dropped.
    pub async fn close(&self) -> Result<(), MesabotError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}
