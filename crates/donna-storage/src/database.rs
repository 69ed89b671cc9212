// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database handle: connection lifecycle, pragmas, and migration bootstrap.
//!
//! A single `tokio-rusqlite` connection serializes all writes, which is what
//! makes per-round batch appends atomic without explicit locking above the
//! storage layer.

use tokio_rusqlite::Connection;
use tracing::debug;

use donna_core::DonnaError;

/// An open SQLite database with migrations applied.
pub struct Database {
    conn: Connection,
}

/// Map a `tokio_rusqlite` error into the workspace error type.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> DonnaError {
    DonnaError::Storage {
        source: Box::new(e),
    }
}

impl Database {
    /// Open (creating if necessary) the database at `path` and run migrations.
    ///
    /// Parent directories are created as needed. `wal_mode` controls the
    /// journal mode pragma; WAL is strongly recommended for concurrent reads.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, DonnaError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| DonnaError::Storage {
                source: Box::new(e),
            })?;
        }

        // `Connection::open` fails with a plain rusqlite error, before any
        // closure channel exists.
        let conn = Connection::open(path).await.map_err(|e| DonnaError::Storage {
            source: Box::new(e),
        })?;

        let journal_mode = if wal_mode { "WAL" } else { "DELETE" };
        let pragmas = format!(
            "PRAGMA journal_mode = {journal_mode};
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;"
        );
        conn.call(move |conn| {
            conn.execute_batch(&pragmas)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        // The migration runner reports its own error type; let it flow
        // through the closure's generic error channel and unwrap it here.
        conn.call(|conn| crate::migrations::run_migrations(conn))
            .await
            .map_err(|e| match e {
                tokio_rusqlite::Error::Error(migration) => migration,
                closed => DonnaError::Storage {
                    source: Box::new(closed),
                },
            })?;

        debug!(path, wal_mode, "database opened, migrations applied");
        Ok(Self { conn })
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(&self) -> Result<(), DonnaError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}
