// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Async SQLite connection management.
//!
//! All access runs through `tokio-rusqlite`, which executes closures on a
//! single background thread. The [`Database`] struct is the single writer:
//! query modules accept `&Database` and go through [`Database::connection`],
//! so concurrent callers serialize on that one thread and SQLITE_BUSY never
//! surfaces under normal operation.

use std::path::Path;

use tokio_rusqlite::Connection;
use tracing::debug;

use uproar_core::UproarError;

/// Handle to the single SQLite connection.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Open (or create) the database at `path` and run pending migrations.
    ///
    /// Missing parent directories are created first. With `wal_mode` set,
    /// the journal switches to write-ahead logging before migrations run.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, UproarError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| UproarError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        let connection = Connection::open(path.to_string())
            .await
            .map_err(|e| map_tr_err(e.into()))?;

        let pragmas = if wal_mode {
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA busy_timeout=5000;
             PRAGMA foreign_keys=ON;"
        } else {
            "PRAGMA synchronous=NORMAL;
             PRAGMA busy_timeout=5000;
             PRAGMA foreign_keys=ON;"
        };
        connection
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch(pragmas)?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        connection
            .call(|conn| crate::migrations::run_migrations(conn))
            .await
            .map_err(|e| UproarError::Storage {
                source: Box::new(e),
            })?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { connection })
    }

    /// Returns the underlying async connection handle.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Checkpoint the WAL and flush pending writes.
    ///
    /// The connection itself stays usable; the background thread shuts down
    /// when the last handle is dropped.
    pub async fn close(&self) -> Result<(), UproarError> {
        self.connection
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Map a tokio-rusqlite error into the storage error variant.
pub(crate) fn map_tr_err(err: tokio_rusqlite::Error<rusqlite::Error>) -> UproarError {
    UproarError::Storage {
        source: Box::new(err),
    }
}
