// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence layer for the Uproar agent.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, plus a volatile in-memory backend.
//! Both implement the core `RecordStore` trait; [`open_record_store`] picks
//! one from configuration.

use std::sync::Arc;

use uproar_config::model::StorageConfig;
use uproar_core::{RecordStore, UproarError};

pub mod database;
pub mod memory;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod sqlite;

pub use database::Database;
pub use memory::MemoryRecordStore;
pub use models::*;
pub use sqlite::SqliteRecordStore;

/// Build and initialize the record store named by `config.backend`.
pub async fn open_record_store(
    config: &StorageConfig,
) -> Result<Arc<dyn RecordStore>, UproarError> {
    let store: Arc<dyn RecordStore> = match config.backend.as_str() {
        "sqlite" => Arc::new(SqliteRecordStore::new(config.clone())),
        "memory" => Arc::new(MemoryRecordStore::new()),
        other => {
            return Err(UproarError::Config(format!(
                "unknown storage backend `{other}`"
            )));
        }
    };
    store.initialize().await?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn factory_builds_memory_backend() {
        let config = StorageConfig {
            backend: "memory".to_string(),
            database_path: String::new(),
            wal_mode: false,
        };
        let store = open_record_store(&config).await.unwrap();
        assert_eq!(store.name(), "memory");
    }

    #[tokio::test]
    async fn factory_builds_sqlite_backend() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("factory.db");
        let config = StorageConfig {
            backend: "sqlite".to_string(),
            database_path: db_path.to_str().unwrap().to_string(),
            wal_mode: true,
        };
        let store = open_record_store(&config).await.unwrap();
        assert_eq!(store.name(), "sqlite");
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn factory_rejects_unknown_backend() {
        let config = StorageConfig {
            backend: "postgres".to_string(),
            database_path: String::new(),
            wal_mode: false,
        };
        let result = open_record_store(&config).await;
        assert!(result.is_err());
    }
}
