//! SQLite-Store mit WAL-Modus
//!
//! Eine einzige Tabelle `registry(key, value)`. Die atomare Bedingung von
//! `set_if_absent` liefert `INSERT ... ON CONFLICT(key) DO NOTHING`.
//!
//! Die Datei gehoert genau einem Server-Prozess. Sie haelt die Registry ueber
//! einen Neustart hinweg; Send-Queues und Relay leben nur im Prozess, darum
//! duerfen sich zwei laufende Server keine Datei teilen.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::error::StoreResult;
use crate::store::{RegistryStore, StoreBackend, StoreConfig};

/// Wartezeit auf eine gehaltene Schreibsperre
const BUSY_TIMEOUT: Duration = Duration::from_secs(1);

/// Persistenter Store auf einem SQLite-Pool
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pub(crate) pool: SqlitePool,
}

impl SqliteStore {
    /// Erstellt einen neuen Pool, fuehrt Migrationen aus
    pub async fn oeffnen(config: &StoreConfig) -> StoreResult<Self> {
        let opts = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(if config.sqlite_wal {
                SqliteJournalMode::Wal
            } else {
                SqliteJournalMode::Delete
            })
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_verbindungen)
            .connect_with(opts)
            .await?;

        info!(url = %config.url, wal = config.sqlite_wal, "SQLite-Pool geoeffnet");

        let store = Self { pool };
        store.migrationen_ausfuehren().await?;
        Ok(store)
    }

    /// Fuehrt alle ausstehenden Migrationen aus
    pub async fn migrationen_ausfuehren(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Registry-Migrationen abgeschlossen");
        Ok(())
    }

    /// Gibt den internen Pool zurueck (fuer Tests)
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Erstellt eine In-Memory-Datenbank fuer Tests
    pub async fn in_memory() -> StoreResult<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            // In-Memory benoetigt mindestens 1 persistente Verbindung
            .min_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrationen_ausfuehren().await?;
        Ok(store)
    }
}

#[async_trait]
impl RegistryStore for SqliteStore {
    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let treffer = sqlx::query_scalar::<_, i64>("SELECT 1 FROM registry WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(treffer.is_some())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let wert = sqlx::query_scalar::<_, String>("SELECT value FROM registry WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(wert)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO registry (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "INSERT INTO registry (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO NOTHING",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM registry WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_prefix(&self, prefix: &str) -> StoreResult<u64> {
        // substr statt LIKE, damit '%' und '_' im Praefix keine Platzhalter sind
        let result = sqlx::query("DELETE FROM registry WHERE substr(key, 1, length(?)) = ?")
            .bind(prefix)
            .bind(prefix)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Sqlite
    }
}
