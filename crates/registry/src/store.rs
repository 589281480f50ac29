//! Store-Trait und Backend-Auswahl
//!
//! Der Store ist eine reine Schluessel/Wert-Abbildung. Jede Operation ist ein
//! einzelner Round-Trip und kann fehlschlagen. `set_if_absent` ist die
//! atomare Bedingungs-Schreiboperation, auf der die exklusive Registrierung
//! aufbaut; ein `exists` gefolgt von `set` reicht dafuer nicht.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::StoreResult;
use crate::memory::MemoryStore;
use crate::sqlite::SqliteStore;

/// Unterstuetzte Store-Backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Fluechtig, nur innerhalb eines Prozesses
    Memory,
    /// SQLite-Datei eines Prozesses, uebersteht Neustarts
    Sqlite,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "Memory"),
            Self::Sqlite => write!(f, "SQLite"),
        }
    }
}

/// Konfiguration fuer die Store-Verbindung
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Ausgewaehltes Backend
    pub backend: StoreBackend,
    /// Verbindungs-URL (nur SQLite, z.B. "sqlite://treffpunkt.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus bei SQLite aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            url: "sqlite://treffpunkt.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

/// Schluessel/Wert-Store unter der Registry
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Prueft ob ein Schluessel existiert
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Liest einen Wert
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Schreibt einen Wert (ueberschreibt)
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Schreibt nur wenn der Schluessel fehlt. `true` = geschrieben.
    async fn set_if_absent(&self, key: &str, value: &str) -> StoreResult<bool>;

    /// Loescht einen Schluessel. `true` = war vorhanden.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Loescht alle Schluessel mit dem Praefix, gibt die Anzahl zurueck
    async fn clear_prefix(&self, prefix: &str) -> StoreResult<u64>;

    /// Welches Backend dahinter steckt (fuer Logs und Health)
    fn backend(&self) -> StoreBackend;
}

/// Oeffnet den konfigurierten Store
pub async fn store_oeffnen(config: &StoreConfig) -> StoreResult<Arc<dyn RegistryStore>> {
    let store: Arc<dyn RegistryStore> = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::neu()),
        StoreBackend::Sqlite => Arc::new(SqliteStore::oeffnen(config).await?),
    };
    tracing::info!(backend = %config.backend, "Registry-Store geoeffnet");
    Ok(store)
}
