//! In-Memory-Store auf Basis von DashMap
//!
//! `set_if_absent` haelt ueber die Entry-API die Shard-Sperre zwischen Pruefen
//! und Einfuegen. Verschiedene Schluessel liegen meist in verschiedenen
//! Shards und blockieren sich nicht.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use crate::error::StoreResult;
use crate::store::{RegistryStore, StoreBackend};

/// Fluechtiger Store fuer Einzelprozess-Betrieb
///
/// Clone teilt den inneren Zustand.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    eintraege: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Anzahl gespeicherter Schluessel
    pub fn anzahl(&self) -> usize {
        self.eintraege.len()
    }
}

#[async_trait]
impl RegistryStore for MemoryStore {
    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.eintraege.contains_key(key))
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.eintraege.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.eintraege.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> StoreResult<bool> {
        match self.eintraege.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(frei) => {
                frei.insert(value.to_string());
                Ok(true)
            }
        }
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        Ok(self.eintraege.remove(key).is_some())
    }

    async fn clear_prefix(&self, prefix: &str) -> StoreResult<u64> {
        let schluessel: Vec<String> = self
            .eintraege
            .iter()
            .filter(|e| e.key().starts_with(prefix))
            .map(|e| e.key().clone())
            .collect();

        let mut geloescht = 0;
        for key in schluessel {
            if self.eintraege.remove(&key).is_some() {
                geloescht += 1;
            }
        }
        Ok(geloescht)
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clone_teilt_zustand() {
        let a = MemoryStore::neu();
        let b = a.clone();
        a.set("k", "v").await.unwrap();
        assert_eq!(b.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(b.anzahl(), 1);
    }

    #[tokio::test]
    async fn set_if_absent_ueberschreibt_nicht() {
        let store = MemoryStore::neu();
        assert!(store.set_if_absent("k", "erst").await.unwrap());
        assert!(!store.set_if_absent("k", "zweit").await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("erst"));
    }
}
