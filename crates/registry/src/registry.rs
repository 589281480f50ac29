//! Rendezvous-Registry – Host-Kennungen auf Verbindungen abbilden
//!
//! Pro Host liegen zwei Schluessel im Store:
//! - `{praefix}host:{host_id}` -> `{"connectionId": ..., "secret": ...}`
//! - `{praefix}conn:{connection_id}` -> `host_id`
//!
//! Beide werden gemeinsam angelegt und gemeinsam entfernt. Es gibt kein TTL:
//! ein Host ist genau so lange online, wie seine Verbindung offen ist.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use treffpunkt_core::{ConnectionId, HostId};

use crate::error::{StoreError, StoreResult};
use crate::store::RegistryStore;

/// Schluessel, den `erreichbar_pruefen` abfragt
const PRUEF_SCHLUESSEL: &str = "__erreichbar";

// ---------------------------------------------------------------------------
// Typen
// ---------------------------------------------------------------------------

/// Ein aktuell angemeldeter Host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRecord {
    pub host_id: HostId,
    pub connection_id: ConnectionId,
    pub secret: String,
}

/// Gespeicherte Form unter dem Vorwaertsschluessel
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GespeicherterHost {
    connection_id: ConnectionId,
    secret: String,
}

/// Ergebnis von `try_register`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrierErgebnis {
    /// Host-Eintrag und Rueckwaertsindex angelegt
    Registriert,
    /// Kennung ist bereits vergeben, nichts veraendert
    BereitsVergeben,
    /// Diese Verbindung ist bereits als Host angemeldet, nichts veraendert
    VerbindungBelegt,
}

/// Ergebnis von `release_by_connection`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreigabeErgebnis {
    /// Host-Kennung wurde freigegeben
    Freigegeben(HostId),
    /// Verbindung war kein Host (z.B. ein Client)
    KeinHost,
}

/// Einstellungen der Registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Praefix fuer alle Schluessel im Store
    pub schluessel_praefix: String,
    /// Zeitlimit je Store-Aufruf
    pub timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            schluessel_praefix: "treffpunkt:".into(),
            timeout: Duration::from_millis(2000),
        }
    }
}

// ---------------------------------------------------------------------------
// RendezvousRegistry
// ---------------------------------------------------------------------------

/// Registry ueber einem beliebigen `RegistryStore`
///
/// Clone teilt den Store.
#[derive(Clone)]
pub struct RendezvousRegistry {
    store: Arc<dyn RegistryStore>,
    config: RegistryConfig,
}

impl RendezvousRegistry {
    pub fn neu(store: Arc<dyn RegistryStore>, config: RegistryConfig) -> Self {
        Self { store, config }
    }

    /// Der darunterliegende Store
    pub fn store(&self) -> &Arc<dyn RegistryStore> {
        &self.store
    }

    fn host_schluessel(&self, host_id: &HostId) -> String {
        format!("{}host:{}", self.config.schluessel_praefix, host_id)
    }

    fn conn_schluessel(&self, connection_id: ConnectionId) -> String {
        format!("{}conn:{}", self.config.schluessel_praefix, connection_id)
    }

    /// Fuehrt einen Store-Aufruf mit Zeitlimit aus
    async fn aufruf<T>(&self, fut: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        tokio::time::timeout(self.config.timeout, fut)
            .await
            .map_err(|_| StoreError::Timeout(self.config.timeout))?
    }

    /// Meldet einen Host exklusiv an
    ///
    /// Zuerst wird der Rueckwaertsindex mit `set_if_absent` belegt: eine
    /// Verbindung, die schon Host ist, beruehrt so nie eine fremde Kennung.
    /// Danach der Vorwaertsschluessel, ebenfalls mit `set_if_absent`, es kann
    /// also hoechstens eine gleichzeitige Anmeldung pro Kennung gewinnen.
    /// Scheitert dieser, wird der Rueckwaertsindex wieder entfernt.
    pub async fn try_register(
        &self,
        host_id: &HostId,
        connection_id: ConnectionId,
        secret: &str,
    ) -> StoreResult<RegistrierErgebnis> {
        let host_key = self.host_schluessel(host_id);
        let conn_key = self.conn_schluessel(connection_id);
        let wert = serde_json::to_string(&GespeicherterHost {
            connection_id,
            secret: secret.to_string(),
        })?;

        if !self
            .aufruf(self.store.set_if_absent(&conn_key, host_id.as_str()))
            .await?
        {
            return Ok(RegistrierErgebnis::VerbindungBelegt);
        }

        match self.aufruf(self.store.set_if_absent(&host_key, &wert)).await {
            Ok(true) => {
                tracing::debug!(host_id = %host_id, connection = %connection_id, "Host eingetragen");
                Ok(RegistrierErgebnis::Registriert)
            }
            Ok(false) => {
                self.zurueckrollen(&conn_key, connection_id).await;
                Ok(RegistrierErgebnis::BereitsVergeben)
            }
            Err(e) => {
                self.zurueckrollen(&conn_key, connection_id).await;
                Err(e)
            }
        }
    }

    async fn zurueckrollen(&self, conn_key: &str, connection_id: ConnectionId) {
        if let Err(e) = self.aufruf(self.store.delete(conn_key)).await {
            tracing::error!(
                connection = %connection_id,
                fehler = %e,
                "Rueckrollen des Rueckwaertsindex fehlgeschlagen"
            );
        }
    }

    /// Liest den Host-Eintrag zu einer Kennung
    pub async fn lookup(&self, host_id: &HostId) -> StoreResult<Option<HostRecord>> {
        let wert = self.aufruf(self.store.get(&self.host_schluessel(host_id))).await?;
        let Some(wert) = wert else {
            return Ok(None);
        };

        let gespeichert: GespeicherterHost = serde_json::from_str(&wert)?;
        Ok(Some(HostRecord {
            host_id: host_id.clone(),
            connection_id: gespeichert.connection_id,
            secret: gespeichert.secret,
        }))
    }

    /// Entfernt den Host, den diese Verbindung vertritt
    ///
    /// Ohne Rueckwaertsindex war die Verbindung kein Host; dann wird nichts
    /// veraendert.
    pub async fn release_by_connection(
        &self,
        connection_id: ConnectionId,
    ) -> StoreResult<FreigabeErgebnis> {
        let conn_key = self.conn_schluessel(connection_id);
        let Some(host_id) = self.aufruf(self.store.get(&conn_key)).await? else {
            return Ok(FreigabeErgebnis::KeinHost);
        };
        let host_id = HostId::from(host_id);

        // Nur loeschen wenn der Eintrag noch auf diese Verbindung zeigt
        match self.lookup(&host_id).await {
            Ok(Some(record)) if record.connection_id == connection_id => {
                self.aufruf(self.store.delete(&self.host_schluessel(&host_id)))
                    .await?;
            }
            Ok(_) => {
                tracing::warn!(
                    host_id = %host_id,
                    connection = %connection_id,
                    "Rueckwaertsindex ohne passenden Host-Eintrag"
                );
            }
            // Kaputter Datensatz: trotzdem entfernen, sonst bleibt die Kennung blockiert
            Err(StoreError::Json(e)) => {
                tracing::warn!(host_id = %host_id, fehler = %e, "Host-Eintrag nicht lesbar");
                self.aufruf(self.store.delete(&self.host_schluessel(&host_id)))
                    .await?;
            }
            Err(e) => return Err(e),
        }

        self.aufruf(self.store.delete(&conn_key)).await?;
        Ok(FreigabeErgebnis::Freigegeben(host_id))
    }

    /// Entfernt alle Registry-Eintraege (nur beim Start sinnvoll)
    pub async fn clear(&self) -> StoreResult<u64> {
        self.aufruf(self.store.clear_prefix(&self.config.schluessel_praefix))
            .await
    }

    /// Ein Round-Trip zum Store, um die Erreichbarkeit zu pruefen
    pub async fn erreichbar_pruefen(&self) -> StoreResult<()> {
        let key = format!("{}{}", self.config.schluessel_praefix, PRUEF_SCHLUESSEL);
        self.aufruf(self.store.exists(&key)).await?;
        Ok(())
    }
}
