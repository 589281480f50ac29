//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use treffpunkt_protocol::DEFAULT_MAX_NACHRICHT_BYTES;
use treffpunkt_registry::{RegistryConfig, StoreBackend, StoreConfig};
use treffpunkt_signaling::SignalingConfig;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind-Adresse, Port, Verbindungslimit
    pub server: ServerEinstellungen,
    /// Keepalive und Send-Queues
    pub signaling: SignalingEinstellungen,
    /// Registry-Store
    pub registry: RegistryEinstellungen,
    /// CORS fuer den HTTP-Endpunkt
    pub cors: CorsEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    pub bind_adresse: String,
    /// Wird von der Umgebungsvariable `PORT` ueberschrieben
    pub port: u16,
    /// Maximale Anzahl gleichzeitiger WebSocket-Verbindungen
    pub max_verbindungen: usize,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            port: 3001,
            max_verbindungen: 10_000,
        }
    }
}

/// Signaling-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalingEinstellungen {
    pub keepalive_sek: u64,
    pub verbindungs_timeout_sek: u64,
    pub sende_queue_groesse: usize,
    pub max_nachricht_bytes: usize,
    pub ws_pfad: String,
}

impl Default for SignalingEinstellungen {
    fn default() -> Self {
        Self {
            keepalive_sek: 25,
            verbindungs_timeout_sek: 60,
            sende_queue_groesse: 256,
            max_nachricht_bytes: DEFAULT_MAX_NACHRICHT_BYTES,
            ws_pfad: "/ws".into(),
        }
    }
}

/// Registry-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryEinstellungen {
    /// "memory" oder "sqlite"
    pub backend: StoreBackend,
    /// Verbindungs-URL (nur SQLite)
    pub url: String,
    /// Maximale Verbindungspool-Groesse
    pub max_verbindungen: u32,
    pub sqlite_wal: bool,
    /// Zeitlimit je Store-Aufruf in Millisekunden
    pub timeout_ms: u64,
    pub schluessel_praefix: String,
    /// Beim Start alle Eintraege unter dem Praefix loeschen
    pub beim_start_leeren: bool,
}

impl Default for RegistryEinstellungen {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            url: "sqlite://treffpunkt.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
            timeout_ms: 2000,
            schluessel_praefix: "treffpunkt:".into(),
            beim_start_leeren: false,
        }
    }
}

/// CORS-Einstellungen
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsEinstellungen {
    /// Erlaubte Origins (leer = alle erlaubt)
    pub origins: Vec<String>,
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    /// Danach wird `PORT` aus der Umgebung angewendet.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        let mut config = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str::<Self>(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Self::default()
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
                ))
            }
        };

        config.port_ueberschreiben(std::env::var("PORT").ok().as_deref())?;
        Ok(config)
    }

    /// Wendet einen Port aus der Umgebung an
    fn port_ueberschreiben(&mut self, wert: Option<&str>) -> anyhow::Result<()> {
        if let Some(wert) = wert {
            self.server.port = wert
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("Ungueltiger PORT '{wert}': {e}"))?;
        }
        Ok(())
    }

    /// Gibt die vollstaendige Bind-Adresse zurueck
    pub fn bind_adresse(&self) -> String {
        format!("{}:{}", self.server.bind_adresse, self.server.port)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            backend: self.registry.backend,
            url: self.registry.url.clone(),
            max_verbindungen: self.registry.max_verbindungen,
            sqlite_wal: self.registry.sqlite_wal,
        }
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            schluessel_praefix: self.registry.schluessel_praefix.clone(),
            timeout: Duration::from_millis(self.registry.timeout_ms),
        }
    }

    pub fn signaling_config(&self) -> SignalingConfig {
        SignalingConfig {
            max_verbindungen: self.server.max_verbindungen,
            keepalive_sek: self.signaling.keepalive_sek,
            verbindungs_timeout_sek: self.signaling.verbindungs_timeout_sek,
            sende_queue_groesse: self.signaling.sende_queue_groesse,
            max_nachricht_bytes: self.signaling.max_nachricht_bytes,
            ws_pfad: self.signaling.ws_pfad.clone(),
            cors_origins: self.cors.origins.clone(),
        }
    }
}
