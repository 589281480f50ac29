//! Gemeinsamer Server-Zustand fuer den Signaling-Service
//!
//! Haelt Registry, Router und Metriken, die sicher zwischen den
//! Verbindungs-Tasks geteilt werden.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::TaskTracker;
use treffpunkt_observability::TreffpunktMetrics;
use treffpunkt_protocol::DEFAULT_MAX_NACHRICHT_BYTES;
use treffpunkt_registry::RendezvousRegistry;

use crate::router::{ConnectionRouter, SEND_QUEUE_GROESSE};

/// Konfiguration fuer den Signaling-Service
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Maximale gleichzeitige WebSocket-Verbindungen
    pub max_verbindungen: usize,
    /// Ping-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Ohne Empfang laenger als das wird die Verbindung getrennt
    pub verbindungs_timeout_sek: u64,
    /// Groesse der Send-Queue pro Verbindung
    pub sende_queue_groesse: usize,
    /// Maximale Groesse einer eingehenden Nachricht
    pub max_nachricht_bytes: usize,
    /// Pfad des WebSocket-Endpunkts
    pub ws_pfad: String,
    /// CORS-Origins (leer = alle erlaubt)
    pub cors_origins: Vec<String>,
}

impl SignalingConfig {
    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_sek)
    }

    pub fn verbindungs_timeout(&self) -> Duration {
        Duration::from_secs(self.verbindungs_timeout_sek)
    }
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            max_verbindungen: 10_000,
            keepalive_sek: 25,
            verbindungs_timeout_sek: 60,
            sende_queue_groesse: SEND_QUEUE_GROESSE,
            max_nachricht_bytes: DEFAULT_MAX_NACHRICHT_BYTES,
            ws_pfad: "/ws".to_string(),
            cors_origins: vec![],
        }
    }
}

/// Gemeinsamer Server-Zustand (Arc-geteilt)
pub struct SignalingState {
    /// Signaling-Konfiguration
    pub config: Arc<SignalingConfig>,
    /// Host-Registry (Store-Backend egal)
    pub registry: RendezvousRegistry,
    /// Send-Queues aller lebenden Verbindungen
    pub router: ConnectionRouter,
    /// Prometheus-Metriken
    pub metriken: TreffpunktMetrics,
    /// Laufende Verbindungs-Tasks, beim Herunterfahren wird auf sie gewartet
    pub verbindungs_tasks: TaskTracker,
}

impl SignalingState {
    pub fn neu(
        config: SignalingConfig,
        registry: RendezvousRegistry,
        metriken: TreffpunktMetrics,
    ) -> Arc<Self> {
        let router = ConnectionRouter::neu(config.sende_queue_groesse);
        Arc::new(Self {
            config: Arc::new(config),
            registry,
            router,
            metriken,
            verbindungs_tasks: TaskTracker::new(),
        })
    }
}
