//! treffpunkt-server – Bibliotheks-Root
//!
//! Deklariert die Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use treffpunkt_observability::TreffpunktMetrics;
use treffpunkt_registry::{store_oeffnen, RendezvousRegistry};
use treffpunkt_signaling::{SignalingServer, SignalingState};

use config::ServerConfig;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Oeffnet den Registry-Store und baut den gemeinsamen Zustand
    ///
    /// Ist der Store nicht erreichbar, startet der Server nicht.
    pub async fn vorbereiten(&self) -> Result<Arc<SignalingState>> {
        let store_config = self.config.store_config();
        let store = store_oeffnen(&store_config)
            .await
            .with_context(|| format!("Registry-Store ({}) nicht verfuegbar", store_config.backend))?;

        let registry = RendezvousRegistry::neu(store, self.config.registry_config());
        registry
            .erreichbar_pruefen()
            .await
            .context("Registry-Store antwortet nicht")?;

        // Leert den ganzen Praefix, der Store gehoert nur diesem Prozess
        if self.config.registry.beim_start_leeren {
            let geloescht = registry
                .clear()
                .await
                .context("Registry konnte nicht geleert werden")?;
            tracing::info!(geloescht, "Registry beim Start geleert");
        }

        let metriken = TreffpunktMetrics::neu()?;
        Ok(SignalingState::neu(
            self.config.signaling_config(),
            registry,
            metriken,
        ))
    }

    /// Startet den Server und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Registry-Store oeffnen und pruefen
    /// 2. Listener binden
    /// 3. Auf Ctrl-C / SIGTERM warten, dann geordnet herunterfahren
    pub async fn starten(self) -> Result<()> {
        let state = self.vorbereiten().await?;

        let adresse = self.config.bind_adresse();
        let listener = TcpListener::bind(&adresse)
            .await
            .with_context(|| format!("Bind auf {adresse} fehlgeschlagen"))?;

        tracing::info!(
            adresse = %adresse,
            backend = %self.config.registry.backend,
            "Server startet"
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
            let _ = shutdown_tx.send(true);
        });

        SignalingServer::neu(state)
            .starten(listener, shutdown_rx)
            .await?;
        Ok(())
    }
}

/// Wartet auf Ctrl-C oder (unter Unix) SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(fehler = %e, "Ctrl-C-Handler konnte nicht installiert werden");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(fehler = %e, "SIGTERM-Handler konnte nicht installiert werden");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = sigterm => {}
    }
}
