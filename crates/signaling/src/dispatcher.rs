//! Message-Dispatcher – Routet Client-Nachrichten an die richtigen Handler
//!
//! Der Dispatcher empfaengt dekodierte Nachrichten einer Verbindung, ruft
//! den passenden Handler auf und gibt die Antwort an den Absender zurueck.
//!
//! ## Verbindungszustand
//! - `Ungebunden`: frisch verbunden oder reiner Client
//! - `HostGebunden`: hat erfolgreich eine Host-Kennung angemeldet
//! - `Geschlossen`: Aufraeumen erledigt, keine Nachrichten mehr
//!
//! Ein Client-Request veraendert den Zustand nie.

use std::sync::Arc;
use std::time::Duration;
use treffpunkt_core::{ConnectionId, HostId};
use treffpunkt_protocol::{ClientNachricht, ServerNachricht};
use treffpunkt_registry::FreigabeErgebnis;

use crate::handlers::{client_handler, host_handler, relay_handler, store_fehler_melden};
use crate::server_state::SignalingState;

/// Versuche fuer die Freigabe beim Schliessen
const FREIGABE_VERSUCHE: u32 = 3;
const FREIGABE_PAUSE: Duration = Duration::from_millis(100);

/// Rolle einer Verbindung im Rendezvous
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerbindungsZustand {
    Ungebunden,
    HostGebunden(HostId),
    Geschlossen,
}

/// Dispatcher-Kontext – Informationen ueber die aktuelle Verbindung
#[derive(Debug)]
pub struct DispatcherContext {
    pub connection_id: ConnectionId,
    pub zustand: VerbindungsZustand,
}

impl DispatcherContext {
    pub fn neu(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            zustand: VerbindungsZustand::Ungebunden,
        }
    }

    /// Die Host-Kennung, falls diese Verbindung ein Host ist
    pub fn host_id(&self) -> Option<&HostId> {
        match &self.zustand {
            VerbindungsZustand::HostGebunden(id) => Some(id),
            _ => None,
        }
    }
}

/// Zentraler Message-Dispatcher
pub struct MessageDispatcher {
    state: Arc<SignalingState>,
}

impl MessageDispatcher {
    pub fn neu(state: Arc<SignalingState>) -> Self {
        Self { state }
    }

    /// Verarbeitet eine eingehende Nachricht und gibt die Antwort zurueck
    ///
    /// `None` wenn der Absender nichts zurueckbekommt (Relay).
    pub async fn dispatch(
        &self,
        nachricht: ClientNachricht,
        ctx: &mut DispatcherContext,
    ) -> Option<ServerNachricht> {
        if ctx.zustand == VerbindungsZustand::Geschlossen {
            tracing::debug!(connection = %ctx.connection_id, "Nachricht nach dem Schliessen ignoriert");
            return None;
        }

        match nachricht {
            ClientNachricht::HostRegister(anfrage) => {
                Some(host_handler::handle_host_register(anfrage, ctx, &self.state).await)
            }
            ClientNachricht::ClientRequestConnect(anfrage) => {
                Some(client_handler::handle_connect_request(anfrage, ctx, &self.state).await)
            }
            ClientNachricht::Relay(anfrage) => {
                relay_handler::handle_relay(anfrage, ctx, &self.state);
                None
            }
        }
    }

    /// Raeumt nach dem Schliessen einer Verbindung auf
    ///
    /// Entfernt die Send-Queue und gibt eine gehaltene Host-Kennung frei.
    /// Mehrfacher Aufruf ist wirkungslos.
    pub async fn verbindung_geschlossen(&self, ctx: &mut DispatcherContext) {
        if ctx.zustand == VerbindungsZustand::Geschlossen {
            return;
        }
        self.state.router.verbindung_entfernen(&ctx.connection_id);

        // Auch ungebundene Verbindungen fragen, der Store ist die Wahrheit
        for versuch in 1..=FREIGABE_VERSUCHE {
            match self
                .state
                .registry
                .release_by_connection(ctx.connection_id)
                .await
            {
                Ok(FreigabeErgebnis::Freigegeben(host_id)) => {
                    self.state.metriken.store_status_setzen(true);
                    tracing::info!(host_id = %host_id, connection = %ctx.connection_id, "Host abgemeldet");
                    break;
                }
                Ok(FreigabeErgebnis::KeinHost) => {
                    self.state.metriken.store_status_setzen(true);
                    break;
                }
                Err(e) => {
                    store_fehler_melden(&self.state, "release_by_connection", &e);
                    if versuch == FREIGABE_VERSUCHE {
                        tracing::error!(
                            connection = %ctx.connection_id,
                            host_id = ?ctx.host_id(),
                            "Host-Kennung konnte nicht freigegeben werden"
                        );
                    } else {
                        tokio::time::sleep(FREIGABE_PAUSE * versuch).await;
                    }
                }
            }
        }

        // Der Host ist offline, auch wenn die Freigabe scheiterte
        if ctx.host_id().is_some() {
            self.state.metriken.hosts_registered.dec();
        }
        ctx.zustand = VerbindungsZustand::Geschlossen;
    }
}
