//! Client-Connection – Verwaltet eine einzelne WebSocket-Verbindung
//!
//! Jede Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task. Der Task liest Text-Frames, reicht sie an den Dispatcher und
//! schreibt Antworten sowie alles aus der eigenen Send-Queue zurueck.
//!
//! ## Keepalive
//! - Server sendet alle `keepalive_sek` einen Ping
//! - Kommt laenger als `verbindungs_timeout_sek` nichts an, wird getrennt
//!
//! Das Aufraeumen (Registry-Freigabe) laeuft genau einmal, egal wie die
//! Verbindung endet.

use axum::extract::ws::{Message, WebSocket};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;
use treffpunkt_core::ConnectionId;
use treffpunkt_protocol::{nachricht_dekodieren, nachricht_kodieren, ServerNachricht};

use crate::dispatcher::{DispatcherContext, MessageDispatcher};
use crate::error::{SignalingError, SignalingResult};
use crate::server_state::SignalingState;

/// Verarbeitet eine einzelne WebSocket-Verbindung
pub struct ClientConnection {
    state: Arc<SignalingState>,
    peer_addr: SocketAddr,
    connection_id: ConnectionId,
}

impl ClientConnection {
    pub fn neu(state: Arc<SignalingState>, peer_addr: SocketAddr) -> Self {
        Self {
            state,
            peer_addr,
            connection_id: ConnectionId::new(),
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Laeuft bis die Verbindung getrennt wird, der Timeout greift oder ein
    /// Shutdown-Signal eingeht.
    pub async fn verarbeiten(self, mut socket: WebSocket, mut shutdown_rx: watch::Receiver<bool>) {
        let peer_addr = self.peer_addr;
        let connection_id = self.connection_id;
        let keepalive_intervall = self.state.config.keepalive();
        let timeout_dauer = self.state.config.verbindungs_timeout();

        let mut sende_rx = self.state.router.verbindung_registrieren(connection_id);
        self.state.metriken.connections.inc();
        tracing::info!(peer = %peer_addr, connection = %connection_id, "Neue Verbindung");

        let dispatcher = MessageDispatcher::neu(Arc::clone(&self.state));
        let mut ctx = DispatcherContext::neu(connection_id);

        let mut letzter_empfang = Instant::now();
        let mut naechster_ping = Instant::now() + keepalive_intervall;

        loop {
            let frist = (letzter_empfang + timeout_dauer).min(naechster_ping);

            tokio::select! {
                // Eingehender Frame
                frame = socket.recv() => {
                    let nachricht = match frame {
                        Some(Ok(n)) => n,
                        Some(Err(e)) => {
                            tracing::warn!(connection = %connection_id, fehler = %e, "WebSocket-Lesefehler");
                            break;
                        }
                        None => {
                            tracing::info!(connection = %connection_id, "Verbindung vom Client getrennt");
                            break;
                        }
                    };
                    letzter_empfang = Instant::now();

                    match nachricht {
                        Message::Text(text) => {
                            let Some(antwort) = self.text_verarbeiten(&text, &dispatcher, &mut ctx).await else {
                                continue;
                            };
                            if let Err(e) = senden(&mut socket, &antwort).await {
                                tracing::warn!(connection = %connection_id, fehler = %e, "Senden fehlgeschlagen");
                                break;
                            }
                        }
                        Message::Binary(daten) => {
                            tracing::warn!(
                                connection = %connection_id,
                                bytes = daten.len(),
                                "Binaer-Frame ignoriert"
                            );
                        }
                        // Pong beantwortet axum selbst
                        Message::Ping(_) | Message::Pong(_) => {}
                        Message::Close(_) => {
                            tracing::info!(connection = %connection_id, "Close-Frame empfangen");
                            break;
                        }
                    }
                }

                // Ausgehende Nachricht aus dem Router
                Some(ausgehend) = sende_rx.recv() => {
                    if let Err(e) = senden(&mut socket, &ausgehend).await {
                        tracing::warn!(connection = %connection_id, fehler = %e, "Weiterleitung fehlgeschlagen");
                        break;
                    }
                }

                // Keepalive und Timeout
                _ = tokio::time::sleep_until(frist) => {
                    let jetzt = Instant::now();
                    if jetzt.duration_since(letzter_empfang) >= timeout_dauer {
                        tracing::warn!(peer = %peer_addr, connection = %connection_id, "Verbindungs-Timeout");
                        break;
                    }
                    if jetzt >= naechster_ping {
                        if let Err(e) = socket.send(Message::Ping(Vec::new())).await {
                            tracing::warn!(connection = %connection_id, fehler = %e, "Ping-Senden fehlgeschlagen");
                            break;
                        }
                        naechster_ping = jetzt + keepalive_intervall;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(connection = %connection_id, "Shutdown-Signal – Verbindung wird getrennt");
                        let _ = socket.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }

        dispatcher.verbindung_geschlossen(&mut ctx).await;
        self.state.metriken.connections.dec();
        tracing::info!(peer = %peer_addr, connection = %connection_id, "Verbindungs-Task beendet");
    }

    /// Dekodiert einen Text-Frame und dispatcht ihn
    ///
    /// Kaputte oder unbekannte Nachrichten werden protokolliert und verworfen,
    /// die Verbindung bleibt offen.
    async fn text_verarbeiten(
        &self,
        text: &str,
        dispatcher: &MessageDispatcher,
        ctx: &mut DispatcherContext,
    ) -> Option<ServerNachricht> {
        let max = self.state.config.max_nachricht_bytes;
        if text.len() > max {
            tracing::warn!(
                connection = %ctx.connection_id,
                bytes = text.len(),
                max,
                "Nachricht zu gross – ignoriert"
            );
            return None;
        }

        match nachricht_dekodieren(text) {
            Ok(nachricht) => dispatcher.dispatch(nachricht, ctx).await,
            Err(e) => {
                tracing::warn!(connection = %ctx.connection_id, fehler = %e, "Ungueltige Nachricht ignoriert");
                None
            }
        }
    }
}

/// Kodiert eine Nachricht und schreibt sie als Text-Frame
async fn senden(socket: &mut WebSocket, nachricht: &ServerNachricht) -> SignalingResult<()> {
    let text = nachricht_kodieren(nachricht)?;
    socket
        .send(Message::Text(text))
        .await
        .map_err(|_| SignalingError::VerbindungGetrennt)
}
