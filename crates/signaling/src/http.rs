//! HTTP-Listener – WebSocket-Endpunkt, Health und Metriken
//!
//! Der `SignalingServer` baut den axum-Router und startet fuer jede
//! WebSocket-Verbindung eine eigene `ClientConnection`.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use treffpunkt_observability::{health_router, metrics_router, HealthState};

use crate::connection::ClientConnection;
use crate::error::SignalingResult;
use crate::server_state::SignalingState;

/// Zustand des WebSocket-Handlers
#[derive(Clone)]
struct WsState {
    signaling: Arc<SignalingState>,
    shutdown_rx: watch::Receiver<bool>,
}

/// WebSocket-Signaling-Server
pub struct SignalingServer {
    state: Arc<SignalingState>,
}

impl SignalingServer {
    pub fn neu(state: Arc<SignalingState>) -> Self {
        Self { state }
    }

    /// Baut den vollstaendigen Router (WebSocket, `/health`, `/metrics`)
    pub fn router(&self, shutdown_rx: watch::Receiver<bool>) -> Router {
        let ws_state = WsState {
            signaling: Arc::clone(&self.state),
            shutdown_rx,
        };
        let health = HealthState::neu(self.state.metriken.clone());

        Router::new()
            .route(&self.state.config.ws_pfad, get(ws_handler))
            .with_state(ws_state)
            .merge(health_router(health))
            .merge(metrics_router(self.state.metriken.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&self.state.config.cors_origins))
    }

    /// Bedient den Listener bis `shutdown_rx` ein `true`-Signal empfaengt
    ///
    /// Kehrt erst zurueck, wenn alle Verbindungs-Tasks ihre Host-Kennungen
    /// freigegeben haben. axum selbst wartet nicht auf WebSocket-Tasks.
    pub async fn starten(
        self,
        listener: TcpListener,
        shutdown_rx: watch::Receiver<bool>,
    ) -> SignalingResult<()> {
        let app = self.router(shutdown_rx.clone());
        let lokale_addr = listener.local_addr()?;
        tracing::info!(
            adresse = %lokale_addr,
            pfad = %self.state.config.ws_pfad,
            "Signaling-Server gestartet"
        );

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_abwarten(shutdown_rx))
        .await?;

        let tasks = &self.state.verbindungs_tasks;
        tasks.close();
        tracing::info!(offen = tasks.len(), "Warte auf offene Verbindungen");
        tasks.wait().await;

        tracing::info!("Signaling-Server gestoppt");
        Ok(())
    }
}

/// CORS: leere Liste erlaubt alle Origins, sonst nur die angegebenen
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ungueltiger CORS-Origin ignoriert");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
}

async fn shutdown_abwarten(mut shutdown_rx: watch::Receiver<bool>) {
    while !*shutdown_rx.borrow_and_update() {
        if shutdown_rx.changed().await.is_err() {
            return;
        }
    }
    tracing::info!("Signaling-Server: Shutdown-Signal empfangen");
}

/// `GET {ws_pfad}` – Upgrade auf WebSocket, 503 wenn der Server voll ist
async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    State(ws_state): State<WsState>,
) -> Response {
    let state = ws_state.signaling;
    let max = state.config.max_verbindungen;
    if state.router.anzahl() >= max {
        tracing::warn!(peer = %peer_addr, max, "Server voll – Verbindung abgelehnt");
        return (StatusCode::SERVICE_UNAVAILABLE, "Server voll").into_response();
    }

    // Ab hier zaehlt die Verbindung fuer das Herunterfahren mit
    let task_token = state.verbindungs_tasks.token();
    let shutdown_rx = ws_state.shutdown_rx;
    ws.max_message_size(state.config.max_nachricht_bytes)
        .on_upgrade(move |socket| async move {
            ClientConnection::neu(state, peer_addr)
                .verarbeiten(socket, shutdown_rx)
                .await;
            drop(task_token);
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_mit_und_ohne_origins() {
        // Beides muss sich bauen lassen, ungueltige Eintraege werden uebersprungen
        let _ = cors_layer(&[]);
        let _ = cors_layer(&[String::from("https://remote.example"), String::from("\n")]);
    }

    #[tokio::test]
    async fn shutdown_abwarten_endet_bei_true() {
        let (tx, rx) = watch::channel(false);
        let warten = tokio::spawn(shutdown_abwarten(rx));
        tx.send(true).unwrap();
        warten.await.unwrap();
    }
}
