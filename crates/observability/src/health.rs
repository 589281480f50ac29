//! Health-Check-Endpunkt fuer Treffpunkt
//!
//! Endpoint: `GET /health`
//! Response: JSON mit Status, Version, Uptime, Store-Status und Anzahl
//! offener Verbindungen

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::metrics::TreffpunktMetrics;

/// Status des Health-Checks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Antwort des Health-Check-Endpunkts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub store_connected: bool,
    pub connections: i64,
}

/// Geteilter Zustand fuer den Health-Check-Handler
#[derive(Clone)]
pub struct HealthState {
    pub start_time: Arc<Instant>,
    pub metriken: TreffpunktMetrics,
}

impl HealthState {
    pub fn neu(metriken: TreffpunktMetrics) -> Self {
        Self {
            start_time: Arc::new(Instant::now()),
            metriken,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Momentaufnahme fuer die Antwort
    pub fn antwort(&self) -> HealthResponse {
        let store_connected = self.metriken.store_erreichbar();
        HealthResponse {
            status: if store_connected {
                HealthStatus::Healthy
            } else {
                HealthStatus::Degraded
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.uptime_seconds(),
            store_connected,
            connections: self.metriken.connections.get(),
        }
    }
}

/// Axum-Router fuer den `/health`-Endpunkt
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

/// `GET /health` – 200 auch bei degraded, der Health-Check soll nicht failen
async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.antwort()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn state() -> HealthState {
        HealthState::neu(TreffpunktMetrics::neu().unwrap())
    }

    #[test]
    fn frisch_ist_healthy() {
        let antwort = state().antwort();
        assert_eq!(antwort.status, HealthStatus::Healthy);
        assert!(antwort.store_connected);
        assert_eq!(antwort.connections, 0);
        assert!(antwort.uptime_seconds < 5);
    }

    #[test]
    fn store_ausfall_ist_degraded() {
        let state = state();
        state.metriken.store_status_setzen(false);
        state.metriken.connections.set(7);

        let antwort = state.antwort();
        assert_eq!(antwort.status, HealthStatus::Degraded);
        assert_eq!(antwort.connections, 7);

        let json = serde_json::to_string(&antwort).unwrap();
        assert!(json.contains("\"status\":\"degraded\""));
        assert!(json.contains("\"store_connected\":false"));
    }

    #[tokio::test]
    async fn endpunkt_liefert_json() {
        let app = health_router(state());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let antwort: HealthResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(antwort.status, HealthStatus::Healthy);
    }
}
