//! Prometheus-kompatible Metriken fuer Treffpunkt
//!
//! Registrierte Metriken:
//! - `treffpunkt_connections` – Gauge: Offene WebSocket-Verbindungen
//! - `treffpunkt_hosts_registered` – Gauge: Aktuell angemeldete Hosts
//! - `treffpunkt_store_available` – Gauge: 1 wenn der letzte Store-Zugriff klappte
//! - `treffpunkt_register_total` – Counter: Anmeldungen nach Ergebnis
//! - `treffpunkt_connect_requests_total` – Counter: Verbindungsanfragen nach Ergebnis
//! - `treffpunkt_relayed_total` – Counter: Weitergeleitete Handshake-Nachrichten nach Art
//! - `treffpunkt_relay_dropped_total` – Counter: Verworfene Weiterleitungen

use anyhow::Result;
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Alle Treffpunkt-Prometheus-Metriken
///
/// Clone teilt die Registry und alle Zaehler.
#[derive(Clone)]
pub struct TreffpunktMetrics {
    pub registry: Arc<Registry>,

    pub connections: IntGauge,
    pub hosts_registered: IntGauge,
    pub store_available: IntGauge,

    pub register_total: IntCounterVec,
    pub connect_requests_total: IntCounterVec,
    pub relayed_total: IntCounterVec,
    pub relay_dropped_total: IntCounter,
}

impl TreffpunktMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let connections = IntGauge::with_opts(Opts::new(
            "treffpunkt_connections",
            "Anzahl offener WebSocket-Verbindungen",
        ))?;
        registry.register(Box::new(connections.clone()))?;

        let hosts_registered = IntGauge::with_opts(Opts::new(
            "treffpunkt_hosts_registered",
            "Anzahl aktuell angemeldeter Hosts",
        ))?;
        registry.register(Box::new(hosts_registered.clone()))?;

        let store_available = IntGauge::with_opts(Opts::new(
            "treffpunkt_store_available",
            "1 wenn der letzte Registry-Store-Zugriff erfolgreich war",
        ))?;
        store_available.set(1);
        registry.register(Box::new(store_available.clone()))?;

        let register_total = IntCounterVec::new(
            Opts::new("treffpunkt_register_total", "Host-Anmeldungen nach Ergebnis"),
            &["result"],
        )?;
        registry.register(Box::new(register_total.clone()))?;

        let connect_requests_total = IntCounterVec::new(
            Opts::new(
                "treffpunkt_connect_requests_total",
                "Verbindungsanfragen von Clients nach Ergebnis",
            ),
            &["result"],
        )?;
        registry.register(Box::new(connect_requests_total.clone()))?;

        let relayed_total = IntCounterVec::new(
            Opts::new(
                "treffpunkt_relayed_total",
                "Weitergeleitete Handshake-Nachrichten nach Art",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(relayed_total.clone()))?;

        let relay_dropped_total = IntCounter::with_opts(Opts::new(
            "treffpunkt_relay_dropped_total",
            "Weiterleitungen ohne erreichbares Ziel",
        ))?;
        registry.register(Box::new(relay_dropped_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            connections,
            hosts_registered,
            store_available,
            register_total,
            connect_requests_total,
            relayed_total,
            relay_dropped_total,
        })
    }

    /// Merkt sich, ob der Store zuletzt erreichbar war
    pub fn store_status_setzen(&self, erreichbar: bool) {
        self.store_available.set(i64::from(erreichbar));
    }

    pub fn store_erreichbar(&self) -> bool {
        self.store_available.get() == 1
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: TreffpunktMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<TreffpunktMetrics>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            axum::http::StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metriken_erstellen_erfolgreich() {
        let metriken = TreffpunktMetrics::neu().unwrap();
        assert!(!metriken.registry.gather().is_empty());
        assert!(metriken.store_erreichbar());
    }

    #[test]
    fn store_status_umschalten() {
        let metriken = TreffpunktMetrics::neu().unwrap();
        metriken.store_status_setzen(false);
        assert!(!metriken.store_erreichbar());
        metriken.store_status_setzen(true);
        assert!(metriken.store_erreichbar());
    }

    #[test]
    fn counter_mit_labels() {
        let metriken = TreffpunktMetrics::neu().unwrap();
        metriken.register_total.with_label_values(&["success"]).inc();
        metriken.register_total.with_label_values(&["success"]).inc();
        metriken.register_total.with_label_values(&["duplicate"]).inc();
        assert_eq!(metriken.register_total.with_label_values(&["success"]).get(), 2);
        assert_eq!(metriken.register_total.with_label_values(&["duplicate"]).get(), 1);
    }

    #[test]
    fn export_prometheus_format() {
        let metriken = TreffpunktMetrics::neu().unwrap();
        metriken.connections.set(3);
        metriken.relayed_total.with_label_values(&["offer"]).inc();

        let output = metriken.exportieren().unwrap();
        assert!(output.contains("treffpunkt_connections 3"));
        assert!(output.contains("treffpunkt_relayed_total{kind=\"offer\"} 1"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn getrennte_instanzen_teilen_nichts() {
        let a = TreffpunktMetrics::neu().unwrap();
        let b = TreffpunktMetrics::neu().unwrap();
        a.connections.inc();
        assert_eq!(b.connections.get(), 0);
        // Clone teilt dagegen
        let c = a.clone();
        assert_eq!(c.connections.get(), 1);
    }
}
