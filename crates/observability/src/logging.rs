//! Structured Logging Setup via tracing-subscriber
//!
//! Level und Format kommen aus der Konfiguration und lassen sich per
//! Umgebung ueberschreiben:
//! - `TP_LOG_LEVEL`: EnvFilter-Direktive, z.B. `info` oder `treffpunkt_signaling=debug`
//! - `TP_LOG_FORMAT`: `text` oder `json`
//!
//! Verbindungs-IDs tauchen als Feld `connection` in den Events auf.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

/// Unterstuetzte Ausgabeformate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Parst den Formatnamen; Unbekanntes wird zu `None`
    pub fn parsen(name: &str) -> Option<Self> {
        match name {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Validiert ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Bestimmt das effektive Format: Umgebung vor Konfiguration, Fallback Text
fn format_waehlen(konfiguriert: &str, aus_env: Option<&str>) -> LogFormat {
    aus_env
        .and_then(LogFormat::parsen)
        .or_else(|| LogFormat::parsen(konfiguriert))
        .unwrap_or(LogFormat::Text)
}

/// Initialisiert das Logging-System.
///
/// Gibt einen Fehler zurueck, wenn bereits ein globaler Subscriber gesetzt ist.
pub fn logging_initialisieren(level: &str, format: &str) -> Result<()> {
    let filter = EnvFilter::try_from_env("TP_LOG_LEVEL")
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format_env = std::env::var("TP_LOG_FORMAT").ok();

    match format_waehlen(format, format_env.as_deref()) {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(true)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Logging-Initialisierung fehlgeschlagen: {e}"))?,
        LogFormat::Text => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Logging-Initialisierung fehlgeschlagen: {e}"))?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_werte() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(log_level_gueltig(level));
        }
        assert!(!log_level_gueltig("verbose"));
        assert!(!log_level_gueltig("INFO")); // Gross-/Kleinschreibung
        assert!(!log_level_gueltig(""));
    }

    #[test]
    fn format_parsen() {
        assert_eq!(LogFormat::parsen("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parsen("text"), Some(LogFormat::Text));
        assert_eq!(LogFormat::parsen("JSON"), None);
    }

    #[test]
    fn umgebung_schlaegt_konfiguration() {
        assert_eq!(format_waehlen("text", Some("json")), LogFormat::Json);
        assert_eq!(format_waehlen("json", None), LogFormat::Json);
        // Ungueltige Umgebung faellt auf die Konfiguration zurueck
        assert_eq!(format_waehlen("json", Some("xml")), LogFormat::Json);
        assert_eq!(format_waehlen("xml", None), LogFormat::Text);
    }
}
