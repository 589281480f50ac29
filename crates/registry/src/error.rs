//! Fehlertypen fuer die Registry

use std::time::Duration;
use thiserror::Error;

/// Fehler eines Store-Zugriffs
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx-Fehler: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration-Fehler: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON-Fehler: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store-Zeitlimit ueberschritten ({0:?})")]
    Timeout(Duration),

    #[error("Ungueltige Daten: {0}")]
    UngueltigeDaten(String),
}

impl StoreError {
    pub fn ungueltige_daten(msg: impl Into<String>) -> Self {
        Self::UngueltigeDaten(msg.into())
    }

    /// Gibt true zurueck wenn der Store nicht erreichbar war
    ///
    /// Alles andere (kaputte Datensaetze) ist ein Datenfehler, kein
    /// Verfuegbarkeitsproblem.
    pub fn ist_nicht_verfuegbar(&self) -> bool {
        matches!(self, Self::Sqlx(_) | Self::Migration(_) | Self::Timeout(_))
    }
}

/// Result-Typ fuer Store- und Registry-Operationen
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_ist_nicht_verfuegbar() {
        let e = StoreError::Timeout(Duration::from_millis(50));
        assert!(e.ist_nicht_verfuegbar());
        assert!(e.to_string().contains("Zeitlimit"));
    }

    #[test]
    fn datenfehler_ist_verfuegbar() {
        assert!(!StoreError::ungueltige_daten("kaputt").ist_nicht_verfuegbar());
        let json = serde_json::from_str::<u32>("x").unwrap_err();
        assert!(!StoreError::from(json).ist_nicht_verfuegbar());
    }
}
