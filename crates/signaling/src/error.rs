//! Fehlertypen fuer den Signaling-Service

use thiserror::Error;
use treffpunkt_protocol::ProtokollFehler;

/// Fehlertyp fuer den Signaling-Service
#[derive(Debug, Error)]
pub enum SignalingError {
    /// IO-Fehler (Listener, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Nachricht liess sich nicht kodieren/dekodieren
    #[error("Protokollfehler: {0}")]
    Protokoll(#[from] ProtokollFehler),

    /// Verbindung wurde getrennt
    #[error("Verbindung getrennt")]
    VerbindungGetrennt,
}

/// Result-Typ fuer den Signaling-Service
pub type SignalingResult<T> = Result<T, SignalingError>;

/// Fachliche Ablehnungsgruende, die dem Anfragenden gemeldet werden
///
/// Der Display-Text geht unveraendert als `message` an den Client und wird
/// dort nur angezeigt. Die Texte wurden bewusst von Indonesisch auf Englisch
/// umgestellt; Clients duerfen sich nur auf den Ereignisnamen verlassen. "Nicht gefunden" und "Falsches Passwort"
/// bleiben unterscheidbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MatchFehler {
    /// Host-Kennung ist schon vergeben
    #[error("ID already in use.")]
    Doppelt,

    /// Kein Host unter dieser Kennung online
    #[error("Host not found / offline.")]
    NichtGefunden,

    /// Geheimnis passt nicht
    #[error("Wrong password.")]
    FalschesPasswort,

    /// Registry-Store nicht erreichbar
    #[error("Server error, please try again later.")]
    NichtVerfuegbar,

    /// Verbindung ist bereits als Host angemeldet
    #[error("This connection is already registered as a host.")]
    VerbindungBelegt,
}

impl MatchFehler {
    /// Label fuer die `result`-Dimension der Metriken
    pub fn metrik_label(self) -> &'static str {
        match self {
            Self::Doppelt => "duplicate",
            Self::NichtGefunden => "not_found",
            Self::FalschesPasswort => "wrong_password",
            Self::NichtVerfuegbar => "store_unavailable",
            Self::VerbindungBelegt => "connection_busy",
        }
    }
}
