//! Identifikationstypen fuer Treffpunkt
//!
//! Newtype-Pattern, damit Verbindungs-IDs und Host-IDs zur Compilezeit nicht
//! verwechselt werden koennen. Beide serialisieren transparent, auf dem Draht
//! erscheinen also nur der UUID-String bzw. der Host-Name.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transport-vergebene ID einer lebenden Verbindung
///
/// Wird beim Oeffnen des WebSockets zufaellig erzeugt und ist die einzige
/// Adresse, ueber die Nachrichten weitergeleitet werden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Erstellt eine neue zufaellige ConnectionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ConnectionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Vom Host frei gewaehlte Kennung
///
/// Eindeutig nur unter den aktuell registrierten Hosts; nach dem Trennen
/// darf sie erneut vergeben werden.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostId(pub String);

impl HostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HostId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for HostId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
