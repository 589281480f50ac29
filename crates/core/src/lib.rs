//! treffpunkt-core – Gemeinsame Typen
//!
//! Dieses Crate stellt die ID-Typen bereit, die Registry, Protokoll und
//! Signaling gemeinsam nutzen.

pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use types::{ConnectionId, HostId};
