//! treffpunkt-protocol – Signaling-Nachrichten
//!
//! Dieses Crate definiert die Ereignisse, die Hosts und Clients ueber den
//! WebSocket mit dem Server austauschen, sowie den JSON-Umschlag, in dem
//! sie auf dem Draht liegen.

pub mod control;
pub mod wire;

pub use control::{
    ClientNachricht, HostRegisterAnfrage, RelayAnfrage, RelayArt, ServerNachricht,
    VerbindungsAnfrage,
};
pub use wire::{
    nachricht_dekodieren, nachricht_kodieren, ProtokollFehler, DEFAULT_MAX_NACHRICHT_BYTES,
};
