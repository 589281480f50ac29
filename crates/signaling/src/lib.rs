//! treffpunkt-signaling – WebSocket-Signaling und Rendezvous
//!
//! Hosts melden eine Kennung mit Passwort an, Clients fragen unter dieser
//! Kennung eine Verbindung an. Danach reicht der Server Offer, Answer und
//! ICE-Kandidaten zwischen den beiden Verbindungen durch, ohne sie zu lesen.
//!
//! ## Architektur
//!
//! ```text
//! axum Router (SignalingServer)
//!     |  /ws, /health, /metrics
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |  Zustand: Ungebunden -> HostGebunden -> Geschlossen
//!     v
//! MessageDispatcher
//!     |
//!     +-- HostHandler    (host-register)
//!     +-- ClientHandler  (client-request-connect)
//!     +-- RelayHandler   (webrtc-offer, webrtc-answer, webrtc-ice-candidate)
//!
//! RendezvousRegistry – Host-Kennung -> Verbindung + Geheimnis
//! ConnectionRouter   – Send-Queue pro lebender Verbindung
//! ```

pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod http;
pub mod router;
pub mod server_state;

// Bequeme Re-Exporte
pub use connection::ClientConnection;
pub use dispatcher::{DispatcherContext, MessageDispatcher, VerbindungsZustand};
pub use error::{MatchFehler, SignalingError, SignalingResult};
pub use http::SignalingServer;
pub use router::ConnectionRouter;
pub use server_state::{SignalingConfig, SignalingState};
