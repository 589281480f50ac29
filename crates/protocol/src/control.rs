//! Control-Nachrichten des Signaling-Protokolls
//!
//! Definiert alle Ereignisse zwischen Host/Client und Server.
//!
//! ## Design
//! - Jedes Ereignis hat einen festen Namen (`event`) und einen Datenteil (`data`)
//! - Ereignis- und Feldnamen entsprechen dem, was bestehende Clients sprechen
//! - Handshake-Payloads (SDP, ICE-Kandidaten) bleiben `RawValue` und werden
//!   nie interpretiert

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use treffpunkt_core::{ConnectionId, HostId};

// ---------------------------------------------------------------------------
// Ereignisnamen
// ---------------------------------------------------------------------------

/// Namen der eingehenden Ereignisse
pub mod ereignis {
    pub const HOST_REGISTER: &str = "host-register";
    pub const CLIENT_REQUEST_CONNECT: &str = "client-request-connect";
    pub const WEBRTC_OFFER: &str = "webrtc-offer";
    pub const WEBRTC_ANSWER: &str = "webrtc-answer";
    pub const WEBRTC_ICE_CANDIDATE: &str = "webrtc-ice-candidate";
}

// ---------------------------------------------------------------------------
// Eingehende Nachrichten (Client -> Server)
// ---------------------------------------------------------------------------

/// Host meldet sich unter einer Kennung an
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostRegisterAnfrage {
    /// Gewuenschte Host-Kennung
    pub id: HostId,
    /// Gemeinsames Geheimnis fuer Clients
    pub password: String,
}

/// Client moechte sich mit einem Host verbinden
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerbindungsAnfrage {
    pub host_id: HostId,
    pub password: String,
}

/// Art einer weitergeleiteten Handshake-Nachricht
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayArt {
    Offer,
    Answer,
    IceCandidate,
}

impl RelayArt {
    /// Ereignisname auf dem Draht (ein- und ausgehend identisch)
    pub fn ereignis_name(self) -> &'static str {
        match self {
            Self::Offer => ereignis::WEBRTC_OFFER,
            Self::Answer => ereignis::WEBRTC_ANSWER,
            Self::IceCandidate => ereignis::WEBRTC_ICE_CANDIDATE,
        }
    }

    /// Kurzname fuer Logs und Metrik-Labels
    pub fn label(self) -> &'static str {
        match self {
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::IceCandidate => "candidate",
        }
    }
}

impl std::fmt::Display for RelayArt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Adressierte Handshake-Nachricht, die blind weitergeleitet wird
#[derive(Debug, Clone)]
pub struct RelayAnfrage {
    pub art: RelayArt,
    /// Ziel-Verbindung
    pub ziel: ConnectionId,
    /// Opaker Payload, byte-identisch weitergereicht
    pub payload: Box<RawValue>,
}

/// Alle Nachrichten, die der Server von einer Verbindung annimmt
#[derive(Debug, Clone)]
pub enum ClientNachricht {
    HostRegister(HostRegisterAnfrage),
    ClientRequestConnect(VerbindungsAnfrage),
    Relay(RelayAnfrage),
}

// Datenteile der Relay-Ereignisse. Offer/Answer tragen `sdp`, ICE traegt
// `candidate`; beides wird nur als RawValue durchgereicht.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SdpEingang {
    pub target_socket_id: ConnectionId,
    pub sdp: Box<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct KandidatEingang {
    pub target_socket_id: ConnectionId,
    pub candidate: Box<RawValue>,
}

// ---------------------------------------------------------------------------
// Ausgehende Nachrichten (Server -> Client)
// ---------------------------------------------------------------------------

/// Alle Nachrichten, die der Server an eine Verbindung sendet
///
/// Serialisiert als `{"event": "...", "data": {...}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerNachricht {
    /// Registrierung erfolgreich
    #[serde(rename = "host-register-success")]
    HostRegisterSuccess {
        #[serde(rename = "hostId")]
        host_id: HostId,
    },

    /// Registrierung abgelehnt
    #[serde(rename = "host-register-failed")]
    HostRegisterFailed { message: String },

    /// Verbindungsanfrage abgelehnt
    #[serde(rename = "client-connect-failed")]
    ClientConnectFailed { message: String },

    /// An den Host: ein Client moechte sich verbinden
    #[serde(rename = "client-wants-to-connect")]
    ClientWantsToConnect {
        #[serde(rename = "clientId")]
        client_id: ConnectionId,
    },

    /// An den Client: Host gefunden, hier ist seine Verbindungs-ID
    #[serde(rename = "host-is-ready")]
    HostIsReady {
        #[serde(rename = "hostId")]
        host_id: HostId,
        #[serde(rename = "hostSocketId")]
        host_socket_id: ConnectionId,
    },

    #[serde(rename = "webrtc-offer")]
    WebrtcOffer {
        #[serde(rename = "senderSocketId")]
        sender_socket_id: ConnectionId,
        sdp: Box<RawValue>,
    },

    #[serde(rename = "webrtc-answer")]
    WebrtcAnswer {
        #[serde(rename = "senderSocketId")]
        sender_socket_id: ConnectionId,
        sdp: Box<RawValue>,
    },

    #[serde(rename = "webrtc-ice-candidate")]
    WebrtcIceCandidate {
        #[serde(rename = "senderSocketId")]
        sender_socket_id: ConnectionId,
        candidate: Box<RawValue>,
    },
}

impl ServerNachricht {
    /// Erstellt die weitergeleitete Form einer Relay-Anfrage
    pub fn relay(art: RelayArt, absender: ConnectionId, payload: Box<RawValue>) -> Self {
        match art {
            RelayArt::Offer => Self::WebrtcOffer {
                sender_socket_id: absender,
                sdp: payload,
            },
            RelayArt::Answer => Self::WebrtcAnswer {
                sender_socket_id: absender,
                sdp: payload,
            },
            RelayArt::IceCandidate => Self::WebrtcIceCandidate {
                sender_socket_id: absender,
                candidate: payload,
            },
        }
    }

    pub fn register_failed(message: impl Into<String>) -> Self {
        Self::HostRegisterFailed {
            message: message.into(),
        }
    }

    pub fn connect_failed(message: impl Into<String>) -> Self {
        Self::ClientConnectFailed {
            message: message.into(),
        }
    }

    /// Ereignisname (fuer Logs)
    pub fn ereignis_name(&self) -> &'static str {
        match self {
            Self::HostRegisterSuccess { .. } => "host-register-success",
            Self::HostRegisterFailed { .. } => "host-register-failed",
            Self::ClientConnectFailed { .. } => "client-connect-failed",
            Self::ClientWantsToConnect { .. } => "client-wants-to-connect",
            Self::HostIsReady { .. } => "host-is-ready",
            Self::WebrtcOffer { .. } => ereignis::WEBRTC_OFFER,
            Self::WebrtcAnswer { .. } => ereignis::WEBRTC_ANSWER,
            Self::WebrtcIceCandidate { .. } => ereignis::WEBRTC_ICE_CANDIDATE,
        }
    }
}
