//! Wire-Format fuer WebSocket-Textframes
//!
//! Jeder Frame enthaelt genau einen JSON-Umschlag:
//!
//! ```text
//! {"event": "<ereignisname>", "data": { ... }}
//! ```
//!
//! Der Datenteil wird erst nach dem Ereignisnamen typisiert dekodiert, damit
//! Handshake-Payloads als `RawValue` unveraendert erhalten bleiben.

use serde::Deserialize;
use serde_json::value::RawValue;
use thiserror::Error;

use crate::control::{
    ereignis, ClientNachricht, HostRegisterAnfrage, KandidatEingang, RelayAnfrage, RelayArt,
    SdpEingang, ServerNachricht, VerbindungsAnfrage,
};

/// Standard-maximale Nachrichtengroesse (64 KB)
pub const DEFAULT_MAX_NACHRICHT_BYTES: usize = 64 * 1024;

/// Fehler beim Kodieren oder Dekodieren eines Umschlags
#[derive(Debug, Error)]
pub enum ProtokollFehler {
    /// Kein oder ungueltiges JSON, fehlende Felder
    #[error("Ungueltige Nachricht: {0}")]
    UngueltigesJson(#[from] serde_json::Error),

    /// Ereignisname ohne Handler
    #[error("Unbekanntes Ereignis: {0}")]
    UnbekanntesEreignis(String),
}

#[derive(Deserialize)]
struct Umschlag<'a> {
    event: String,
    #[serde(borrow)]
    data: &'a RawValue,
}

/// Dekodiert einen eingehenden Textframe
pub fn nachricht_dekodieren(text: &str) -> Result<ClientNachricht, ProtokollFehler> {
    let umschlag: Umschlag<'_> = serde_json::from_str(text)?;
    let data = umschlag.data.get();

    let nachricht = match umschlag.event.as_str() {
        ereignis::HOST_REGISTER => {
            ClientNachricht::HostRegister(serde_json::from_str::<HostRegisterAnfrage>(data)?)
        }
        ereignis::CLIENT_REQUEST_CONNECT => {
            ClientNachricht::ClientRequestConnect(serde_json::from_str::<VerbindungsAnfrage>(data)?)
        }
        ereignis::WEBRTC_OFFER => sdp_relay(RelayArt::Offer, data)?,
        ereignis::WEBRTC_ANSWER => sdp_relay(RelayArt::Answer, data)?,
        ereignis::WEBRTC_ICE_CANDIDATE => {
            let eingang: KandidatEingang = serde_json::from_str(data)?;
            ClientNachricht::Relay(RelayAnfrage {
                art: RelayArt::IceCandidate,
                ziel: eingang.target_socket_id,
                payload: eingang.candidate,
            })
        }
        unbekannt => return Err(ProtokollFehler::UnbekanntesEreignis(unbekannt.to_string())),
    };

    Ok(nachricht)
}

fn sdp_relay(art: RelayArt, data: &str) -> Result<ClientNachricht, ProtokollFehler> {
    let eingang: SdpEingang = serde_json::from_str(data)?;
    Ok(ClientNachricht::Relay(RelayAnfrage {
        art,
        ziel: eingang.target_socket_id,
        payload: eingang.sdp,
    }))
}

/// Kodiert eine ausgehende Nachricht als Textframe
pub fn nachricht_kodieren(nachricht: &ServerNachricht) -> Result<String, ProtokollFehler> {
    Ok(serde_json::to_string(nachricht)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
