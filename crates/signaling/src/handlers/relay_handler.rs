//! Relay-Handler – Offer, Answer und ICE-Kandidaten weiterreichen
//!
//! Der Inhalt wird weder gelesen noch geprueft. Es gibt keine Antwort an den
//! Absender, auch nicht wenn das Ziel unbekannt ist.

use treffpunkt_protocol::{RelayAnfrage, ServerNachricht};

use crate::dispatcher::DispatcherContext;
use crate::server_state::SignalingState;

pub fn handle_relay(anfrage: RelayAnfrage, ctx: &DispatcherContext, state: &SignalingState) {
    let art = anfrage.art;
    let ziel = anfrage.ziel;
    let nachricht = ServerNachricht::relay(art, ctx.connection_id, anfrage.payload);

    if state.router.an_verbindung_senden(&ziel, nachricht) {
        state
            .metriken
            .relayed_total
            .with_label_values(&[art.label()])
            .inc();
        tracing::trace!(art = %art, von = %ctx.connection_id, an = %ziel, "Weitergeleitet");
    } else {
        state.metriken.relay_dropped_total.inc();
        tracing::debug!(art = %art, von = %ctx.connection_id, an = %ziel, "Ziel nicht erreichbar, verworfen");
    }
}
