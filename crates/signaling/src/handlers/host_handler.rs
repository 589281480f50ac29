//! Host-Handler – Anmeldung einer Host-Kennung

use treffpunkt_protocol::{HostRegisterAnfrage, ServerNachricht};
use treffpunkt_registry::RegistrierErgebnis;

use crate::dispatcher::{DispatcherContext, VerbindungsZustand};
use crate::error::MatchFehler;
use crate::handlers::{store_fehler_melden, verwaiste_kennung_freigeben};
use crate::server_state::SignalingState;

/// Verarbeitet `host-register`
///
/// Bei Erfolg wird die Verbindung zum Host dieser Kennung. Ist die Kennung
/// von einem lebenden Host belegt, bleibt dessen Eintrag unangetastet; ein
/// verwaister Eintrag wird entfernt und die Anmeldung einmal wiederholt.
pub async fn handle_host_register(
    anfrage: HostRegisterAnfrage,
    ctx: &mut DispatcherContext,
    state: &SignalingState,
) -> ServerNachricht {
    let host_id = anfrage.id;

    let mut ergebnis = state
        .registry
        .try_register(&host_id, ctx.connection_id, &anfrage.password)
        .await;
    if matches!(ergebnis, Ok(RegistrierErgebnis::BereitsVergeben))
        && verwaiste_kennung_freigeben(state, &host_id).await
    {
        ergebnis = state
            .registry
            .try_register(&host_id, ctx.connection_id, &anfrage.password)
            .await;
    }

    let fehler = match ergebnis {
        Ok(RegistrierErgebnis::Registriert) => {
            state.metriken.store_status_setzen(true);
            state.metriken.hosts_registered.inc();
            state
                .metriken
                .register_total
                .with_label_values(&["success"])
                .inc();
            tracing::info!(host_id = %host_id, connection = %ctx.connection_id, "Host angemeldet");
            ctx.zustand = VerbindungsZustand::HostGebunden(host_id.clone());
            return ServerNachricht::HostRegisterSuccess { host_id };
        }
        Ok(RegistrierErgebnis::BereitsVergeben) => {
            state.metriken.store_status_setzen(true);
            tracing::warn!(host_id = %host_id, connection = %ctx.connection_id, "Host-Kennung bereits vergeben");
            MatchFehler::Doppelt
        }
        Ok(RegistrierErgebnis::VerbindungBelegt) => {
            state.metriken.store_status_setzen(true);
            tracing::warn!(
                host_id = %host_id,
                connection = %ctx.connection_id,
                "Verbindung ist bereits als Host angemeldet"
            );
            MatchFehler::VerbindungBelegt
        }
        Err(e) => {
            store_fehler_melden(state, "try_register", &e);
            MatchFehler::NichtVerfuegbar
        }
    };

    state
        .metriken
        .register_total
        .with_label_values(&[fehler.metrik_label()])
        .inc();
    ServerNachricht::register_failed(fehler.to_string())
}
