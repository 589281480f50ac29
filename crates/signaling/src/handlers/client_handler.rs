//! Client-Handler – Verbindungsanfrage an einen Host

use treffpunkt_protocol::{ServerNachricht, VerbindungsAnfrage};

use crate::dispatcher::DispatcherContext;
use crate::error::MatchFehler;
use crate::handlers::{ist_verwaist, store_fehler_melden, verwaisten_eintrag_entfernen};
use crate::server_state::SignalingState;

/// Verarbeitet `client-request-connect`
///
/// Passt das Geheimnis, bekommt der Host `client-wants-to-connect` und der
/// Anfragende `host-is-ready`. Die Verbindung des Anfragenden wird dabei
/// nirgends eingetragen. Ein Eintrag, dessen Host-Verbindung nicht mehr
/// lebt, gilt als nicht gefunden und wird entfernt.
pub async fn handle_connect_request(
    anfrage: VerbindungsAnfrage,
    ctx: &DispatcherContext,
    state: &SignalingState,
) -> ServerNachricht {
    let fehler = match state.registry.lookup(&anfrage.host_id).await {
        Ok(Some(record)) if ist_verwaist(state, &record) => {
            state.metriken.store_status_setzen(true);
            verwaisten_eintrag_entfernen(state, &record).await;
            MatchFehler::NichtGefunden
        }
        Ok(Some(record)) if record.secret == anfrage.password => {
            state.metriken.store_status_setzen(true);
            state
                .metriken
                .connect_requests_total
                .with_label_values(&["match"])
                .inc();

            let zugestellt = state.router.an_verbindung_senden(
                &record.connection_id,
                ServerNachricht::ClientWantsToConnect {
                    client_id: ctx.connection_id,
                },
            );
            if !zugestellt {
                tracing::warn!(
                    host_id = %record.host_id,
                    host_connection = %record.connection_id,
                    "Verbindungsanfrage konnte dem Host nicht zugestellt werden"
                );
            }

            tracing::info!(
                host_id = %record.host_id,
                client = %ctx.connection_id,
                "Client mit Host vermittelt"
            );
            return ServerNachricht::HostIsReady {
                host_id: record.host_id,
                host_socket_id: record.connection_id,
            };
        }
        Ok(Some(_)) => {
            state.metriken.store_status_setzen(true);
            tracing::warn!(host_id = %anfrage.host_id, client = %ctx.connection_id, "Falsches Passwort");
            MatchFehler::FalschesPasswort
        }
        Ok(None) => {
            state.metriken.store_status_setzen(true);
            tracing::debug!(host_id = %anfrage.host_id, client = %ctx.connection_id, "Host nicht gefunden");
            MatchFehler::NichtGefunden
        }
        Err(e) => {
            store_fehler_melden(state, "lookup", &e);
            MatchFehler::NichtVerfuegbar
        }
    };

    state
        .metriken
        .connect_requests_total
        .with_label_values(&[fehler.metrik_label()])
        .inc();
    ServerNachricht::connect_failed(fehler.to_string())
}
