//! Handler fuer alle Signaling-Ereignisse
//!
//! Jeder Handler ist fuer einen Ereignistyp zustaendig und hat Zugriff auf
//! den gemeinsamen SignalingState.

pub mod client_handler;
pub mod host_handler;
pub mod relay_handler;

use treffpunkt_core::HostId;
use treffpunkt_registry::{FreigabeErgebnis, HostRecord, StoreError};

use crate::server_state::SignalingState;

/// Protokolliert einen Store-Fehler und markiert den Store als nicht erreichbar
pub(crate) fn store_fehler_melden(state: &SignalingState, operation: &str, fehler: &StoreError) {
    if fehler.ist_nicht_verfuegbar() {
        state.metriken.store_status_setzen(false);
    }
    tracing::error!(operation, fehler = %fehler, "Registry-Store-Fehler");
}

/// Prueft, ob die Verbindung eines Host-Eintrags in diesem Prozess noch lebt
pub(crate) fn ist_verwaist(state: &SignalingState, record: &HostRecord) -> bool {
    !state.router.ist_registriert(&record.connection_id)
}

/// Entfernt einen Host-Eintrag ohne lebende Verbindung
///
/// Solche Eintraege bleiben nach einem Absturz im persistenten Store liegen
/// oder wenn die Freigabe beim Schliessen scheiterte. `true` wenn die
/// Kennung danach frei ist.
pub(crate) async fn verwaisten_eintrag_entfernen(
    state: &SignalingState,
    record: &HostRecord,
) -> bool {
    tracing::warn!(
        host_id = %record.host_id,
        connection = %record.connection_id,
        "Host-Eintrag ohne lebende Verbindung wird entfernt"
    );
    match state.registry.release_by_connection(record.connection_id).await {
        Ok(FreigabeErgebnis::Freigegeben(_)) => true,
        Ok(FreigabeErgebnis::KeinHost) => false,
        Err(e) => {
            store_fehler_melden(state, "release_by_connection", &e);
            false
        }
    }
}

/// Gibt eine vergebene Kennung frei, wenn ihr Host nicht mehr verbunden ist
pub(crate) async fn verwaiste_kennung_freigeben(state: &SignalingState, host_id: &HostId) -> bool {
    match state.registry.lookup(host_id).await {
        Ok(Some(record)) if ist_verwaist(state, &record) => {
            verwaisten_eintrag_entfernen(state, &record).await
        }
        Ok(_) => false,
        Err(e) => {
            store_fehler_melden(state, "lookup", &e);
            false
        }
    }
}
