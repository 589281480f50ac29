//! Connection-Router – Adressiert Nachrichten an lebende Verbindungen
//!
//! Jede Verbindung meldet beim Oeffnen eine Send-Queue an und bekommt den
//! Empfaenger zurueck; der Verbindungs-Task schreibt alles, was dort ankommt,
//! auf seinen WebSocket. Eine Queue pro Ziel heisst: Nachrichten eines
//! Absenders an dasselbe Ziel kommen in Sendereihenfolge an.
//!
//! Senden an unbekannte oder geschlossene Verbindungen wird still verworfen.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use treffpunkt_core::ConnectionId;
use treffpunkt_protocol::ServerNachricht;

/// Standardgroesse der Send-Queue pro Verbindung
pub const SEND_QUEUE_GROESSE: usize = 256;

// ---------------------------------------------------------------------------
// VerbindungsSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue einer Verbindung
#[derive(Clone, Debug)]
pub struct VerbindungsSender {
    pub connection_id: ConnectionId,
    pub tx: mpsc::Sender<ServerNachricht>,
}

impl VerbindungsSender {
    /// Sendet nicht-blockierend; `false` wenn die Queue voll oder zu ist
    pub fn senden(&self, nachricht: ServerNachricht) -> bool {
        match self.tx.try_send(nachricht) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(n)) => {
                tracing::warn!(
                    connection = %self.connection_id,
                    ereignis = n.ereignis_name(),
                    "Send-Queue voll – Nachricht verworfen"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(connection = %self.connection_id, "Send-Queue geschlossen");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ConnectionRouter
// ---------------------------------------------------------------------------

/// Alle lebenden Verbindungen, indiziert nach ConnectionId
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct ConnectionRouter {
    inner: Arc<ConnectionRouterInner>,
}

struct ConnectionRouterInner {
    verbindungen: DashMap<ConnectionId, VerbindungsSender>,
    queue_groesse: usize,
}

impl ConnectionRouter {
    pub fn neu(queue_groesse: usize) -> Self {
        Self {
            inner: Arc::new(ConnectionRouterInner {
                verbindungen: DashMap::new(),
                queue_groesse: queue_groesse.max(1),
            }),
        }
    }

    /// Meldet eine Verbindung an und gibt ihre Empfangs-Queue zurueck
    pub fn verbindung_registrieren(
        &self,
        connection_id: ConnectionId,
    ) -> mpsc::Receiver<ServerNachricht> {
        let (tx, rx) = mpsc::channel(self.inner.queue_groesse);
        self.inner
            .verbindungen
            .insert(connection_id, VerbindungsSender { connection_id, tx });
        tracing::debug!(connection = %connection_id, "Verbindung im Router registriert");
        rx
    }

    /// Entfernt eine Verbindung; danach adressierte Nachrichten verfallen
    pub fn verbindung_entfernen(&self, connection_id: &ConnectionId) {
        if self.inner.verbindungen.remove(connection_id).is_some() {
            tracing::debug!(connection = %connection_id, "Verbindung aus Router entfernt");
        }
    }

    /// Sendet an eine einzelne Verbindung
    ///
    /// `false` wenn das Ziel unbekannt ist oder die Nachricht nicht in die
    /// Queue passte.
    pub fn an_verbindung_senden(&self, ziel: &ConnectionId, nachricht: ServerNachricht) -> bool {
        match self.inner.verbindungen.get(ziel) {
            Some(sender) => sender.senden(nachricht),
            None => false,
        }
    }

    pub fn ist_registriert(&self, connection_id: &ConnectionId) -> bool {
        self.inner.verbindungen.contains_key(connection_id)
    }

    /// Anzahl lebender Verbindungen
    pub fn anzahl(&self) -> usize {
        self.inner.verbindungen.len()
    }
}

impl Default for ConnectionRouter {
    fn default() -> Self {
        Self::neu(SEND_QUEUE_GROESSE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treffpunkt_core::HostId;

    fn nachricht(n: usize) -> ServerNachricht {
        ServerNachricht::HostRegisterSuccess {
            host_id: HostId::new(format!("h{n}")),
        }
    }

    #[tokio::test]
    async fn senden_an_registrierte_verbindung() {
        let router = ConnectionRouter::default();
        let id = ConnectionId::new();
        let mut rx = router.verbindung_registrieren(id);

        assert!(router.an_verbindung_senden(&id, nachricht(1)));
        assert!(matches!(
            rx.recv().await,
            Some(ServerNachricht::HostRegisterSuccess { .. })
        ));
    }

    #[test]
    fn unbekanntes_ziel_wird_verworfen() {
        let router = ConnectionRouter::default();
        assert!(!router.an_verbindung_senden(&ConnectionId::new(), nachricht(1)));
    }

    #[tokio::test]
    async fn reihenfolge_bleibt_erhalten() {
        let router = ConnectionRouter::default();
        let id = ConnectionId::new();
        let mut rx = router.verbindung_registrieren(id);

        for i in 0..50 {
            assert!(router.an_verbindung_senden(&id, nachricht(i)));
        }
        for i in 0..50 {
            match rx.recv().await {
                Some(ServerNachricht::HostRegisterSuccess { host_id }) => {
                    assert_eq!(host_id.as_str(), format!("h{i}"));
                }
                andere => panic!("Unerwartet: {andere:?}"),
            }
        }
    }

    #[test]
    fn volle_queue_verwirft() {
        let router = ConnectionRouter::neu(2);
        let id = ConnectionId::new();
        let _rx = router.verbindung_registrieren(id);

        assert!(router.an_verbindung_senden(&id, nachricht(1)));
        assert!(router.an_verbindung_senden(&id, nachricht(2)));
        assert!(!router.an_verbindung_senden(&id, nachricht(3)));
    }

    #[test]
    fn entfernen_und_geschlossener_empfaenger() {
        let router = ConnectionRouter::default();
        let id = ConnectionId::new();
        let rx = router.verbindung_registrieren(id);
        assert!(router.ist_registriert(&id));
        assert_eq!(router.anzahl(), 1);

        drop(rx);
        assert!(!router.an_verbindung_senden(&id, nachricht(1)));

        router.verbindung_entfernen(&id);
        assert!(!router.ist_registriert(&id));
        assert_eq!(router.anzahl(), 0);
    }
}
