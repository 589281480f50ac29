//! Integration-Tests fuer RendezvousRegistry (beide Backends)

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use treffpunkt_core::{ConnectionId, HostId};
use treffpunkt_registry::{
    FreigabeErgebnis, MemoryStore, RegistrierErgebnis, RegistryConfig, RegistryStore,
    RendezvousRegistry, SqliteStore, StoreBackend, StoreError, StoreResult,
};

async fn registries() -> Vec<RendezvousRegistry> {
    let sqlite = SqliteStore::in_memory()
        .await
        .expect("In-Memory DB konnte nicht erstellt werden");
    vec![
        RendezvousRegistry::neu(Arc::new(MemoryStore::neu()), RegistryConfig::default()),
        RendezvousRegistry::neu(Arc::new(sqlite), RegistryConfig::default()),
    ]
}

fn h(id: &str) -> HostId {
    HostId::from(id)
}

#[tokio::test]
async fn registrieren_und_nachschlagen() {
    for registry in registries().await {
        let conn = ConnectionId::new();
        let ergebnis = registry.try_register(&h("host1"), conn, "secret1").await.unwrap();
        assert_eq!(ergebnis, RegistrierErgebnis::Registriert);

        let record = registry.lookup(&h("host1")).await.unwrap().unwrap();
        assert_eq!(record.host_id, h("host1"));
        assert_eq!(record.connection_id, conn);
        assert_eq!(record.secret, "secret1");
    }
}

#[tokio::test]
async fn nie_registriert_ist_nicht_gefunden() {
    for registry in registries().await {
        assert_eq!(registry.lookup(&h("ghost")).await.unwrap(), None);
    }
}

#[tokio::test]
async fn doppelte_kennung_wird_abgelehnt() {
    for registry in registries().await {
        let erste = ConnectionId::new();
        let zweite = ConnectionId::new();
        registry.try_register(&h("h1"), erste, "s1").await.unwrap();

        let ergebnis = registry.try_register(&h("h1"), zweite, "s2").await.unwrap();
        assert_eq!(ergebnis, RegistrierErgebnis::BereitsVergeben);

        // Kein Ueberschreiben, kein Rueckwaertsindex fuer die zweite Verbindung
        let record = registry.lookup(&h("h1")).await.unwrap().unwrap();
        assert_eq!(record.connection_id, erste);
        assert_eq!(record.secret, "s1");
        assert_eq!(
            registry.release_by_connection(zweite).await.unwrap(),
            FreigabeErgebnis::KeinHost
        );
    }
}

#[tokio::test]
async fn gleichzeitige_registrierung_ein_gewinner() {
    for registry in registries().await {
        let mut tasks = Vec::new();
        for i in 0..16 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                registry
                    .try_register(&h("begehrt"), ConnectionId::new(), &format!("s{i}"))
                    .await
                    .unwrap()
            }));
        }

        let mut registriert = 0;
        for t in tasks {
            match t.await.unwrap() {
                RegistrierErgebnis::Registriert => registriert += 1,
                RegistrierErgebnis::BereitsVergeben => {}
                andere => panic!("Unerwartetes Ergebnis: {andere:?}"),
            }
        }
        assert_eq!(registriert, 1);
    }
}

#[tokio::test]
async fn freigabe_und_wiederverwendung() {
    for registry in registries().await {
        let alt = ConnectionId::new();
        registry.try_register(&h("h1"), alt, "s1").await.unwrap();

        assert_eq!(
            registry.release_by_connection(alt).await.unwrap(),
            FreigabeErgebnis::Freigegeben(h("h1"))
        );
        assert_eq!(registry.lookup(&h("h1")).await.unwrap(), None);

        // Zweite Freigabe findet nichts mehr
        assert_eq!(
            registry.release_by_connection(alt).await.unwrap(),
            FreigabeErgebnis::KeinHost
        );

        let neu = ConnectionId::new();
        assert_eq!(
            registry.try_register(&h("h1"), neu, "s2").await.unwrap(),
            RegistrierErgebnis::Registriert
        );
        assert_eq!(registry.lookup(&h("h1")).await.unwrap().unwrap().secret, "s2");
    }
}

#[tokio::test]
async fn freigabe_eines_clients_veraendert_nichts() {
    for registry in registries().await {
        let host = ConnectionId::new();
        registry.try_register(&h("h1"), host, "s1").await.unwrap();

        let client = ConnectionId::new();
        assert_eq!(
            registry.release_by_connection(client).await.unwrap(),
            FreigabeErgebnis::KeinHost
        );
        assert!(registry.lookup(&h("h1")).await.unwrap().is_some());
    }
}

#[tokio::test]
async fn zweite_kennung_auf_derselben_verbindung() {
    for registry in registries().await {
        let conn = ConnectionId::new();
        registry.try_register(&h("erst"), conn, "s").await.unwrap();

        assert_eq!(
            registry.try_register(&h("zweit"), conn, "s").await.unwrap(),
            RegistrierErgebnis::VerbindungBelegt
        );
        // Zweiter Vorwaertsschluessel wurde nie angelegt
        assert_eq!(registry.lookup(&h("zweit")).await.unwrap(), None);

        assert_eq!(
            registry.release_by_connection(conn).await.unwrap(),
            FreigabeErgebnis::Freigegeben(h("erst"))
        );
        assert_eq!(registry.lookup(&h("erst")).await.unwrap(), None);
    }
}

/// Reicht an einen MemoryStore durch und merkt sich alle Schreibzugriffe
#[derive(Default)]
struct MitschreibenderStore {
    inner: MemoryStore,
    geschrieben: Mutex<Vec<String>>,
}

impl MitschreibenderStore {
    fn geschriebene_schluessel(&self) -> Vec<String> {
        self.geschrieben.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegistryStore for MitschreibenderStore {
    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.inner.exists(key).await
    }
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key).await
    }
    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.geschrieben.lock().unwrap().push(key.to_string());
        self.inner.set(key, value).await
    }
    async fn set_if_absent(&self, key: &str, value: &str) -> StoreResult<bool> {
        self.geschrieben.lock().unwrap().push(key.to_string());
        self.inner.set_if_absent(key, value).await
    }
    async fn delete(&self, key: &str) -> StoreResult<bool> {
        self.inner.delete(key).await
    }
    async fn clear_prefix(&self, prefix: &str) -> StoreResult<u64> {
        self.inner.clear_prefix(prefix).await
    }
    fn backend(&self) -> StoreBackend {
        StoreBackend::Memory
    }
}

#[tokio::test]
async fn belegte_verbindung_beruehrt_fremde_kennung_nie() {
    let store = Arc::new(MitschreibenderStore::default());
    let registry = RendezvousRegistry::neu(store.clone(), RegistryConfig::default());
    let host = ConnectionId::new();
    registry.try_register(&h("erst"), host, "s").await.unwrap();

    assert_eq!(
        registry.try_register(&h("zweit"), host, "s").await.unwrap(),
        RegistrierErgebnis::VerbindungBelegt
    );
    assert!(!store
        .geschriebene_schluessel()
        .iter()
        .any(|k| k == "treffpunkt:host:zweit"));

    // Die Kennung ist fuer eine andere Verbindung sofort frei
    assert_eq!(
        registry
            .try_register(&h("zweit"), ConnectionId::new(), "t")
            .await
            .unwrap(),
        RegistrierErgebnis::Registriert
    );
}

#[tokio::test]
async fn vergebene_kennung_hinterlaesst_keinen_rueckwaertsindex() {
    let store = Arc::new(MitschreibenderStore::default());
    let registry = RendezvousRegistry::neu(store.clone(), RegistryConfig::default());
    registry
        .try_register(&h("pc"), ConnectionId::new(), "s")
        .await
        .unwrap();

    let zweite = ConnectionId::new();
    assert_eq!(
        registry.try_register(&h("pc"), zweite, "s").await.unwrap(),
        RegistrierErgebnis::BereitsVergeben
    );
    assert_eq!(
        store.get(&format!("treffpunkt:conn:{zweite}")).await.unwrap(),
        None
    );
    // Die zurueckgerollte Verbindung kann danach eine andere Kennung nehmen
    assert_eq!(
        registry.try_register(&h("pc-2"), zweite, "s").await.unwrap(),
        RegistrierErgebnis::Registriert
    );
}

// ---------------------------------------------------------------------------
// Zeitlimit
// ---------------------------------------------------------------------------

/// Store, der jeden Aufruf eine Minute haengen laesst
struct HaengenderStore;

impl HaengenderStore {
    async fn haengen<T: Send>(&self) -> StoreResult<T> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Err(StoreError::ungueltige_daten("haette nie antworten duerfen"))
    }
}

#[async_trait]
impl RegistryStore for HaengenderStore {
    async fn exists(&self, _key: &str) -> StoreResult<bool> {
        self.haengen().await
    }
    async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
        self.haengen().await
    }
    async fn set(&self, _key: &str, _value: &str) -> StoreResult<()> {
        self.haengen().await
    }
    async fn set_if_absent(&self, _key: &str, _value: &str) -> StoreResult<bool> {
        self.haengen().await
    }
    async fn delete(&self, _key: &str) -> StoreResult<bool> {
        self.haengen().await
    }
    async fn clear_prefix(&self, _prefix: &str) -> StoreResult<u64> {
        self.haengen().await
    }
    fn backend(&self) -> StoreBackend {
        StoreBackend::Memory
    }
}

#[tokio::test(start_paused = true)]
async fn zeitlimit_wird_zu_nicht_verfuegbar() {
    let registry = RendezvousRegistry::neu(
        Arc::new(HaengenderStore),
        RegistryConfig {
            timeout: Duration::from_millis(100),
            ..RegistryConfig::default()
        },
    );

    let err = registry
        .try_register(&h("h1"), ConnectionId::new(), "s")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Timeout(_)));
    assert!(err.ist_nicht_verfuegbar());

    assert!(registry.lookup(&h("h1")).await.unwrap_err().ist_nicht_verfuegbar());
    assert!(registry.erreichbar_pruefen().await.unwrap_err().ist_nicht_verfuegbar());
}
