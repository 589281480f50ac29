//! Integration-Tests fuer den Server-Start

use treffpunkt_core::{ConnectionId, HostId};
use treffpunkt_protocol::{
    ClientNachricht, HostRegisterAnfrage, ServerNachricht, VerbindungsAnfrage,
};
use treffpunkt_registry::StoreBackend;
use treffpunkt_server::{config::ServerConfig, Server};
use treffpunkt_signaling::{DispatcherContext, MessageDispatcher};

fn sqlite_config(datei: &std::path::Path) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.registry.backend = StoreBackend::Sqlite;
    config.registry.url = format!("sqlite://{}", datei.display());
    config
}

fn temp_datei() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("treffpunkt-test-{}.db", uuid::Uuid::new_v4()))
}

#[tokio::test]
async fn memory_backend_startet() {
    let state = Server::neu(ServerConfig::default())
        .vorbereiten()
        .await
        .unwrap();
    assert_eq!(state.registry.store().backend(), StoreBackend::Memory);
    assert_eq!(state.config.ws_pfad, "/ws");
    assert!(state.metriken.store_erreichbar());
}

#[tokio::test]
async fn nicht_erreichbarer_store_ist_fatal() {
    let config = sqlite_config(std::path::Path::new(
        "/gibt/es/nicht/treffpunkt/registry.db",
    ));
    assert!(Server::neu(config).vorbereiten().await.is_err());
}

#[tokio::test]
async fn abgestuerzter_host_gilt_nach_neustart_als_offline() {
    let datei = temp_datei();

    // Prozess endet ohne Aufraeumen, der Eintrag bleibt in der Datei
    let erster = Server::neu(sqlite_config(&datei)).vorbereiten().await.unwrap();
    erster
        .registry
        .try_register(&HostId::from("pc-1"), ConnectionId::new(), "s")
        .await
        .unwrap();
    drop(erster);

    let zweiter = Server::neu(sqlite_config(&datei)).vorbereiten().await.unwrap();
    let dispatcher = MessageDispatcher::neu(zweiter.clone());

    let mut client = DispatcherContext::neu(ConnectionId::new());
    let _client_rx = zweiter.router.verbindung_registrieren(client.connection_id);
    let antwort = dispatcher
        .dispatch(
            ClientNachricht::ClientRequestConnect(VerbindungsAnfrage {
                host_id: HostId::from("pc-1"),
                password: "s".into(),
            }),
            &mut client,
        )
        .await;
    assert!(matches!(
        antwort,
        Some(ServerNachricht::ClientConnectFailed { .. })
    ));

    let mut host = DispatcherContext::neu(ConnectionId::new());
    let _host_rx = zweiter.router.verbindung_registrieren(host.connection_id);
    let antwort = dispatcher
        .dispatch(
            ClientNachricht::HostRegister(HostRegisterAnfrage {
                id: HostId::from("pc-1"),
                password: "neu".into(),
            }),
            &mut host,
        )
        .await;
    assert!(matches!(
        antwort,
        Some(ServerNachricht::HostRegisterSuccess { .. })
    ));

    let _ = std::fs::remove_file(&datei);
}

#[tokio::test]
async fn leeren_beim_start_entfernt_alte_eintraege() {
    let datei = temp_datei();

    let erster = Server::neu(sqlite_config(&datei)).vorbereiten().await.unwrap();
    erster
        .registry
        .try_register(&HostId::from("pc-1"), ConnectionId::new(), "s")
        .await
        .unwrap();
    drop(erster);

    let mut config = sqlite_config(&datei);
    config.registry.beim_start_leeren = true;
    let zweiter = Server::neu(config).vorbereiten().await.unwrap();
    assert!(zweiter
        .registry
        .lookup(&HostId::from("pc-1"))
        .await
        .unwrap()
        .is_none());

    let _ = std::fs::remove_file(&datei);
}
