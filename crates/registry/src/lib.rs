//! treffpunkt-registry – Rendezvous-Registry
//!
//! Haelt die Zuordnung Host-Kennung -> (Verbindung, Geheimnis) und den
//! Rueckwaertsindex Verbindung -> Host-Kennung. Beides liegt in einem
//! Schluessel/Wert-Store, der entweder im Prozess (`MemoryStore`) oder in
//! einer SQLite-Datei (`SqliteStore`) lebt.
//!
//! ```text
//! RendezvousRegistry   (try_register, lookup, release_by_connection)
//!     |
//!     v
//! Arc<dyn RegistryStore>  (exists, get, set, set_if_absent, delete)
//!     |
//!     +-- MemoryStore  (DashMap, ein Prozess)
//!     +-- SqliteStore  (sqlx, ein Prozess, uebersteht Neustarts)
//! ```

pub mod error;
pub mod memory;
pub mod registry;
pub mod sqlite;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use registry::{FreigabeErgebnis, HostRecord, RegistrierErgebnis, RegistryConfig, RendezvousRegistry};
pub use sqlite::SqliteStore;
pub use store::{store_oeffnen, RegistryStore, StoreBackend, StoreConfig};
