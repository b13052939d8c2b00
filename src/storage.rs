//! Key-value storage backends for the cookie store.
//!
//! A [`CookieStore`](crate::cookies::CookieStore) keeps its complete state as
//! a single JSON blob under one key of a host-provided key-value store. This
//! module defines that collaborator as the [`KeyValueStore`] trait and ships
//! three implementations:
//!
//! - [`InMemoryKeyValueStore`]: no persistence. Useful for tests and for
//!   clients that only need cookies for the lifetime of the process.
//! - [`JsonFileKeyValueStore`]: all keys in one JSON file on disk.
//! - [`SqliteKeyValueStore`]: one row per key in a SQLite database (feature
//!   `sqlite_store`, enabled by default).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cookie_keeper::config::CookieConfig;
//! use cookie_keeper::cookies::CookieStore;
//! use cookie_keeper::storage::JsonFileKeyValueStore;
//!
//! let backend = Arc::new(JsonFileKeyValueStore::new("cookies.json"));
//! let store = CookieStore::open(backend, &CookieConfig::default());
//! ```

use std::sync::Arc;

/// Key-value store interface.
pub mod area;
/// In-memory key-value store.
pub mod in_memory;
/// JSON file backed key-value store.
pub mod json_file;
/// SQLite backed key-value store.
#[cfg(feature = "sqlite_store")]
pub mod sqlite_store;

pub use area::KeyValueStore;
pub use in_memory::InMemoryKeyValueStore;
pub use json_file::JsonFileKeyValueStore;
#[cfg(feature = "sqlite_store")]
pub use sqlite_store::SqliteKeyValueStore;

/// Shared, type-erased handle to a key-value backend.
pub type KeyValueStoreHandle = Arc<dyn KeyValueStore>;
