//! Cookies: [`CookieStore`], [`CookieJar`] and the types they share.
//!
//! The store owns every cookie the client knows about and persists them
//! through a [`KeyValueStore`](crate::storage::KeyValueStore). A jar is a
//! per-request view over the store, scoped to one URL.
//!
//! # Typical usage
//! ```rust
//! use std::sync::Arc;
//! use cookie_keeper::config::CookieConfig;
//! use cookie_keeper::cookies::CookieStore;
//! use cookie_keeper::storage::InMemoryKeyValueStore;
//!
//! // Once per process
//! let store = CookieStore::open(Arc::new(InMemoryKeyValueStore::new()), &CookieConfig::default());
//!
//! // Per request
//! let jar = store.jar("https://example.com/account/login").unwrap();
//! let cookie_header = jar.stringify();
//! assert!(cookie_header.is_empty());
//!
//! // After the response arrives
//! jar.store_set_cookie("sid=abc123; Path=/; HttpOnly");
//! assert_eq!(jar.read("sid").as_deref(), Some("abc123"));
//! ```

mod clock;
mod cookie;
mod jar;
mod set_cookie;
mod store;

pub use clock::{Clock, ClockHandle, ManualClock, SystemClock};

pub use cookie::{Cookie, CookieGroup, CookieWrite, Expiry};

pub use jar::CookieJar;

pub use set_cookie::{parse_set_cookie, parse_set_cookies, split_set_cookie, SetCookie};

pub use store::{CookieSnapshot, CookieStore, CookieStoreHandle};
