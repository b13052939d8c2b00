//! Cookie store.
//!
//! The [`CookieStore`] is the process-wide cache of **all** known cookies,
//! grouped by `domain + path`. It is loaded once from a
//! [`KeyValueStore`](crate::storage::KeyValueStore) and written back in full
//! after every mutation. Jars never keep cookies themselves; they read and
//! write through a shared [`CookieStoreHandle`].
//!
//! ## Lifecycle
//! - [`CookieStore::open`] (or [`CookieStore::start`]) at process start: load
//!   the blob and run the eviction pass, which drops expired cookies **and**
//!   session cookies left by the previous process.
//! - [`CookieStore::jar`] per outgoing request URL.
//! - Every write, remove, eviction and lazy expiry during reads flushes the
//!   whole store.
//!
//! ## Persistence
//! Flushes are best-effort: a backend failure is logged and otherwise
//! ignored. A missing or undecodable blob loads as an empty store.
//!
//! ## Concurrency
//! State sits behind a `RwLock` so the store can be shared as
//! `Arc<CookieStore>`. Every operation takes the write lock for its full
//! duration, including the flush.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use cookie_keeper::config::CookieConfig;
//! use cookie_keeper::cookies::{CookieStore, CookieWrite};
//! use cookie_keeper::storage::InMemoryKeyValueStore;
//!
//! let store = CookieStore::open(Arc::new(InMemoryKeyValueStore::new()), &CookieConfig::default());
//! let jar = store.jar("https://example.com/app/page").unwrap();
//! jar.write(CookieWrite::new("sid", "abc123"));
//! assert_eq!(jar.stringify(), "sid=abc123");
//! ```
use std::fmt::{self, Debug};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::CookieConfig;
use crate::cookies::clock::{ClockHandle, SystemClock};
use crate::cookies::cookie::{Cookie, CookieGroup};
use crate::cookies::jar::CookieJar;
use crate::errors::CookieError;
use crate::storage::KeyValueStoreHandle;

/// A handle to the shared cookie store.
pub type CookieStoreHandle = Arc<CookieStore>;

/// Complete cookie state: group key (`domain + path`) to group.
///
/// Serializes to exactly the blob saved in the key-value backend. Groups and
/// the cookies inside them iterate in the order they were first written; that
/// order decides which same-named cookie `read` returns and survives reloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CookieSnapshot {
    pub groups: IndexMap<String, CookieGroup>,
}

impl CookieSnapshot {
    /// Number of cookies over all groups.
    pub fn len(&self) -> usize {
        self.groups.values().map(|g| g.map.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, key: &str) -> Option<&CookieGroup> {
        self.groups.get(key)
    }

    /// All cookies in store order.
    pub fn cookies(&self) -> impl Iterator<Item = &Cookie> {
        self.groups.values().flat_map(|g| g.map.values())
    }

    fn prune_empty_groups(&mut self) {
        self.groups.retain(|_, g| !g.is_empty());
    }
}

pub struct CookieStore {
    backend: KeyValueStoreHandle,
    clock: ClockHandle,
    storage_key: String,
    evict_on_open: bool,
    /// `None` until the first access loads the blob.
    state: RwLock<Option<CookieSnapshot>>,
}

impl Debug for CookieStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieStore")
            .field("storage_key", &self.storage_key)
            .finish_non_exhaustive()
    }
}

impl CookieStore {
    /// Creates a store on top of `backend`. Nothing is read until the first
    /// access or an explicit [`load`](Self::load).
    pub fn new(backend: KeyValueStoreHandle, config: &CookieConfig) -> Self {
        Self {
            backend,
            clock: Arc::new(SystemClock),
            storage_key: config.storage_key.clone(),
            evict_on_open: config.evict_on_open,
            state: RwLock::new(None),
        }
    }

    /// Replaces the time source used for expiry checks.
    pub fn with_clock(mut self, clock: ClockHandle) -> Self {
        self.clock = clock;
        self
    }

    /// Process-start entry point: [`new`](Self::new) followed by [`start`](Self::start).
    pub fn open(backend: KeyValueStoreHandle, config: &CookieConfig) -> CookieStoreHandle {
        Self::new(backend, config).start()
    }

    /// Loads the persisted state and, when configured, runs the eviction pass.
    pub fn start(self) -> CookieStoreHandle {
        self.load();
        if self.evict_on_open {
            self.evict_expired();
        }
        Arc::new(self)
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Creates a jar scoped to `url` that reads and writes through this store.
    pub fn jar(self: &Arc<Self>, url: &str) -> Result<CookieJar, CookieError> {
        CookieJar::new(url, Arc::clone(self))
    }

    /// Reads the persisted blob. Only the first call (or first access) has an effect.
    pub fn load(&self) {
        let mut state = self.write_state();
        if state.is_none() {
            *state = Some(self.read_backend());
        }
    }

    /// Writes the whole store to the backend.
    pub fn flush(&self) {
        self.mutate(|_, _| ((), true));
    }

    /// Removes every session cookie and every cookie whose expiry lies in the
    /// past, drops emptied groups and flushes. Returns the number of cookies removed.
    pub fn evict_expired(&self) -> usize {
        self.mutate(|snapshot, now| {
            let mut removed = 0;
            for group in snapshot.groups.values_mut() {
                let before = group.map.len();
                group.map.retain(|_, c| !c.expires.is_stale_at(now));
                removed += before - group.map.len();
            }
            snapshot.prune_empty_groups();

            log::debug!("cookie store {:?}: eviction removed {} cookie(s)", self.storage_key, removed);
            (removed, true)
        })
    }

    /// Removes all cookies and flushes.
    pub fn clear(&self) {
        self.mutate(|snapshot, _| {
            snapshot.groups.clear();
            ((), true)
        });
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> CookieSnapshot {
        self.mutate(|snapshot, _| (snapshot.clone(), false))
    }

    /// Inserts or replaces `cookie` in the group for its `domain + path`.
    pub(crate) fn upsert(&self, cookie: Cookie) {
        self.mutate(|snapshot, _| {
            snapshot
                .groups
                .entry(cookie.group_key())
                .or_insert_with(|| CookieGroup::new(cookie.domain.as_str(), cookie.path.as_str()))
                .map
                .insert(cookie.name.clone(), cookie);
            ((), true)
        });
    }

    /// Cookies visible from `scope` (`domain + path` of a jar).
    ///
    /// A group matches when `scope` contains its key. Expired cookies found in
    /// matching groups are deleted on the spot, and the store is flushed if
    /// that happened. Secure cookies are skipped for insecure scopes but kept.
    pub(crate) fn visible(&self, scope: &str, secure: bool) -> Vec<Cookie> {
        self.mutate(|snapshot, now| {
            let mut visible = Vec::new();
            let mut expired = 0;

            for (key, group) in snapshot.groups.iter_mut() {
                if !scope.contains(key.as_str()) {
                    continue;
                }

                let before = group.map.len();
                group.map.retain(|_, c| c.expires.is_live_at(now));
                expired += before - group.map.len();

                visible.extend(group.map.values().filter(|c| !c.secure || secure).cloned());
            }

            if expired > 0 {
                snapshot.prune_empty_groups();
                log::debug!("cookie store {:?}: dropped {} expired cookie(s) for {}", self.storage_key, expired, scope);
            }
            (visible, expired > 0)
        })
    }

    /// Removes every cookie called `name`, whatever its domain or path.
    pub(crate) fn remove_named(&self, name: &str) -> usize {
        self.mutate(|snapshot, _| {
            let removed = snapshot
                .groups
                .values_mut()
                .filter_map(|g| g.map.shift_remove(name))
                .count();
            snapshot.prune_empty_groups();
            (removed, true)
        })
    }

    /// Runs `f` on the loaded state; flushes afterwards when `f` reports a change.
    fn mutate<R>(&self, f: impl FnOnce(&mut CookieSnapshot, i64) -> (R, bool)) -> R {
        let now = self.clock.now_millis();
        let mut state = self.write_state();
        let snapshot = state.get_or_insert_with(|| self.read_backend());

        let (result, dirty) = f(snapshot, now);
        if dirty {
            self.persist(snapshot);
        }
        result
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, Option<CookieSnapshot>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_backend(&self) -> CookieSnapshot {
        let blob = match self.backend.get_sync(&self.storage_key) {
            Ok(Some(blob)) => blob,
            Ok(None) => return CookieSnapshot::default(),
            Err(e) => {
                log::warn!("cookie store {:?}: cannot read backend, starting empty: {:#}", self.storage_key, e);
                return CookieSnapshot::default();
            }
        };

        match serde_json::from_value::<CookieSnapshot>(blob) {
            Ok(mut snapshot) => {
                snapshot.prune_empty_groups();
                log::debug!("cookie store {:?}: loaded {} cookie(s)", self.storage_key, snapshot.len());
                snapshot
            }
            Err(e) => {
                log::warn!("cookie store {:?}: discarding undecodable state: {}", self.storage_key, e);
                CookieSnapshot::default()
            }
        }
    }

    fn persist(&self, snapshot: &CookieSnapshot) {
        let blob = match serde_json::to_value(snapshot) {
            Ok(blob) => blob,
            Err(e) => {
                log::error!("cookie store {:?}: cannot serialize state: {}", self.storage_key, e);
                return;
            }
        };

        if let Err(e) = self.backend.set(&self.storage_key, blob) {
            log::warn!("cookie store {:?}: flush failed: {:#}", self.storage_key, e);
        }
    }
}
