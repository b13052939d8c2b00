//! JSON file backed key-value store.
//!
//! `JsonFileKeyValueStore` keeps **all keys** in a single JSON object on disk:
//!
//! ```text
//! { "<key>": <blob>, ... }
//! ```
//!
//! ### I/O characteristics & caveats
//! - Every `set` **reads then rewrites** the entire file.
//! - A missing file reads as an empty object; it is created on the first `set`.
//! - Writes go to a sibling temp file which is then renamed over the target,
//!   so readers never observe a half-written file.
//! - Access within one process is serialized by a mutex. Several processes
//!   writing the same file will lose updates.
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use serde_json::Value;

use crate::storage::area::KeyValueStore;

/// On-disk representation of the file.
type FileContents = BTreeMap<String, Value>;

pub struct JsonFileKeyValueStore {
    /// Path to the JSON file.
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonFileKeyValueStore {
    /// Creates a store backed by the file at `path`. The file is not touched
    /// until the first read or write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the full file. A missing file is an empty map.
    fn load_file(&self) -> Result<FileContents> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(FileContents::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };

        if contents.trim().is_empty() {
            return Ok(FileContents::new());
        }

        serde_json::from_str(&contents)
            .with_context(|| format!("decoding {}", self.path.display()))
    }

    /// Serializes and writes the full file (pretty-printed).
    fn save_file(&self, file: &FileContents) -> Result<()> {
        let contents = serde_json::to_vec_pretty(file)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, contents).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileKeyValueStore {
    fn get_sync(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("json store lock poisoned"))?;
        let mut file = self.load_file()?;
        Ok(file.remove(key))
    }

    fn set(&self, key: &str, blob: Value) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("json store lock poisoned"))?;
        let mut file = self.load_file()?;
        file.insert(key.to_string(), blob);
        self.save_file(&file)
    }
}
