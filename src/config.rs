//! Cookie store configuration.
//!
//! `CookieConfig` controls where a [`CookieStore`](crate::cookies::CookieStore)
//! keeps its state inside the key-value backend and what happens when the
//! store is opened at process start.
//!
//! `CookieConfig` provides defaults via [`Default`] and a fluent
//! [`CookieConfig::builder()`] for customization with validation.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use cookie_keeper::config::CookieConfig;
//! let cfg = CookieConfig::default();
//! assert_eq!(cfg.storage_key, "cookie-jar");
//! assert!(cfg.evict_on_open);
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use cookie_keeper::config::CookieConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = CookieConfig::builder()
//!     .storage_key("my-app-cookies")
//!     .evict_on_open(false)
//!     .build()?; // returns Result<CookieConfig, CookieConfigError>
//! # Ok(()) }
//! ```
//!
//! # Fields (summary)
//! - `storage_key`: Key under which the whole cookie store is saved (default: `cookie-jar`).
//! - `evict_on_open`: Run the eviction pass when the store is opened (default: `true`).
//!
//! # Errors
//!
//! Builder validation returns [`CookieConfigError`] when the storage key is
//! empty or only whitespace.

use std::fmt;

/// Key used by default to save the cookie store in the key-value backend.
pub const DEFAULT_STORAGE_KEY: &str = "cookie-jar";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieConfig {
    pub storage_key: String,
    pub evict_on_open: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            evict_on_open: true,
        }
    }
}

impl CookieConfig {
    pub fn builder() -> CookieConfigBuilder {
        CookieConfigBuilder::default()
    }
}

/// Builder for [`CookieConfig`].
#[derive(Debug, Clone, Default)]
pub struct CookieConfigBuilder {
    inner: CookieConfig,
}

impl CookieConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut CookieConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn storage_key<S: Into<String>>(self, key: S) -> Self { self.map(|c| c.storage_key = key.into()) }
    pub fn evict_on_open(self, on: bool) -> Self { self.map(|c| c.evict_on_open = on) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut CookieConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<CookieConfig, CookieConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieConfigError {
    EmptyStorageKey,
}

impl fmt::Display for CookieConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CookieConfigError::EmptyStorageKey =>
                write!(f, "storage_key must not be empty"),
        }
    }
}
impl std::error::Error for CookieConfigError {}

fn validate(c: &CookieConfig) -> Result<(), CookieConfigError> {
    if c.storage_key.trim().is_empty() {
        return Err(CookieConfigError::EmptyStorageKey);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_default() {
        let cfg = CookieConfig::builder().build().unwrap();
        assert_eq!(cfg, CookieConfig::default());
    }

    #[test]
    fn builder_overrides_fields() {
        let cfg = CookieConfig::builder()
            .storage_key("jar")
            .evict_on_open(false)
            .build()
            .unwrap();
        assert_eq!(cfg.storage_key, "jar");
        assert!(!cfg.evict_on_open);
    }

    #[test]
    fn blank_storage_key_is_rejected() {
        let err = CookieConfig::builder().storage_key("  ").build().unwrap_err();
        assert_eq!(err, CookieConfigError::EmptyStorageKey);
        assert_eq!(err.to_string(), "storage_key must not be empty");
    }

    #[test]
    fn with_applies_closure() {
        let cfg = CookieConfig::builder()
            .with(|c| {
                c.storage_key = "k".into();
                c.evict_on_open = false;
            })
            .build()
            .unwrap();
        assert_eq!(cfg.storage_key, "k");
        assert!(!cfg.evict_on_open);
    }
}
