//! Cookie core types.
//!
//! This module defines the serializable [`Cookie`] record, the [`Expiry`]
//! variant that replaces "number, date or anything else" handling of the
//! expiry attribute, the [`CookieGroup`] storage unit and the [`CookieWrite`]
//! input accepted by [`CookieJar::write`](crate::cookies::CookieJar::write).
//!
//! # Persisted shape
//!
//! ```text
//! {
//!   "name": "sid",
//!   "value": "abc%20123",       // percent-encoded
//!   "secure": false,
//!   "expires": "session",       // or epoch milliseconds, e.g. 1749464294000
//!   "path": "/app",
//!   "domain": ".example.com"
//! }
//! ```

use std::borrow::Cow;
use std::fmt;
use std::time::SystemTime;

use indexmap::IndexMap;
use percent_encoding::{percent_decode_str, percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use time::OffsetDateTime;

use crate::cookies::clock::unix_millis;
use crate::cookies::set_cookie::SetCookie;

const SESSION: &str = "session";

/// Everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`, as `encodeURIComponent` escapes.
const VALUE_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// When a cookie stops being valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Expiry {
    /// Valid until the next eviction pass (the next process start).
    #[default]
    Session,
    /// Valid while the current time is before this instant (epoch milliseconds).
    At(i64),
}

impl Expiry {
    pub fn is_session(&self) -> bool {
        matches!(self, Expiry::Session)
    }

    /// Whether a read at `now` may still see the cookie.
    pub fn is_live_at(&self, now: i64) -> bool {
        match self {
            Expiry::Session => true,
            Expiry::At(at) => *at > now,
        }
    }

    /// Whether the startup eviction pass at `now` drops the cookie.
    pub fn is_stale_at(&self, now: i64) -> bool {
        match self {
            Expiry::Session => true,
            Expiry::At(at) => *at < now,
        }
    }
}

impl From<OffsetDateTime> for Expiry {
    fn from(value: OffsetDateTime) -> Self {
        Expiry::At(unix_millis(value))
    }
}

impl From<SystemTime> for Expiry {
    fn from(value: SystemTime) -> Self {
        OffsetDateTime::from(value).into()
    }
}

impl Serialize for Expiry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Expiry::Session => serializer.serialize_str(SESSION),
            Expiry::At(at) => serializer.serialize_i64(*at),
        }
    }
}

impl<'de> Deserialize<'de> for Expiry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ExpiryVisitor)
    }
}

struct ExpiryVisitor;

impl Visitor<'_> for ExpiryVisitor {
    type Value = Expiry;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"session\" or a timestamp in milliseconds")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Expiry, E> {
        if v == SESSION {
            Ok(Expiry::Session)
        } else {
            Err(E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Expiry, E> {
        Ok(Expiry::At(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Expiry, E> {
        i64::try_from(v)
            .map(Expiry::At)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    // Hosts that store numbers as doubles hand back `1.7e12`-style values.
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Expiry, E> {
        if v.is_finite() {
            Ok(Expiry::At(v as i64))
        } else {
            Err(E::invalid_value(de::Unexpected::Float(v), &self))
        }
    }
}

/// A cookie as stored by the cookie store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name (case-sensitive), unique within its group.
    pub name: String,

    /// Percent-encoded value.
    pub value: String,

    /// If `true`, the cookie is only sent to `https` URLs.
    #[serde(default)]
    pub secure: bool,

    #[serde(default)]
    pub expires: Expiry,

    /// Scope path, e.g. `/app`.
    pub path: String,

    /// Scope domain, always with a leading dot, e.g. `.example.com`.
    pub domain: String,
}

impl Cookie {
    /// The key of the group this cookie belongs to.
    pub fn group_key(&self) -> String {
        group_key(&self.domain, &self.path)
    }

    /// Value with percent-encoding removed. Values that do not decode to
    /// UTF-8 are returned as stored.
    pub fn decoded_value(&self) -> String {
        percent_decode_str(&self.value)
            .decode_utf8()
            .map(Cow::into_owned)
            .unwrap_or_else(|_| self.value.clone())
    }
}

/// Percent-encodes a raw cookie value for storage.
pub(crate) fn encode_value(raw: &str) -> String {
    percent_encode(raw.as_bytes(), VALUE_ESCAPES).to_string()
}

pub(crate) fn group_key(domain: &str, path: &str) -> String {
    format!("{domain}{path}")
}

/// All cookies sharing one `domain + path` scope, in the order they were
/// first written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieGroup {
    pub domain: String,
    pub path: String,
    #[serde(default)]
    pub map: IndexMap<String, Cookie>,
}

impl CookieGroup {
    pub fn new(domain: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            path: path.into(),
            map: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Input for [`CookieJar::write`](crate::cookies::CookieJar::write).
///
/// Only `name` is required. `path` and `domain` are candidates: the jar keeps
/// them only when they are consistent with its own scope.
///
/// ```rust
/// use cookie_keeper::cookies::{CookieWrite, Expiry};
///
/// let w = CookieWrite::new("sid", "abc123")
///     .path("/")
///     .domain("example.com")
///     .expires(Expiry::At(1_900_000_000_000))
///     .secure(true);
/// assert_eq!(w.name, "sid");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieWrite {
    pub name: String,
    /// Raw (not yet encoded) value. `None` stores an empty value.
    pub value: Option<String>,
    /// `None` stores a session cookie.
    pub expires: Option<Expiry>,
    /// Lifetime in seconds from now. Takes precedence over `expires`.
    pub max_age: Option<i64>,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub secure: bool,
}

impl CookieWrite {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// A write without a value.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn expires(mut self, expires: impl Into<Expiry>) -> Self {
        self.expires = Some(expires.into());
        self
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }
}

impl From<SetCookie> for CookieWrite {
    fn from(sc: SetCookie) -> Self {
        Self {
            name: sc.name,
            value: Some(sc.value),
            expires: sc.expires.map(Expiry::from),
            max_age: sc.max_age,
            path: sc.path,
            domain: sc.domain,
            secure: sc.secure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn cookie(expires: Expiry) -> Cookie {
        Cookie {
            name: "sid".into(),
            value: "a%20b".into(),
            secure: false,
            expires,
            path: "/app".into(),
            domain: ".example.com".into(),
        }
    }

    #[test]
    fn expiry_serializes_as_session_or_millis() {
        assert_eq!(serde_json::to_value(Expiry::Session).unwrap(), json!("session"));
        assert_eq!(serde_json::to_value(Expiry::At(1_000)).unwrap(), json!(1000));
    }

    #[test]
    fn expiry_accepts_floats_and_rejects_other_strings() {
        let e: Expiry = serde_json::from_value(json!(1749464294000.0)).unwrap();
        assert_eq!(e, Expiry::At(1_749_464_294_000));

        assert!(serde_json::from_value::<Expiry>(json!("tomorrow")).is_err());
        assert!(serde_json::from_value::<Expiry>(json!(true)).is_err());
    }

    #[test]
    fn live_and_stale_disagree_only_at_the_boundary() {
        let at = Expiry::At(100);
        assert!(at.is_live_at(99));
        assert!(!at.is_live_at(100));
        assert!(!at.is_stale_at(100));
        assert!(at.is_stale_at(101));

        assert!(Expiry::Session.is_live_at(i64::MAX));
        assert!(Expiry::Session.is_stale_at(i64::MIN));
    }

    #[test]
    fn date_like_values_become_epoch_millis() {
        let e: Expiry = datetime!(2025-06-09 10:18:14 UTC).into();
        assert_eq!(e, Expiry::At(1_749_464_294_000));

        let st = SystemTime::UNIX_EPOCH + std::time::Duration::from_millis(1_500);
        assert_eq!(Expiry::from(st), Expiry::At(1_500));
    }

    #[test]
    fn cookie_persisted_shape() {
        let c = cookie(Expiry::Session);
        assert_eq!(
            serde_json::to_value(&c).unwrap(),
            json!({
                "name": "sid",
                "value": "a%20b",
                "secure": false,
                "expires": "session",
                "path": "/app",
                "domain": ".example.com"
            })
        );
        assert_eq!(c.group_key(), ".example.com/app");
        assert_eq!(c.decoded_value(), "a b");
    }

    #[test]
    fn encoding_leaves_uri_component_marks_alone() {
        assert_eq!(encode_value("f(x)*!~'-_."), "f(x)*!~'-_.");
        assert_eq!(encode_value("a b;c=d,ü"), "a%20b%3Bc%3Dd%2C%C3%BC");
    }

    #[test]
    fn undecodable_value_is_returned_raw() {
        let mut c = cookie(Expiry::Session);
        c.value = "%FF%FE".into();
        assert_eq!(c.decoded_value(), "%FF%FE");
    }

    #[test]
    fn set_cookie_descriptor_converts_to_write() {
        let sc = SetCookie {
            name: "token".into(),
            value: "xyz".into(),
            expires: Some(datetime!(2025-06-09 10:18:14 UTC)),
            max_age: None,
            path: Some("/".into()),
            domain: Some("example.com".into()),
            secure: true,
            http_only: true,
            same_site: Some("Lax".into()),
        };

        let w = CookieWrite::from(sc);
        assert_eq!(w.name, "token");
        assert_eq!(w.value.as_deref(), Some("xyz"));
        assert_eq!(w.expires, Some(Expiry::At(1_749_464_294_000)));
        assert_eq!(w.path.as_deref(), Some("/"));
        assert_eq!(w.domain.as_deref(), Some("example.com"));
        assert!(w.secure);
    }
}
