//! Per-URL cookie jar.
//!
//! A [`CookieJar`] is a short-lived view over the shared
//! [`CookieStore`](crate::cookies::CookieStore), scoped to the URL of one
//! request. It derives three things from the URL:
//!
//! - `domain`: `.` + host (e.g. `.a.example.com`),
//! - `path`: the URL path without its last segment (`/app/page` → `/app`),
//!   or `/`,
//! - `secure`: whether the scheme is `https`.
//!
//! ## Matching
//! A stored cookie is visible to the jar when the jar's `domain + path`
//! **contains** the cookie's group key as a substring, the cookie has not
//! expired, and the cookie is not `Secure` or the jar is secure. Substring
//! containment approximates domain-suffix and path-prefix matching; it is
//! looser than RFC 6265 (e.g. `/app` also matches `/apple`) and is kept as is.
//!
//! ## Writing
//! `path` and `domain` passed to [`CookieJar::write`] are only honored when
//! consistent with the jar's own scope. Anything else silently falls back to
//! the jar's scope, so a response can never plant cookies for an unrelated site.
use std::sync::{Mutex, MutexGuard, PoisonError};

use url::Url;

use crate::cookies::cookie::{encode_value, Cookie, CookieWrite, Expiry};
use crate::cookies::set_cookie::{parse_set_cookies, SetCookie};
use crate::cookies::store::CookieStoreHandle;
use crate::errors::CookieError;

pub struct CookieJar {
    url: Url,
    domain: String,
    path: String,
    secure: bool,
    store: CookieStoreHandle,
    /// Cookies seen as visible by the last read, stringify or remove.
    cookies: Mutex<Vec<Cookie>>,
}

impl std::fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieJar")
            .field("url", &self.url.as_str())
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

impl CookieJar {
    /// Creates a jar for `url`.
    ///
    /// Fails when `url` does not parse or has no host.
    pub fn new(url: &str, store: CookieStoreHandle) -> Result<Self, CookieError> {
        let parsed = Url::parse(url).map_err(|e| CookieError::invalid_url(url, e))?;
        Self::from_url(parsed, store)
    }

    pub fn from_url(url: Url, store: CookieStoreHandle) -> Result<Self, CookieError> {
        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host,
            _ => return Err(CookieError::MissingHost(url.to_string())),
        };

        let domain = format!(".{host}");
        let path = url
            .path()
            .rsplit_once('/')
            .map_or("/", |(dir, _)| if dir.is_empty() { "/" } else { dir })
            .to_string();
        let secure = url.scheme() == "https";

        Ok(Self {
            url,
            domain,
            path,
            secure,
            store,
            cookies: Mutex::new(Vec::new()),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// `domain + path`, the string group keys are matched against.
    pub fn scope_key(&self) -> String {
        format!("{}{}", self.domain, self.path)
    }

    /// Stores a cookie and flushes the store.
    ///
    /// The value is percent-encoded; `expires: None` makes a session cookie and
    /// `max_age` wins over `expires`. A cookie without a name is dropped.
    pub fn write(&self, cookie: CookieWrite) -> &Self {
        let CookieWrite { name, value, expires, max_age, path, domain, secure } = cookie;

        if name.is_empty() {
            log::warn!("cookie jar {}: ignoring cookie without a name", self.url);
            return self;
        }

        let expires = match max_age {
            Some(seconds) => Expiry::At(self.store.now_millis().saturating_add(seconds.saturating_mul(1000))),
            None => expires.unwrap_or(Expiry::Session),
        };

        let cookie = Cookie {
            name,
            value: value.as_deref().map(encode_value).unwrap_or_default(),
            secure,
            expires,
            path: self.resolve_path(path.as_deref()),
            domain: self.resolve_domain(domain.as_deref()),
        };

        self.store.upsert(cookie);
        self
    }

    /// Decoded value of the first visible cookie called `name`.
    pub fn read(&self, name: &str) -> Option<String> {
        self.refresh()
            .into_iter()
            .find(|c| c.name == name)
            .map(|c| c.decoded_value())
    }

    /// Deletes every cookie called `name` from the **whole store**, not just
    /// this jar's scope.
    pub fn remove(&self, name: &str) -> &Self {
        let removed = self.store.remove_named(name);
        log::debug!("cookie jar {}: removed {} cookie(s) named {:?}", self.url, removed, name);
        self.refresh();
        self
    }

    /// The `Cookie` request header value: visible cookies as `name=value`
    /// joined by `; `. Empty when nothing matches.
    pub fn stringify(&self) -> String {
        self.refresh()
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Cookies found visible by the most recent read, stringify or remove.
    pub fn cookies(&self) -> Vec<Cookie> {
        self.cached().clone()
    }

    /// Splits and parses a (possibly combined) `Set-Cookie` header value.
    pub fn parse_set_cookie(raw: &str) -> Vec<SetCookie> {
        parse_set_cookies(raw)
    }

    /// Parses `raw` and writes every cookie found. Returns how many were written.
    ///
    /// Each cookie is a separate write, so the backend is rewritten once per cookie.
    pub fn store_set_cookie(&self, raw: &str) -> usize {
        let parsed = Self::parse_set_cookie(raw);
        let count = parsed.len();
        for cookie in parsed {
            self.write(cookie.into());
        }
        count
    }

    fn refresh(&self) -> Vec<Cookie> {
        let visible = self.store.visible(&self.scope_key(), self.secure);
        *self.cached() = visible.clone();
        visible
    }

    fn cached(&self) -> MutexGuard<'_, Vec<Cookie>> {
        self.cookies.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve_path(&self, candidate: Option<&str>) -> String {
        match candidate {
            Some(p) if !p.is_empty() && self.path.contains(p) => p.to_string(),
            Some(p) if !p.is_empty() => {
                log::debug!("cookie jar {}: path {:?} outside {:?}, using jar path", self.url, p, self.path);
                self.path.clone()
            }
            _ => self.path.clone(),
        }
    }

    fn resolve_domain(&self, candidate: Option<&str>) -> String {
        let candidate = match candidate.map(str::trim) {
            Some(d) if !d.is_empty() => d.to_ascii_lowercase(),
            _ => return self.domain.clone(),
        };

        let dotted = if candidate.starts_with('.') { candidate } else { format!(".{candidate}") };
        if self.domain.contains(dotted.as_str()) {
            dotted
        } else {
            log::debug!("cookie jar {}: domain {:?} outside {:?}, using jar domain", self.url, dotted, self.domain);
            self.domain.clone()
        }
    }
}
