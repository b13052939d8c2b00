use http::header::{HeaderName, HeaderValue, COOKIE, REFERER, SET_COOKIE};
use http::HeaderMap;

use crate::cookies::CookieJar;
use crate::net::FetchError;

/// Cookie related request options.
///
/// When `with_credentials` is set and both XSRF names are given, the value of
/// the `xsrf_cookie_name` cookie is copied into the `xsrf_header_name` header.
/// A missing, empty or unsendable token leaves the header out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCookieOptions {
    pub with_credentials: bool,
    pub xsrf_cookie_name: Option<String>,
    pub xsrf_header_name: Option<String>,
}

impl RequestCookieOptions {
    pub fn xsrf(cookie_name: impl Into<String>, header_name: impl Into<String>) -> Self {
        Self {
            with_credentials: true,
            xsrf_cookie_name: Some(cookie_name.into()),
            xsrf_header_name: Some(header_name.into()),
        }
    }
}

/// Prepares outgoing headers for a request to `jar.url()`.
///
/// - `Referer` is removed (storage-less hosts refuse to send it).
/// - `Cookie` is set to `jar.stringify()` when that is not empty, replacing
///   any `Cookie` header already present.
/// - The XSRF header is set as described on [`RequestCookieOptions`].
pub fn prepare_request_headers(
    jar: &CookieJar,
    headers: &mut HeaderMap,
    options: &RequestCookieOptions,
) -> Result<(), FetchError> {
    headers.remove(REFERER);

    let cookies = jar.stringify();
    if !cookies.is_empty() {
        headers.insert(COOKIE, HeaderValue::from_str(&cookies)?);
    }

    if options.with_credentials {
        if let (Some(cookie_name), Some(header_name)) = (&options.xsrf_cookie_name, &options.xsrf_header_name) {
            if let Some(token) = jar.read(cookie_name).filter(|t| !t.is_empty()) {
                let name = HeaderName::from_bytes(header_name.as_bytes())?;
                match HeaderValue::from_str(&token) {
                    Ok(value) => {
                        headers.insert(name, value);
                    }
                    Err(_) => log::warn!(
                        "cookie jar {}: {:?} is not a valid {} value, skipping",
                        jar.url(),
                        cookie_name,
                        header_name
                    ),
                }
            }
        }
    }

    Ok(())
}

/// Writes every `Set-Cookie` of a response into `jar`. Returns how many
/// cookies were stored.
pub fn store_response_cookies(jar: &CookieJar, headers: &HeaderMap) -> usize {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .map(|value| jar.store_set_cookie(&String::from_utf8_lossy(value.as_bytes())))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CookieConfig;
    use crate::cookies::{CookieStore, CookieStoreHandle, CookieWrite};
    use crate::storage::InMemoryKeyValueStore;
    use std::sync::Arc;

    fn store() -> CookieStoreHandle {
        CookieStore::open(Arc::new(InMemoryKeyValueStore::new()), &CookieConfig::default())
    }

    #[test]
    fn referer_is_stripped_and_cookie_attached() {
        let store = store();
        let jar = store.jar("https://example.com/app/page").unwrap();
        jar.write(CookieWrite::new("sid", "abc"));

        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static("https://elsewhere.test/"));
        headers.insert(COOKIE, HeaderValue::from_static("stale=1"));

        prepare_request_headers(&jar, &mut headers, &RequestCookieOptions::default()).unwrap();

        assert!(headers.get(REFERER).is_none());
        assert_eq!(headers.get(COOKIE).unwrap(), "sid=abc");
    }

    #[test]
    fn no_cookie_header_without_cookies() {
        let store = store();
        let jar = store.jar("https://example.com/").unwrap();

        let mut headers = HeaderMap::new();
        prepare_request_headers(&jar, &mut headers, &RequestCookieOptions::default()).unwrap();
        assert!(headers.get(COOKIE).is_none());
    }

    #[test]
    fn xsrf_header_copies_cookie_value() {
        let store = store();
        let jar = store.jar("https://example.com/").unwrap();
        jar.write(CookieWrite::new("XSRF-TOKEN", "t0k en"));

        let mut headers = HeaderMap::new();
        let options = RequestCookieOptions::xsrf("XSRF-TOKEN", "X-XSRF-TOKEN");
        prepare_request_headers(&jar, &mut headers, &options).unwrap();
        assert_eq!(headers.get("x-xsrf-token").unwrap(), "t0k en");

        let mut headers = HeaderMap::new();
        let options = RequestCookieOptions { with_credentials: false, ..options };
        prepare_request_headers(&jar, &mut headers, &options).unwrap();
        assert!(headers.get("x-xsrf-token").is_none());
    }

    #[test]
    fn unsendable_xsrf_token_is_skipped() {
        let store = store();
        let jar = store.jar("https://example.com/").unwrap();
        jar.store_set_cookie("XSRF-TOKEN=%0D%0A; Path=/");
        jar.write(CookieWrite::new("sid", "abc"));

        let mut headers = HeaderMap::new();
        let options = RequestCookieOptions::xsrf("XSRF-TOKEN", "X-XSRF-TOKEN");
        prepare_request_headers(&jar, &mut headers, &options).unwrap();

        assert!(headers.get("x-xsrf-token").is_none());
        assert_eq!(headers.get(COOKIE).unwrap(), "XSRF-TOKEN=%0D%0A; sid=abc");
    }

    #[test]
    fn invalid_xsrf_header_name_is_an_error() {
        let store = store();
        let jar = store.jar("https://example.com/").unwrap();
        jar.write(CookieWrite::new("XSRF-TOKEN", "t"));

        let mut headers = HeaderMap::new();
        let options = RequestCookieOptions::xsrf("XSRF-TOKEN", "bad header");
        assert!(matches!(
            prepare_request_headers(&jar, &mut headers, &options),
            Err(FetchError::HeaderName(_))
        ));
    }

    #[test]
    fn every_set_cookie_header_is_stored() {
        let store = store();
        let jar = store.jar("https://example.com/app/page").unwrap();

        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1; Path=/"));
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("b=2; Expires=Thu, 01 Jan 2099 00:00:00 GMT, c=3"),
        );

        assert_eq!(store_response_cookies(&jar, &headers), 3);
        assert_eq!(jar.stringify(), "a=1; b=2; c=3");
    }
}
