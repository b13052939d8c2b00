use std::time::Duration;

use http::header::{InvalidHeaderName, InvalidHeaderValue};
use http::{HeaderMap, Method};

use crate::cookies::CookieStoreHandle;
use crate::errors::CookieError;
use crate::net::headers::{prepare_request_headers, store_response_cookies, RequestCookieOptions};
use crate::net::Response;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("timeout of {0}ms exceeded")]
    Timeout(u128),

    #[error(transparent)]
    Cookie(#[from] CookieError),

    #[error("Invalid header name: {0}")]
    HeaderName(#[from] InvalidHeaderName),

    #[error("Invalid header value: {0}")]
    HeaderValue(#[from] InvalidHeaderValue),

    #[error("Network error: {0}")]
    Net(#[from] reqwest::Error),
}

/// A request to send through [`fetch`].
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    pub timeout: Option<Duration>,
    /// Username and password for HTTP basic authentication.
    pub basic_auth: Option<(String, String)>,
    pub cookies: RequestCookieOptions,
}

impl FetchRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
            basic_auth: None,
            cookies: RequestCookieOptions::default(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self::new(Method::POST, url).body(body)
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((username.into(), password.into()));
        self
    }

    pub fn cookies(mut self, options: RequestCookieOptions) -> Self {
        self.cookies = options;
        self
    }
}

/// Sends `request` with the cookies `store` holds for its URL and stores the
/// cookies the response sets.
///
/// Redirects are followed by `client`; only the final response's `Set-Cookie`
/// headers are seen. Build the client with `redirect::Policy::none()` to
/// handle every hop yourself.
pub async fn fetch(
    client: &reqwest::Client,
    store: &CookieStoreHandle,
    request: FetchRequest,
) -> Result<Response, FetchError> {
    let FetchRequest { method, url, mut headers, body, timeout, basic_auth, cookies } = request;

    let jar = store.jar(&url)?;
    prepare_request_headers(&jar, &mut headers, &cookies)?;

    let mut builder = client.request(method, jar.url().clone()).headers(headers);
    if let Some((username, password)) = basic_auth {
        builder = builder.basic_auth(username, Some(password));
    }
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(body) = body {
        builder = builder.body(body);
    }

    let res = builder.send().await.map_err(|e| classify(e, timeout))?;

    // Fetch results
    let final_url = res.url().clone();
    let status = res.status().as_u16();
    let status_text = res.status().canonical_reason().unwrap_or("Unknown").to_string();
    let headers = res.headers().clone();

    let stored = store_response_cookies(&jar, &headers);
    if stored > 0 {
        log::debug!("fetch {}: stored {} cookie(s)", jar.url(), stored);
    }

    // Fetch body. We don't do streaming
    let body = res.bytes().await.map_err(|e| classify(e, timeout))?.to_vec();

    Ok(Response {
        url: final_url,
        status,
        status_text,
        headers,
        body,
    })
}

fn classify(e: reqwest::Error, timeout: Option<Duration>) -> FetchError {
    match timeout {
        Some(t) if e.is_timeout() => FetchError::Timeout(t.as_millis()),
        _ => FetchError::Net(e),
    }
}
