//! Request-time cookie integration.
//!
//! The cookie lifecycle as seen by an HTTP client is: build a jar for the
//! request URL, put `jar.stringify()` in the `Cookie` header before sending,
//! and feed every `Set-Cookie` of the response back through the **same** jar.
//!
//! [`prepare_request_headers`] and [`store_response_cookies`] do the two
//! halves over an `http::HeaderMap`, for clients that dispatch requests
//! themselves. [`fetch`] does the whole round trip with `reqwest`.

mod fetch;
mod headers;
mod response;

pub use fetch::{fetch, FetchError, FetchRequest};
pub use headers::{prepare_request_headers, store_response_cookies, RequestCookieOptions};
pub use response::Response;
