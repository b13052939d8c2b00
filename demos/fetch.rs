//! Fetches a URL twice with a persistent cookie store.
//!
//! ```text
//! RUST_LOG=debug cargo run --example fetch -- https://httpbin.org/cookies/set?demo=1 cookies.json
//! ```
//!
//! The second request carries the cookies the first response set. Run it
//! again and session cookies from the previous run are gone, while cookies
//! with an expiry date survive.
use std::path::PathBuf;
use std::sync::Arc;

use cookie_keeper::config::CookieConfig;
use cookie_keeper::cookies::CookieStore;
use cookie_keeper::net::{fetch, FetchError, FetchRequest};
use cookie_keeper::storage::JsonFileKeyValueStore;

#[tokio::main]
async fn main() -> Result<(), FetchError> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let url = args.next().unwrap_or_else(|| "https://httpbin.org/cookies/set?demo=1".to_string());
    let path = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("cookies.json"));

    // Opening the store runs the eviction pass: session cookies of the previous
    // run are removed here.
    let store = CookieStore::open(Arc::new(JsonFileKeyValueStore::new(&path)), &CookieConfig::default());
    println!("loaded {} cookie(s) from {}", store.snapshot().len(), path.display());

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;

    for round in 1..=2 {
        let jar = store.jar(&url)?;
        println!("[{round}] Cookie: {:?}", jar.stringify());

        let res = fetch(&client, &store, FetchRequest::get(&url)).await?;
        println!("[{round}] {} {}", res.status, res.status_text);
    }

    for cookie in store.snapshot().cookies() {
        println!("{}{} {}={} ({:?})", cookie.domain, cookie.path, cookie.name, cookie.value, cookie.expires);
    }

    Ok(())
}
