pub mod config;
pub mod cookies;
pub mod errors;
pub mod net;
pub mod storage;

pub use config::CookieConfig;
pub use cookies::{CookieJar, CookieStore, CookieStoreHandle, CookieWrite, Expiry};
pub use errors::CookieError;
