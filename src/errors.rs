use crate::config::CookieConfigError;

#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    #[error("Invalid URL: {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] CookieConfigError),
}

impl CookieError {
    pub(crate) fn invalid_url(url: &str, reason: impl ToString) -> Self {
        CookieError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
