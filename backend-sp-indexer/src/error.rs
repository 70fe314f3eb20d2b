use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP GET failed: {0}")]
    HttpGet(String),
    #[error("indexer answered with status {0}")]
    HttpStatus(u16),
    #[error("indexer rate limit reached")]
    RateLimited { retry_after: Option<Duration> },
    #[error("failed to read response body: {0}")]
    ResponseBody(String),
    #[error("malformed indexer data: {0}")]
    InvalidData(String),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for spdetect_core::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::RateLimited { retry_after } => spdetect_core::Error::RateLimited { retry_after },
            e => spdetect_core::Error::Backend(Box::new(e)),
        }
    }
}
