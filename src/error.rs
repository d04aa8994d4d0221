//! Error type shared by the API clients, storage and the preview player

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure or non-2xx status from an upstream service
    #[error("HTTP error: {0}")]
    Http(#[from] Box<ureq::Error>),

    /// Response or stored payload did not match the expected schema
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisting a snapshot failed; in-memory state is kept
    #[error("Storage error: {0}")]
    Storage(String),

    /// The service answered with an error body
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// External preview player could not be driven
    #[error("Player error: {0}")]
    Player(String),
}

impl From<ureq::Error> for Error {
    fn from(e: ureq::Error) -> Self {
        Error::Http(Box::new(e))
    }
}
