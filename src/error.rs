//! Error taxonomy of the harness.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The harness was built in a way that forbids the request, e.g.
    /// attaching a fault with an error rate of 0.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("unknown link '{link}'")]
    NotFound { link: String },

    #[error("index {index} out of range (must be < {limit})")]
    OutOfRange { index: usize, limit: usize },

    #[error("invalid placement: {0}")]
    InvalidPlacement(String),

    #[error("engine failure: {0:#}")]
    EngineFailure(#[from] anyhow::Error),

    #[error("scenario: {0}")]
    Scenario(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn not_found(link: &str) -> Self {
        Error::NotFound {
            link: link.to_string(),
        }
    }
}
