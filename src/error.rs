//! Error taxonomy shared by every workflow.
//!
//! Nothing in the crate recovers from these locally: workflows propagate them
//! with `?` and the UI layer decides how to show them.

use thiserror::Error;

pub type LabResult<T> = Result<T, LabError>;

#[derive(Debug, Error)]
pub enum LabError {
    /// Transport failure talking to arXiv or the completion service
    #[error("network error: {0}")]
    Network(String),

    /// The remote service answered with a non-success status
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The uploaded document could not be decoded
    #[error("could not decode document: {0}")]
    Decode(String),

    /// Missing API key, bad settings file, invalid argument
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LabError {
    /// True for failures of a remote call (transport or status).
    pub fn is_network(&self) -> bool {
        matches!(self, LabError::Network(_) | LabError::Api { .. })
    }
}

impl From<reqwest::Error> for LabError {
    fn from(e: reqwest::Error) -> Self {
        LabError::Network(e.to_string())
    }
}
