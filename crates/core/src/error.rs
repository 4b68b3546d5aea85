use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProbeError>;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Probe task failed: {0}")]
    TaskError(#[source] tokio::task::JoinError),

    #[error("Request is missing field: {0}")]
    MissingField(String),

    #[error("Request field is not a string: {0}")]
    InvalidField(String),

    #[error("Failed to list {}: {source}", path.display())]
    ScanError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProbeError {
    /// Stable name reported in the failure envelope.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::TaskError(_) => "TaskError",
            Self::MissingField(_) => "MissingField",
            Self::InvalidField(_) => "InvalidField",
            Self::ScanError { .. } => "ScanError",
        }
    }
}
