use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IesError {
    #[error("IES file not found: {0:?}")]
    FileNotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed header, bad numeric token or a declared-vs-actual count mismatch.
    /// The parse is aborted and no table is produced.
    #[error("Invalid IES format: {0}")]
    Format(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, IesError>;
