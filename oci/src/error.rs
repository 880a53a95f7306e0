use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OciError {
    #[error("failed to load container state: {0}")]
    State(String),

    #[error("container spec error: {0}")]
    Spec(String),

    #[error("container spec has no root filesystem path")]
    MissingRoot,

    #[error("too many symlinks while resolving {0:?}")]
    TooManySymlinks(PathBuf),

    #[error("path is not valid UTF-8: {0:?}")]
    NonUtf8Path(PathBuf),

    #[error("invalid glob pattern: {0}")]
    InvalidPattern(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<oci_spec::OciSpecError> for OciError {
    fn from(e: oci_spec::OciSpecError) -> Self {
        OciError::Spec(e.to_string())
    }
}

impl From<glob::PatternError> for OciError {
    fn from(e: glob::PatternError) -> Self {
        OciError::InvalidPattern(e.to_string())
    }
}
