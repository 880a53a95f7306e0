use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("not an executable regular file: {0:?}")]
    NotARegularFile(PathBuf),

    #[error("failed to spawn {path:?}: {reason}")]
    SpawnFailed { path: PathBuf, reason: String },

    #[error("{path:?} exited with {status}")]
    NonZeroExit {
        path: PathBuf,
        status: std::process::ExitStatus,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("system error: {0}")]
    System(#[from] nix::errno::Errno),
}
