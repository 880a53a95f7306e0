use thiserror::Error;

#[derive(Error, Debug)]
pub enum MountError {
    #[error("tmpfs mount failed: {0}")]
    TmpfsFailed(String),

    #[error("bind mount failed: {0}")]
    BindFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("system error: {0}")]
    System(#[from] nix::errno::Errno),
}
