use thiserror::Error;

#[derive(Error, Debug)]
pub enum HookError {
    #[error("container state error: {0}")]
    Oci(#[from] hook_oci::OciError),

    #[error("mount error: {0}")]
    Mount(#[from] hook_mount::MountError),

    #[error("exec error: {0}")]
    Exec(#[from] hook_exec::ExecError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no usable container root: {0}")]
    InvalidContainerRoot(String),

    #[error("failed to parse major version from {version:?}")]
    VersionParse { version: String },

    #[error("ldconfig-path must be specified")]
    MissingLdconfigPath,
}
