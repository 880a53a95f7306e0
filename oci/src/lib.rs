//! Container-root primitives shared by the CDI hooks.
//!
//! A hook runs on the host but operates on paths that resolve through
//! filesystem state owned by the container. Everything here exists to keep
//! that resolution contained: paths handed to a [`ContainerRoot`] can never
//! escape it, no matter what symlinks the container image ships.

mod error;
mod fragment;
mod root;
mod state;

pub use error::OciError;
pub use fragment::create_ldsoconfd_file;
pub use root::ContainerRoot;
pub use state::ContainerState;
