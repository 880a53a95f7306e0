pub mod cuda_compat;
pub mod device_nodes;
pub mod soname_symlinks;
pub mod update_ldcache;

pub use cuda_compat::CudaCompatArgs;
pub use device_nodes::DisableDeviceNodesArgs;
pub use soname_symlinks::SonameSymlinksArgs;
pub use update_ldcache::UpdateLdcacheArgs;

use std::path::{Path, PathBuf};

/// Resolves the configured ldconfig path to a host path.
///
/// A leading `@` marks the value as referring to the host filesystem in
/// runtime configuration files; the hook always resolves on the host, so
/// the marker is simply stripped.
pub(crate) fn ldconfig_host_path(configured: &str) -> PathBuf {
    PathBuf::from(configured.strip_prefix('@').unwrap_or(configured))
}

pub(crate) fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
