use std::path::{Path, PathBuf};

use clap::Args;
use hook_oci::{create_ldsoconfd_file, ContainerRoot, ContainerState};

use crate::error::HookError;

const CUDA_COMPAT_PATH: &str = "/usr/local/cuda/compat";
/// The 00-compat prefix ranks the compat directory above every other
/// library directory on the system.
const CUDA_COMPAT_LDSOCONFD_FILENAME_PATTERN: &str = "00-compat-*.conf";

#[derive(Args, Debug)]
pub struct CudaCompatArgs {
    /// Host driver version; the hook is a no-op unless the compat libraries
    /// in the container carry a strictly higher MAJOR version
    #[arg(long)]
    pub host_driver_version: Option<String>,

    /// Path to the OCI container state; if empty or '-' the state is read
    /// from stdin
    #[arg(long, hide = true)]
    pub container_spec: Option<String>,
}

pub fn run(args: &CudaCompatArgs) -> Result<(), HookError> {
    let Some(host_driver_version) = args
        .host_driver_version
        .as_deref()
        .filter(|v| !v.is_empty())
    else {
        return Ok(());
    };

    let state = ContainerState::load(args.container_spec.as_deref())?;
    let root = state.container_root()?;

    let Some(compat_dir) = forward_compat_dir_in_container(&root, host_driver_version)? else {
        return Ok(());
    };

    let compat_dir = compat_dir.to_string_lossy().into_owned();
    create_ldsoconfd_file(&root, CUDA_COMPAT_LDSOCONFD_FILENAME_PATTERN, &[compat_dir])?;
    Ok(())
}

/// Returns the in-container path of the directory holding the forward
/// compatibility libraries, or `None` when the forward-compat path should
/// not be enabled.
fn forward_compat_dir_in_container(
    root: &ContainerRoot,
    host_driver_version: &str,
) -> Result<Option<PathBuf>, HookError> {
    if !root.has_path(CUDA_COMPAT_PATH) {
        tracing::debug!("no CUDA forward compatibility directory in container");
        return Ok(None);
    }
    if !root.has_path("/etc/ld.so.cache") {
        tracing::debug!("container has no ld cache");
        return Ok(None);
    }

    let libs = match root.glob_files(format!("{CUDA_COMPAT_PATH}/libcuda.so.*.*")) {
        Ok(libs) => libs,
        Err(e) => {
            tracing::warn!(error = %e, "failed to search for compat libraries");
            return Ok(None);
        }
    };

    if libs.is_empty() {
        tracing::debug!("no CUDA forward compatibility libraries in container");
        return Ok(None);
    }
    // Guessing wrong among multiple candidates is worse than doing nothing.
    if libs.len() != 1 {
        tracing::warn!(?libs, "unexpected number of CUDA compat libraries in container");
        return Ok(None);
    }

    let lib = &libs[0];
    let file_name = lib
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let compat_version = file_name
        .strip_prefix("libcuda.so.")
        .unwrap_or(&file_name)
        .to_string();

    let compat_major = extract_major_version(&compat_version)?;
    let host_major = extract_major_version(host_driver_version)?;

    if host_major >= compat_major {
        tracing::debug!(
            host = host_driver_version,
            compat = compat_version.as_str(),
            "compat libraries are not newer than the host driver"
        );
        return Ok(None);
    }

    let compat_dir = lib.parent().unwrap_or(Path::new("/"));
    Ok(Some(root.to_container_path(compat_dir)))
}

/// Parses the MAJOR component of a dotted version string. An unparsable
/// major component is a hard error: the hook must never guess whether two
/// versions compare equal.
fn extract_major_version(version: &str) -> Result<u32, HookError> {
    version
        .split('.')
        .next()
        .unwrap_or(version)
        .parse()
        .map_err(|_| HookError::VersionParse {
            version: version.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn compat_root(dir: &TempDir, libs: &[&str], with_cache: bool) -> ContainerRoot {
        let compat = dir.path().join("usr/local/cuda/compat");
        std::fs::create_dir_all(&compat).unwrap();
        for lib in libs {
            std::fs::write(compat.join(lib), b"").unwrap();
        }
        if with_cache {
            std::fs::create_dir_all(dir.path().join("etc")).unwrap();
            std::fs::write(dir.path().join("etc/ld.so.cache"), b"").unwrap();
        }
        ContainerRoot::new(dir.path())
    }

    #[test]
    fn newer_compat_library_enables_forward_compat() {
        let dir = TempDir::new().unwrap();
        let root = compat_root(&dir, &["libcuda.so.535.50"], true);

        let compat_dir = forward_compat_dir_in_container(&root, "470.10").unwrap();
        assert_eq!(compat_dir, Some(PathBuf::from("/usr/local/cuda/compat")));
    }

    #[test]
    fn older_compat_library_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let root = compat_root(&dir, &["libcuda.so.470.50"], true);

        let compat_dir = forward_compat_dir_in_container(&root, "535.10").unwrap();
        assert_eq!(compat_dir, None);
    }

    #[test]
    fn equal_major_version_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let root = compat_root(&dir, &["libcuda.so.535.129"], true);

        let compat_dir = forward_compat_dir_in_container(&root, "535.10").unwrap();
        assert_eq!(compat_dir, None);
    }

    #[test]
    fn ambiguous_compat_libraries_are_a_noop() {
        let dir = TempDir::new().unwrap();
        let root = compat_root(&dir, &["libcuda.so.535.50", "libcuda.so.545.10"], true);

        let compat_dir = forward_compat_dir_in_container(&root, "470.10").unwrap();
        assert_eq!(compat_dir, None);
    }

    #[test]
    fn missing_ld_cache_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let root = compat_root(&dir, &["libcuda.so.535.50"], false);

        let compat_dir = forward_compat_dir_in_container(&root, "470.10").unwrap();
        assert_eq!(compat_dir, None);
    }

    #[test]
    fn missing_compat_directory_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let root = ContainerRoot::new(dir.path());

        let compat_dir = forward_compat_dir_in_container(&root, "470.10").unwrap();
        assert_eq!(compat_dir, None);
    }

    #[test]
    fn unparsable_host_version_is_fatal() {
        let dir = TempDir::new().unwrap();
        let root = compat_root(&dir, &["libcuda.so.535.50"], true);

        let err = forward_compat_dir_in_container(&root, "not-a-version").unwrap_err();
        assert!(matches!(err, HookError::VersionParse { .. }));
    }

    #[test]
    fn extract_major_version_parses_leading_component() {
        assert_eq!(extract_major_version("535.104.05").unwrap(), 535);
        assert!(extract_major_version("").is_err());
        assert!(extract_major_version("abc.1").is_err());
    }
}
