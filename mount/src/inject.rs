use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use nix::mount::{mount, MsFlags};

use crate::error::MountError;

/// Materializes `contents` as a file in a private tmpfs and bind-mounts it
/// read-only over `target`.
///
/// The tmpfs is sized to exactly the content length so attacker-influenced
/// content cannot pin unbounded memory. The bind mount is performed with
/// symlink-following disabled: a symlink swapped in at `target` between
/// resolution and mount must fail the mount rather than redirect it. The
/// tmpfs mount point is deliberately not cleaned up; its lifetime is tied
/// to the container's mount namespace, which the runtime tears down.
pub fn inject_readonly_file(
    target: &Path,
    name: &str,
    contents: &[u8],
    mode: u32,
) -> Result<(), MountError> {
    let staging = tempfile::Builder::new()
        .prefix("hook-empty-dir")
        .tempdir()?
        .keep();

    let options = format!("size={}", contents.len());
    mount(
        Some("tmpfs"),
        &staging,
        Some("tmpfs"),
        MsFlags::empty(),
        Some(options.as_str()),
    )
    .map_err(|e| MountError::TmpfsFailed(format!("mounting on {:?}: {}", staging, e)))?;

    let source = staging.join(name);
    fs::write(&source, contents)?;
    fs::set_permissions(&source, fs::Permissions::from_mode(mode))?;

    tracing::debug!(
        source = %source.display(),
        target = %target.display(),
        "bind mounting injected file"
    );

    // MS_NOSYMFOLLOW keeps the mount from being redirected through a
    // symlink substituted at the target after path resolution.
    let nosymfollow = MsFlags::from_bits_retain(libc::MS_NOSYMFOLLOW);

    mount(
        Some(source.as_path()),
        target,
        None::<&str>,
        MsFlags::MS_BIND | nosymfollow,
        None::<&str>,
    )
    .map_err(|e| MountError::BindFailed(format!("mounting on {:?}: {}", target, e)))?;

    // A bind mount does not honor MS_RDONLY on its own; remount to apply it.
    mount(
        None::<&str>,
        target,
        None::<&str>,
        MsFlags::MS_BIND | MsFlags::MS_REMOUNT | MsFlags::MS_RDONLY | nosymfollow,
        None::<&str>,
    )
    .map_err(|e| MountError::BindFailed(format!("remount read-only failed: {}", e)))?;

    Ok(())
}
