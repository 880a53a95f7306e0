use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;

use crate::error::OciError;
use crate::root::ContainerRoot;

const LDSOCONFD_DIR: &str = "/etc/ld.so.conf.d";

/// Writes an ld.so.conf.d fragment listing `dirs` into the container root.
///
/// `pattern` is a `prefix*suffix` template; the `*` is replaced with a
/// random component so repeated hook invocations never clobber each other.
/// Duplicate directories are dropped, first occurrence wins. An empty
/// `dirs` writes nothing at all: tooling that counts fragments must be able
/// to distinguish "no fragment" from an empty one.
pub fn create_ldsoconfd_file(
    root: &ContainerRoot,
    pattern: &str,
    dirs: &[String],
) -> Result<(), OciError> {
    if dirs.is_empty() {
        return Ok(());
    }

    let fragment_dir = root.resolve(LDSOCONFD_DIR)?;
    fs::create_dir_all(&fragment_dir)?;

    let (prefix, suffix) = pattern.split_once('*').unwrap_or((pattern, ""));
    let mut file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .tempfile_in(&fragment_dir)?;

    let mut seen = HashSet::new();
    for dir in dirs {
        if !seen.insert(dir.as_str()) {
            continue;
        }
        writeln!(file, "{dir}")?;
    }

    // The consuming linker may run as an unprivileged user in the container.
    file.as_file()
        .set_permissions(fs::Permissions::from_mode(0o644))?;

    let (_, path) = file.keep().map_err(|e| OciError::Io(e.error))?;
    tracing::debug!(path = %path.display(), "wrote ld.so.conf.d fragment");

    Ok(())
}
