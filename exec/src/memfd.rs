use std::fs::File;
use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Command;

use nix::sys::memfd::{memfd_create, MemFdCreateFlag};

use crate::error::ExecError;

/// Copies the binary at `path` into an anonymous memory file and executes
/// the copy via its `/proc/self/fd` entry.
///
/// The bytes that run are exactly the bytes read at validation time; a
/// concurrent swap of `path` cannot affect the child. The memfd is marked
/// close-on-exec, which is safe here because the kernel opens the
/// executable before it processes close-on-exec descriptors.
pub(crate) fn exec_from_memfd(
    path: &Path,
    args: &[String],
    envs: &[(String, String)],
) -> Result<(), ExecError> {
    let mut source = File::open(path)?;
    if !source.metadata()?.is_file() {
        return Err(ExecError::NotARegularFile(path.to_path_buf()));
    }

    let memfd = memfd_create(c"cdi-hook-exec", MemFdCreateFlag::MFD_CLOEXEC)?;
    let mut staged = File::from(memfd);
    io::copy(&mut source, &mut staged)?;
    drop(source);

    let arg0 = match args.first() {
        Some(arg0) => arg0.clone(),
        None => base_name(path),
    };

    let fd_path = format!("/proc/self/fd/{}", staged.as_raw_fd());
    let mut command = Command::new(&fd_path);
    command.arg0(&arg0);
    if args.len() > 1 {
        command.args(&args[1..]);
    }
    command.envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    tracing::debug!(binary = %path.display(), argv0 = %arg0, "executing staged copy");

    let status = command.status().map_err(|e| ExecError::SpawnFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if !status.success() {
        return Err(ExecError::NonZeroExit {
            path: path.to_path_buf(),
            status,
        });
    }
    Ok(())
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
