use clap::Args;
use hook_exec::Execer;
use hook_oci::{ContainerRoot, ContainerState};

use super::{base_name, ldconfig_host_path};
use crate::error::HookError;

#[derive(Args, Debug)]
pub struct SonameSymlinksArgs {
    /// Folder to scan for shared libraries needing soname symlinks
    #[arg(long = "folder")]
    pub folders: Vec<String>,

    /// Path to the ldconfig program
    #[arg(long, default_value = "/sbin/ldconfig")]
    pub ldconfig_path: String,

    /// Path to the OCI container state; if empty or '-' the state is read
    /// from stdin
    #[arg(long)]
    pub container_spec: Option<String>,
}

pub fn run(args: &SonameSymlinksArgs, execer: &impl Execer) -> Result<(), HookError> {
    if args.ldconfig_path.is_empty() {
        return Err(HookError::MissingLdconfigPath);
    }

    let state = ContainerState::load(args.container_spec.as_deref())?;
    // Symlink creation is an optimization; a container without a usable
    // root simply has nothing for us to do.
    let root = match state.container_root() {
        Ok(root) => root,
        Err(e) => {
            tracing::warn!(error = %e, "no container root detected");
            return Ok(());
        }
    };

    create_soname_symlinks(args, &root, execer)
}

fn create_soname_symlinks(
    args: &SonameSymlinksArgs,
    root: &ContainerRoot,
    execer: &impl Execer,
) -> Result<(), HookError> {
    if args.folders.is_empty() {
        return Ok(());
    }

    let ldconfig = ldconfig_host_path(&args.ldconfig_path);

    let mut argv = vec![
        base_name(&ldconfig),
        "-r".to_string(),
        root.as_path().to_string_lossy().into_owned(),
        // Only process the listed folders.
        "-n".to_string(),
        // Do not rewrite the cache.
        "-N".to_string(),
    ];
    argv.extend(args.folders.iter().cloned());

    execer.exec(&ldconfig, &argv, &[])?;
    Ok(())
}
