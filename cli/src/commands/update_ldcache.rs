use std::path::Path;

use clap::Args;
use hook_exec::Execer;
use hook_oci::{create_ldsoconfd_file, ContainerRoot, ContainerState};

use super::{base_name, ldconfig_host_path};
use crate::error::HookError;

/// The 00-nvcr prefix ranks these directories above distribution fragments
/// but below the 00-compat fragment that some images ship.
const LDSOCONFD_FILENAME_PATTERN: &str = "00-nvcr-*.conf";

#[derive(Args, Debug)]
pub struct UpdateLdcacheArgs {
    /// Folder to add to /etc/ld.so.conf before updating the ld cache
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

pub fn run(args: &UpdateLdcacheArgs, execer: &impl Execer) -> Result<(), HookError> {
    if args.ldconfig_path.is_empty() {
        return Err(HookError::MissingLdconfigPath);
    }

    let state = ContainerState::load(args.container_spec.as_deref())?;
    let root = state.container_root()?;
    if root.as_path() == Path::new("/") || root.as_path().as_os_str().is_empty() {
        return Err(HookError::InvalidContainerRoot(format!(
            "refusing to update ldcache for root {root}"
        )));
    }

    update_ldcache(args, &root, execer)
}

fn update_ldcache(
    args: &UpdateLdcacheArgs,
    root: &ContainerRoot,
    execer: &impl Execer,
) -> Result<(), HookError> {
    let ldconfig = ldconfig_host_path(&args.ldconfig_path);

    let mut argv = vec![
        base_name(&ldconfig),
        // Run ldconfig against the container root from the host.
        "-r".to_string(),
        root.as_path().to_string_lossy().into_owned(),
        // The host's ldconfig may default to a different config file; with
        // -r in effect this path is resolved inside the container.
        "-f".to_string(),
        "/etc/ld.so.conf".to_string(),
    ];

    if root.has_path("/etc/ld.so.cache") {
        argv.push("-C".to_string());
        argv.push("/etc/ld.so.cache".to_string());
    } else {
        tracing::debug!("no ld.so.cache found, skipping update");
        argv.push("-N".to_string());
    }

    if root.has_path("/etc/ld.so.conf.d") {
        create_ldsoconfd_file(root, LDSOCONFD_FILENAME_PATTERN, &args.folders)?;
    } else {
        argv.extend(args.folders.iter().cloned());
    }

    execer.exec(&ldconfig, &argv, &[])?;
    Ok(())
}
