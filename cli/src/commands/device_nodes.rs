use std::io;

use clap::Args;
use hook_mount::inject_readonly_file;
use hook_oci::ContainerState;

use crate::error::HookError;

const NVIDIA_DRIVER_PARAMS_PATH: &str = "/proc/driver/nvidia/params";

#[derive(Args, Debug)]
pub struct DisableDeviceNodesArgs {
    /// Path to the OCI container state; if empty or '-' the state is read
    /// from stdin
    #[arg(long, hide = true)]
    pub container_spec: Option<String>,
}

pub fn run(args: &DisableDeviceNodesArgs) -> Result<(), HookError> {
    let contents = match std::fs::read(NVIDIA_DRIVER_PARAMS_PATH) {
        Ok(contents) => contents,
        // No driver params file on this host, nothing to lock down.
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    let Some(patched) = patched_params_contents(&contents) else {
        tracing::debug!("no params modification required");
        return Ok(());
    };

    let state = ContainerState::load(args.container_spec.as_deref())?;
    let root = state.container_root()?;

    let target = root.resolve(NVIDIA_DRIVER_PARAMS_PATH)?;
    inject_readonly_file(&target, "params", &patched, 0o444)?;
    Ok(())
}

/// Returns the params file contents with device node modification
/// disabled, or `None` when no rewrite is needed. Every line is
/// re-terminated with a single newline.
fn patched_params_contents(contents: &[u8]) -> Option<Vec<u8>> {
    let text = String::from_utf8_lossy(contents);
    let mut patched = String::with_capacity(text.len());
    let mut modified = false;

    for line in text.lines() {
        if line == "ModifyDeviceFiles: 0" {
            tracing::debug!("device node modification is already disabled");
            return None;
        }
        if line == "ModifyDeviceFiles: 1" {
            patched.push_str("ModifyDeviceFiles: 0\n");
            modified = true;
            continue;
        }
        patched.push_str(line);
        patched.push('\n');
    }

    if !modified {
        return None;
    }
    Some(patched.into_bytes())
}
