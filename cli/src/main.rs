//! `cdi-hook` — OCI create-runtime hooks that prepare a container's
//! filesystem from the host.
//!
//! Each subcommand is one hook, invoked by the container runtime with the
//! OCI state document on stdin or as a file argument.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use hook_exec::SafeExecer;

use commands::{
    CudaCompatArgs, DisableDeviceNodesArgs, SonameSymlinksArgs, UpdateLdcacheArgs,
};

#[derive(Parser)]
#[command(name = "cdi-hook")]
#[command(about = "OCI create-runtime hooks for container filesystem preparation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Update the dynamic linker cache in a container by running ldconfig
    UpdateLdcache(UpdateLdcacheArgs),
    /// Create soname symlinks for the specified folders using ldconfig -n -N
    CreateSonameSymlinks(SonameSymlinksArgs),
    /// Register the container's forward-compatibility libraries with the
    /// dynamic linker when they are newer than the host driver
    EnableCudaCompat(CudaCompatArgs),
    /// Overlay a params file that disallows device node modification
    DisableDeviceNodeModification(DisableDeviceNodesArgs),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let execer = SafeExecer;

    match cli.command {
        Commands::UpdateLdcache(args) => commands::update_ldcache::run(&args, &execer)?,
        Commands::CreateSonameSymlinks(args) => commands::soname_symlinks::run(&args, &execer)?,
        Commands::EnableCudaCompat(args) => commands::cuda_compat::run(&args)?,
        Commands::DisableDeviceNodeModification(args) => commands::device_nodes::run(&args)?,
    }

    Ok(())
}
