//! Tamper-resistant execution of host binaries.
//!
//! A hook validates a binary in the host's view of the filesystem and then
//! runs it against a container root. Between validation and execution the
//! path could be swapped out from under us, so the production executor
//! never re-opens the path string: it copies the validated bytes into an
//! anonymous memory file and executes that copy.

mod error;
mod memfd;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub use error::ExecError;

/// Capability to execute a host binary.
///
/// `args` is the full argv including argv\[0\]; `envs` is appended to the
/// inherited environment. The child's stdout and stderr are the hook's own.
pub trait Execer {
    fn exec(
        &self,
        path: &Path,
        args: &[String],
        envs: &[(String, String)],
    ) -> Result<(), ExecError>;
}

/// Production executor backed by an anonymous memory file.
pub struct SafeExecer;

impl Execer for SafeExecer {
    fn exec(
        &self,
        path: &Path,
        args: &[String],
        envs: &[(String, String)],
    ) -> Result<(), ExecError> {
        memfd::exec_from_memfd(path, args, envs)
    }
}

/// One recorded [`Execer::exec`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub path: PathBuf,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
}

/// Test executor that records invocations and reports success.
#[derive(Debug, Default)]
pub struct RecordingExecer {
    calls: Mutex<Vec<Invocation>>,
}

impl RecordingExecer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Execer for RecordingExecer {
    fn exec(
        &self,
        path: &Path,
        args: &[String],
        envs: &[(String, String)],
    ) -> Result<(), ExecError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Invocation {
                path: path.to_path_buf(),
                args: args.to_vec(),
                envs: envs.to_vec(),
            });
        Ok(())
    }
}
