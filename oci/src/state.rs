use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;

use oci_spec::runtime::Spec;
use serde::Deserialize;

use crate::error::OciError;
use crate::root::ContainerRoot;

/// The OCI runtime state document handed to create-runtime hooks on stdin
/// or as a file argument.
///
/// Only the fields needed to locate the container's root filesystem are
/// consumed here; validating the rest of the schema is the runtime's
/// business.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerState {
    #[serde(default)]
    pub oci_version: String,
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub pid: Option<i32>,
    pub bundle: PathBuf,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

impl ContainerState {
    /// Loads the state document from `path`, or from stdin when `path` is
    /// absent, empty, or `-`.
    pub fn load(path: Option<&str>) -> Result<Self, OciError> {
        let contents = match path {
            Some(path) if !path.is_empty() && path != "-" => std::fs::read(path)
                .map_err(|e| OciError::State(format!("failed to read {path}: {e}")))?,
            _ => {
                let mut buf = Vec::new();
                let _ = std::io::stdin()
                    .read_to_end(&mut buf)
                    .map_err(|e| OciError::State(format!("failed to read stdin: {e}")))?;
                buf
            }
        };
        Ok(serde_json::from_slice(&contents)?)
    }

    /// Determines the container's root filesystem directory on the host by
    /// loading the bundle's `config.json`. A relative root path is taken
    /// relative to the bundle directory.
    pub fn container_root(&self) -> Result<ContainerRoot, OciError> {
        let spec = Spec::load(self.bundle.join("config.json"))?;
        let root = spec.root().as_ref().ok_or(OciError::MissingRoot)?;
        let path = root.path();
        let absolute = if path.is_absolute() {
            path.clone()
        } else {
            self.bundle.join(path)
        };
        Ok(ContainerRoot::new(absolute))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_bundle(bundle: &std::path::Path, root_path: &str) {
        std::fs::write(
            bundle.join("config.json"),
            format!(r#"{{"ociVersion":"1.0.2","root":{{"path":"{root_path}"}}}}"#),
        )
        .unwrap();
    }

    #[test]
    fn load_from_file() {
        let dir = TempDir::new().unwrap();
        let state_path = dir.path().join("state.json");
        std::fs::write(
            &state_path,
            r#"{"ociVersion":"1.0.2","id":"test","status":"creating","pid":1234,"bundle":"/run/bundle"}"#,
        )
        .unwrap();

        let state = ContainerState::load(state_path.to_str()).unwrap();
        assert_eq!(state.id, "test");
        assert_eq!(state.bundle, PathBuf::from("/run/bundle"));
    }

    #[test]
    fn container_root_joins_relative_path_to_bundle() {
        let dir = TempDir::new().unwrap();
        write_bundle(dir.path(), "rootfs");

        let state = ContainerState {
            oci_version: "1.0.2".into(),
            id: "test".into(),
            status: "creating".into(),
            pid: None,
            bundle: dir.path().to_path_buf(),
            annotations: HashMap::new(),
        };

        let root = state.container_root().unwrap();
        assert_eq!(root.as_path(), dir.path().join("rootfs"));
    }

    #[test]
    fn container_root_fails_without_config() {
        let dir = TempDir::new().unwrap();

        let state = ContainerState {
            oci_version: String::new(),
            id: "test".into(),
            status: String::new(),
            pid: None,
            bundle: dir.path().to_path_buf(),
            annotations: HashMap::new(),
        };

        assert!(state.container_root().is_err());
    }
}
