use std::collections::VecDeque;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::OciError;

/// Upper bound on symlink traversals during a single resolution. A chain
/// longer than this is treated as a loop.
const MAX_SYMLINK_FOLLOWS: usize = 255;

/// The root directory of a container's filesystem, as seen from the host.
///
/// All path operations against the container go through this type so that
/// the containment invariant is enforced in one place: a resolved path is
/// always a descendant of the root, no matter what symlinks or `..` chains
/// the container image ships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRoot(PathBuf);

impl ContainerRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Resolves `path` inside the container root, following symlinks found
    /// in the container.
    ///
    /// `..` components, whether literal or introduced by a symlink target,
    /// are clamped at the root boundary, and absolute symlink targets
    /// restart resolution from the root rather than the host's `/`. A
    /// component that does not exist ends symlink traversal; the remainder
    /// of the path is appended structurally, so resolving a not-yet-created
    /// leaf still succeeds.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, OciError> {
        let path = path.as_ref();
        let mut pending: VecDeque<OsString> = VecDeque::new();
        push_components(&mut pending, path, PushEnd::Back);

        let mut resolved = self.0.clone();
        let mut follows = 0;

        while let Some(part) = pending.pop_front() {
            if part == ".." {
                if resolved != self.0 {
                    let _ = resolved.pop();
                }
                continue;
            }

            let candidate = resolved.join(&part);
            let meta = match fs::symlink_metadata(&candidate) {
                Ok(meta) => meta,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    // Nothing below a missing component can be a symlink.
                    resolved = candidate;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if !meta.file_type().is_symlink() {
                resolved = candidate;
                continue;
            }

            follows += 1;
            if follows > MAX_SYMLINK_FOLLOWS {
                return Err(OciError::TooManySymlinks(path.to_path_buf()));
            }

            let target = fs::read_link(&candidate)?;
            if target.is_absolute() {
                resolved = self.0.clone();
            }
            push_components(&mut pending, &target, PushEnd::Front);
        }

        Ok(resolved)
    }

    /// Whether `path` exists in the container root.
    ///
    /// Resolution failures and stat failures of any kind report the path as
    /// absent, so callers never act on a path they could not verify.
    pub fn has_path(&self, path: impl AsRef<Path>) -> bool {
        match self.resolve(path) {
            Ok(resolved) => fs::metadata(resolved).is_ok(),
            Err(_) => false,
        }
    }

    /// Glob-matches `pattern` inside the container root and returns the
    /// matches that are regular files.
    ///
    /// Symlinks and directories are skipped: either could be planted by the
    /// image to point the hook at data it does not own.
    pub fn glob_files(&self, pattern: impl AsRef<Path>) -> Result<Vec<PathBuf>, OciError> {
        let resolved = self.resolve(pattern)?;
        let pattern = resolved
            .to_str()
            .ok_or_else(|| OciError::NonUtf8Path(resolved.clone()))?;

        let mut files = Vec::new();
        for entry in glob::glob(pattern)? {
            let path = entry.map_err(|e| OciError::Io(e.into_error()))?;
            let meta = fs::symlink_metadata(&path)?;
            if meta.file_type().is_symlink() || meta.is_dir() {
                continue;
            }
            files.push(path);
        }
        Ok(files)
    }

    /// Translates a host path back into the path the container itself sees.
    ///
    /// Relative paths and absolute paths that do not lie under the root are
    /// returned unchanged.
    pub fn to_container_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if !path.is_absolute() {
            return path.to_path_buf();
        }
        match path.strip_prefix(&self.0) {
            Ok(stripped) => Path::new("/").join(stripped),
            Err(_) => path.to_path_buf(),
        }
    }
}

impl fmt::Display for ContainerRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.display().fmt(f)
    }
}

enum PushEnd {
    Front,
    Back,
}

fn push_components(pending: &mut VecDeque<OsString>, path: &Path, end: PushEnd) {
    let components = path.components().filter_map(|component| match component {
        Component::Normal(c) => Some(c.to_os_string()),
        Component::ParentDir => Some("..".into()),
        Component::CurDir | Component::RootDir | Component::Prefix(_) => None,
    });

    match end {
        PushEnd::Back => pending.extend(components),
        PushEnd::Front => {
            for part in components.collect::<Vec<_>>().into_iter().rev() {
                pending.push_front(part);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    fn root(dir: &TempDir) -> ContainerRoot {
        ContainerRoot::new(dir.path())
    }

    #[test]
    fn resolve_plain_path() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("usr/lib")).unwrap();

        let resolved = root(&dir).resolve("/usr/lib").unwrap();
        assert_eq!(resolved, dir.path().join("usr/lib"));
    }

    #[test]
    fn resolve_missing_leaf_is_structural() {
        let dir = TempDir::new().unwrap();

        let resolved = root(&dir).resolve("/does/not/exist").unwrap();
        assert_eq!(resolved, dir.path().join("does/not/exist"));
    }

    #[test]
    fn resolve_clamps_parent_traversal() {
        let dir = TempDir::new().unwrap();

        let resolved = root(&dir).resolve("/../../etc/passwd").unwrap();
        assert_eq!(resolved, dir.path().join("etc/passwd"));
        assert!(resolved.starts_with(dir.path()));
    }

    #[test]
    fn resolve_contains_absolute_symlink() {
        let dir = TempDir::new().unwrap();
        symlink("/etc", dir.path().join("escape")).unwrap();

        let resolved = root(&dir).resolve("/escape/passwd").unwrap();
        assert_eq!(resolved, dir.path().join("etc/passwd"));
    }

    #[test]
    fn resolve_contains_relative_symlink_escape() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        symlink("../../../../etc", dir.path().join("a/up")).unwrap();

        let resolved = root(&dir).resolve("/a/up/passwd").unwrap();
        assert_eq!(resolved, dir.path().join("etc/passwd"));
    }

    #[test]
    fn resolve_follows_symlink_chain_inside_root() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("usr/lib64")).unwrap();
        symlink("lib64", dir.path().join("usr/lib")).unwrap();

        let resolved = root(&dir).resolve("/usr/lib/libc.so").unwrap();
        assert_eq!(resolved, dir.path().join("usr/lib64/libc.so"));
    }

    #[test]
    fn resolve_errors_on_symlink_loop() {
        let dir = TempDir::new().unwrap();
        symlink("b", dir.path().join("a")).unwrap();
        symlink("a", dir.path().join("b")).unwrap();

        let err = root(&dir).resolve("/a").unwrap_err();
        assert!(matches!(err, OciError::TooManySymlinks(_)));
    }

    #[test]
    fn has_path_reports_existing_and_missing() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("etc")).unwrap();
        std::fs::write(dir.path().join("etc/ld.so.cache"), b"").unwrap();

        let root = root(&dir);
        assert!(root.has_path("/etc/ld.so.cache"));
        assert!(root.has_path("/etc"));
        assert!(!root.has_path("/etc/ld.so.conf.d"));
    }

    #[test]
    fn has_path_follows_leaf_symlinks() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("etc")).unwrap();
        symlink("missing", dir.path().join("etc/dangling")).unwrap();

        assert!(!root(&dir).has_path("/etc/dangling"));
    }

    #[test]
    fn glob_files_returns_only_regular_files() {
        let dir = TempDir::new().unwrap();
        let compat = dir.path().join("compat");
        std::fs::create_dir_all(&compat).unwrap();
        std::fs::write(compat.join("libcuda.so.535.104"), b"").unwrap();
        std::fs::create_dir(compat.join("libcuda.so.1.0")).unwrap();
        symlink("libcuda.so.535.104", compat.join("libcuda.so.2.0")).unwrap();

        let files = root(&dir).glob_files("/compat/libcuda.so.*.*").unwrap();
        assert_eq!(files, vec![compat.join("libcuda.so.535.104")]);
    }

    #[test]
    fn glob_files_with_no_matches_is_empty() {
        let dir = TempDir::new().unwrap();

        let files = root(&dir).glob_files("/compat/libcuda.so.*.*").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn to_container_path_strips_root_prefix() {
        let dir = TempDir::new().unwrap();
        let root = root(&dir);

        let host = dir.path().join("usr/lib");
        assert_eq!(root.to_container_path(&host), PathBuf::from("/usr/lib"));
    }

    #[test]
    fn to_container_path_leaves_foreign_paths_unchanged() {
        let dir = TempDir::new().unwrap();
        let root = root(&dir);

        assert_eq!(root.to_container_path("/rel"), PathBuf::from("/rel"));
        assert_eq!(
            root.to_container_path("relative/path"),
            PathBuf::from("relative/path")
        );
    }
}
