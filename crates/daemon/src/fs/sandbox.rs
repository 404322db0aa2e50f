//! Path containment for client-supplied paths.
//!
//! All client input addressing the managed tree is relative, `/`-separated,
//! and resolved here before any filesystem access. Containment is a lexical
//! check: `.` and `..` components are resolved textually and the result must
//! stay under the root. Symlinks inside the root that point outside it are
//! **not** detected: the sandbox guards against path traversal in client
//! input, not against hostile content already present in the tree. The only
//! symlink resolution ever performed is the one-time canonicalization of the
//! root itself at startup.

use std::fs;
use std::path::{Component, Path, PathBuf};

use super::{FsError, Result};

/// The managed root directory plus the containment check.
///
/// Cheap to clone; constructed once at startup and handed to every engine
/// component. The root never changes for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Open a sandbox over `root`, which must be an existing directory.
    pub fn open(root: &Path) -> Result<Self> {
        let root = fs::canonicalize(root)?;
        if !root.is_dir() {
            return Err(FsError::NotADirectory(root.to_string_lossy().into_owned()));
        }
        Ok(Self { root })
    }

    /// The canonical root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a client path against the root.
    ///
    /// Leading and trailing `/` are ignored, so `""`, `"/"` and `"/docs"`
    /// address the root and `root/docs` respectively; absolute-looking input
    /// is treated as root-relative. Any input whose lexical resolution leaves
    /// the root is rejected with a uniform error that says nothing about why.
    /// Existence of the resolved path is not checked here.
    pub fn resolve(&self, client_path: &str) -> Result<PathBuf> {
        let joined = self.root.join(client_path.trim_matches('/'));
        let normalized = lexical_normalize(&joined);
        if normalized.starts_with(&self.root) {
            Ok(normalized)
        } else {
            Err(FsError::InvalidPath)
        }
    }

    /// Re-check that an engine-computed path is still under the root.
    ///
    /// Used after sibling-path arithmetic (rename targets, upload subpaths)
    /// where a candidate was built from a resolved path plus a client-derived
    /// fragment.
    pub fn ensure_contains(&self, candidate: &Path) -> Result<()> {
        if lexical_normalize(candidate).starts_with(&self.root) {
            Ok(())
        } else {
            Err(FsError::InvalidPath)
        }
    }

    /// Client-facing `/`-separated path for an absolute path under the root.
    ///
    /// Returns the empty string for the root itself or for paths that do not
    /// lie under it.
    pub fn relative(&self, absolute: &Path) -> String {
        match absolute.strip_prefix(&self.root) {
            Ok(rel) => slash_path(rel),
            Err(_) => String::new(),
        }
    }
}

/// Resolve `.` and `..` components textually, without touching the
/// filesystem. `..` at the filesystem root stays at the root, matching how
/// shells resolve `/..`.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::RootDir | Component::Prefix(_) => {
                normalized.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    normalized
}

/// Join path components with `/` regardless of platform separator.
pub(crate) fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    fn sandbox() -> (TempDir, Sandbox) {
        let temp_dir = TempDir::new().unwrap();
        let sandbox = Sandbox::open(temp_dir.path()).unwrap();
        (temp_dir, sandbox)
    }

    #[test]
    fn test_resolve_plain_child() {
        let (_guard, sandbox) = sandbox();
        let resolved = sandbox.resolve("notes.txt").unwrap();
        assert_eq!(resolved, sandbox.root().join("notes.txt"));
    }

    #[test]
    fn test_resolve_nested_path() {
        let (_guard, sandbox) = sandbox();
        let resolved = sandbox.resolve("docs/reports/q1.txt").unwrap();
        assert_eq!(resolved, sandbox.root().join("docs/reports/q1.txt"));
    }

    #[test]
    fn test_resolve_root_aliases() {
        let (_guard, sandbox) = sandbox();
        for alias in ["", "/", "//"] {
            let resolved = sandbox.resolve(alias).unwrap();
            assert_eq!(resolved, sandbox.root());
        }
    }

    #[test]
    fn test_resolve_rejects_parent_traversal() {
        let (_guard, sandbox) = sandbox();
        for attempt in ["..", "../x", "a/../../x", "a/b/../../../x", "../../../../etc/passwd"] {
            assert!(
                matches!(sandbox.resolve(attempt), Err(FsError::InvalidPath)),
                "expected rejection for {attempt:?}"
            );
        }
    }

    #[test]
    fn test_resolve_allows_internal_dotdot() {
        // "docs/../notes" normalizes to "notes", still inside the root.
        let (_guard, sandbox) = sandbox();
        let resolved = sandbox.resolve("docs/../notes").unwrap();
        assert_eq!(resolved, sandbox.root().join("notes"));
    }

    #[test]
    fn test_resolve_ignores_curdir_components() {
        let (_guard, sandbox) = sandbox();
        let resolved = sandbox.resolve("./docs/./a.txt").unwrap();
        assert_eq!(resolved, sandbox.root().join("docs/a.txt"));
    }

    #[test]
    fn test_resolve_treats_absolute_input_as_root_relative() {
        let (_guard, sandbox) = sandbox();
        let resolved = sandbox.resolve("/etc/passwd").unwrap();
        assert_eq!(resolved, sandbox.root().join("etc/passwd"));
    }

    #[test]
    fn test_resolve_rejection_message_is_uniform() {
        let (_guard, sandbox) = sandbox();
        let err = sandbox.resolve("../escape").unwrap_err();
        assert_eq!(err.to_string(), "path is outside the managed directory");
    }

    #[test]
    fn test_sibling_directory_with_shared_prefix_is_outside() {
        // A byte-prefix check would accept "<root>-extra"; the component-wise
        // check must not.
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("data");
        let sibling = temp_dir.path().join("database");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&sibling).unwrap();

        let sandbox = Sandbox::open(&root).unwrap();
        assert!(matches!(
            sandbox.resolve("../database/secret.txt"),
            Err(FsError::InvalidPath)
        ));
    }

    #[test]
    fn test_symlink_targets_are_not_resolved() {
        // The containment contract is lexical only: a symlink inside the root
        // pointing outside it still resolves to its in-root path.
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("root");
        let outside = temp_dir.path().join("outside");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&outside).unwrap();
        symlink(&outside, root.join("link")).unwrap();

        let sandbox = Sandbox::open(&root).unwrap();
        let resolved = sandbox.resolve("link/secret.txt").unwrap();
        assert_eq!(resolved, sandbox.root().join("link/secret.txt"));
    }

    #[test]
    fn test_ensure_contains() {
        let (_guard, sandbox) = sandbox();
        assert!(sandbox.ensure_contains(&sandbox.root().join("child")).is_ok());
        let escape = sandbox.root().join("..").join("elsewhere");
        assert!(matches!(
            sandbox.ensure_contains(&escape),
            Err(FsError::InvalidPath)
        ));
    }

    #[test]
    fn test_relative_roundtrip() {
        let (_guard, sandbox) = sandbox();
        let resolved = sandbox.resolve("docs/a.txt").unwrap();
        assert_eq!(sandbox.relative(&resolved), "docs/a.txt");
        assert_eq!(sandbox.relative(sandbox.root()), "");
    }

    #[test]
    fn test_open_rejects_file_root() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("not_a_dir");
        fs::write(&file, "x").unwrap();
        assert!(Sandbox::open(&file).is_err());
    }

    #[test]
    fn test_open_rejects_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Sandbox::open(&temp_dir.path().join("absent")).is_err());
    }

    #[test]
    fn test_lexical_normalize_stops_at_filesystem_root() {
        let normalized = lexical_normalize(Path::new("/a/../../etc"));
        assert_eq!(normalized, PathBuf::from("/etc"));
    }
}
