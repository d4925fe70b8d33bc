//! Root-confined path resolution

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Resolves user-supplied relative paths against a trusted root directory.
///
/// Absolute paths are always rejected, and the final resolved path must stay
/// within the root. Existence is not checked here; callers that need the file
/// map a missing path to `NotFound` themselves.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver confined to `root`. The root must exist so it can be
    /// canonicalized once up front.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = std::fs::canonicalize(root.as_ref())?;
        Ok(Self { root })
    }

    /// The canonicalized trusted root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a user-provided relative path to an absolute path under the
    /// trusted root.
    pub fn resolve(&self, user_path: &str) -> Result<PathBuf> {
        if user_path.trim().is_empty() {
            return Err(Error::InvalidInput {
                reason: "Path cannot be empty".to_string(),
            });
        }

        let normalized = normalize(Path::new(user_path));

        if normalized.is_absolute() {
            return Err(Error::SecurityViolation {
                reason: "Absolute paths are not allowed".to_string(),
            });
        }

        // A leading `..` after normalization escapes the root lexically.
        if normalized
            .components()
            .next()
            .is_some_and(|c| c == Component::ParentDir)
        {
            return Err(Error::SecurityViolation {
                reason: "Path traversal detected. Access denied".to_string(),
            });
        }

        let candidate = self.root.join(normalized);

        // Resolve symlinks when the target exists; a symlink pointing outside
        // the root is still a traversal.
        let resolved = match std::fs::canonicalize(&candidate) {
            Ok(p) => p,
            Err(_) => candidate,
        };

        if !resolved.starts_with(&self.root) {
            return Err(Error::SecurityViolation {
                reason: "Path traversal detected. Access denied".to_string(),
            });
        }

        Ok(resolved)
    }
}

/// Resolve `.` and `..` segments lexically, without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    parts.iter().map(|c| c.as_os_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> (tempfile::TempDir, PathResolver) {
        let dir = tempfile::tempdir().expect("tempdir");
        let resolver = PathResolver::new(dir.path()).expect("resolver");
        (dir, resolver)
    }

    #[test]
    fn test_resolve_relative_path_under_root() {
        let (_dir, resolver) = resolver();
        let resolved = resolver.resolve("a/b.pdf").unwrap();
        assert!(resolved.starts_with(resolver.root()));
        assert!(resolved.ends_with("a/b.pdf"));
    }

    #[test]
    fn test_resolve_normalizes_dot_segments() {
        let (_dir, resolver) = resolver();
        let resolved = resolver.resolve("./docs/../file.pdf").unwrap();
        assert_eq!(resolved, resolver.root().join("file.pdf"));
    }

    #[test]
    fn test_absolute_path_rejected() {
        let (_dir, resolver) = resolver();
        let result = resolver.resolve("/etc/passwd");
        assert!(matches!(result, Err(Error::SecurityViolation { .. })));
    }

    #[test]
    fn test_traversal_rejected() {
        let (_dir, resolver) = resolver();
        let result = resolver.resolve("../../etc/passwd");
        assert!(matches!(result, Err(Error::SecurityViolation { .. })));
    }

    #[test]
    fn test_traversal_through_subdirectory_rejected() {
        let (_dir, resolver) = resolver();
        let result = resolver.resolve("docs/../../outside.pdf");
        assert!(matches!(result, Err(Error::SecurityViolation { .. })));
    }

    #[test]
    fn test_empty_path_rejected() {
        let (_dir, resolver) = resolver();
        assert!(matches!(
            resolver.resolve(""),
            Err(Error::InvalidInput { .. })
        ));
        assert!(matches!(
            resolver.resolve("   "),
            Err(Error::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_nonexistent_path_still_resolves() {
        // Existence is the caller's concern, not the resolver's
        let (_dir, resolver) = resolver();
        let resolved = resolver.resolve("does/not/exist.pdf").unwrap();
        assert!(resolved.starts_with(resolver.root()));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let (dir, resolver) = resolver();
        let outside = tempfile::tempdir().expect("tempdir");
        let target = outside.path().join("secret.pdf");
        std::fs::write(&target, b"%PDF").unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("link.pdf")).unwrap();

        let result = resolver.resolve("link.pdf");
        assert!(matches!(result, Err(Error::SecurityViolation { .. })));
    }
}
