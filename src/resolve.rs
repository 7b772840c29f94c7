//! Resolution of a user-supplied project identifier to a path on disk.
//!
//! The input is tried as a literal path first (absolute or relative to the
//! working directory), then joined onto the configured projects root.
//! No symlink resolution or traversal checks are performed: `..` components
//! in the input are honored as given.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from project path resolution.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no project path given")]
    EmptyInput,
    #[error("project not found at '{}' or '{}'", literal.display(), joined.display())]
    NotFound { literal: PathBuf, joined: PathBuf },
    #[error("path '{}' does not exist and PROJECTS_ROOT is not set", literal.display())]
    NotFoundNoRoot { literal: PathBuf },
}

/// An absolute path that existed when it was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath(PathBuf);

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for ResolvedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Resolve `input` to an existing path.
pub fn resolve(input: &str, projects_root: Option<&Path>) -> Result<ResolvedPath, ResolveError> {
    if input.trim().is_empty() {
        return Err(ResolveError::EmptyInput);
    }

    let literal = PathBuf::from(input);
    if literal.exists() {
        return Ok(absolutize(literal));
    }

    let Some(root) = projects_root else {
        return Err(ResolveError::NotFoundNoRoot { literal });
    };

    let joined = root.join(input);
    if joined.exists() {
        tracing::debug!(input, path = %joined.display(), "resolved via projects root");
        return Ok(absolutize(joined));
    }

    Err(ResolveError::NotFound { literal, joined })
}

fn absolutize(path: PathBuf) -> ResolvedPath {
    // Lexical only; falls back to the path as given if the cwd is gone.
    match std::path::absolute(&path) {
        Ok(abs) => ResolvedPath(abs),
        Err(_) => ResolvedPath(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_literal_path_wins() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("shop");
        std::fs::create_dir(&project).unwrap();

        let resolved = resolve(project.to_str().unwrap(), None).unwrap();
        assert_eq!(resolved.as_path(), project);
        assert!(resolved.as_path().is_absolute());
    }

    #[test]
    fn test_projects_root_join() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("myapp-4c1e")).unwrap();

        // "myapp-4c1e" does not exist relative to the cwd, only under the root.
        let resolved = resolve("myapp-4c1e", Some(root.path())).unwrap();
        assert_eq!(resolved.as_path(), root.path().join("myapp-4c1e"));
    }

    #[test]
    fn test_not_found_names_both_candidates() {
        let root = TempDir::new().unwrap();
        let err = resolve("no-such-project-7f3a", Some(root.path())).unwrap_err();
        match &err {
            ResolveError::NotFound { literal, joined } => {
                assert_eq!(literal, &PathBuf::from("no-such-project-7f3a"));
                assert_eq!(joined, &root.path().join("no-such-project-7f3a"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        let msg = err.to_string();
        assert!(msg.contains("'no-such-project-7f3a'"));
        assert!(msg.contains(&root.path().join("no-such-project-7f3a").display().to_string()));
    }

    #[test]
    fn test_not_found_without_root() {
        let err = resolve("no-such-project-7f3a", None).unwrap_err();
        assert_eq!(
            err,
            ResolveError::NotFoundNoRoot {
                literal: PathBuf::from("no-such-project-7f3a")
            }
        );
        assert!(err.to_string().contains("PROJECTS_ROOT is not set"));
    }

    #[test]
    fn test_empty_input_rejected() {
        assert_eq!(resolve("", None).unwrap_err(), ResolveError::EmptyInput);
        assert_eq!(resolve("   ", None).unwrap_err(), ResolveError::EmptyInput);
    }
}
