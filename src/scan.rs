//! Recursive enumeration of files to analyze.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Suffixes scanned when no extension list is configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".php", ".html", ".htm", ".js", ".css"];

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Returns true when `name` ends with one of `extensions` (case-sensitive).
pub fn matches_extension<S: AsRef<str>>(name: &str, extensions: &[S]) -> bool {
    extensions.iter().any(|ext| name.ends_with(ext.as_ref()))
}

/// Collect every file under `root` whose name matches one of `extensions`.
///
/// Directories are descended without a depth limit. Symbolic links to files
/// are collected under the link's own path; links to directories are not
/// descended, so link cycles cannot make the walk run forever. Entries within
/// a directory are visited in file name order.
pub fn enumerate<P, S>(root: P, extensions: &[S]) -> Result<Vec<PathBuf>, ScanError>
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    let root = root.as_ref();
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(ScanError::Walk {
                    path: root.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };

        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if matches_extension(&name, extensions) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
