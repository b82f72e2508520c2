//! Canonical directory form and the filesystem probes reconciliation relies on.

use crate::{DbError, Result};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Sentinel the downloader leaves in every account/list root it manages.
/// Only ever checked for here, never written.
pub const MARKER_FILE: &str = ".user";

/// An absolute, lexically cleaned directory that can be stored as text.
///
/// Every directory entering the store or the reconciliation engine goes
/// through [`CanonicalDir::new`] exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalDir {
    path: PathBuf,
    text: String,
}

impl CanonicalDir {
    /// Resolve `dir` against the current directory and drop `.`/`..`
    /// components. Symlinks are not followed and the directory need not exist.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let absolute = std::path::absolute(dir.as_ref())?;
        let path = clean(&absolute);
        let text = path
            .to_str()
            .ok_or_else(|| DbError::NonUtf8Path(path.clone()))?
            .to_owned();
        Ok(Self { path, text })
    }

    pub fn as_path(&self) -> &Path {
        &self.path
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn to_path_buf(&self) -> PathBuf {
        self.path.clone()
    }

    /// Same comparison the store applies to `parent_dir` (`COLLATE NOCASE`).
    pub fn matches(&self, stored: &Path) -> bool {
        stored
            .to_str()
            .is_some_and(|s| s.eq_ignore_ascii_case(&self.text))
    }

    pub fn has_marker(&self) -> Result<bool> {
        has_marker(&self.path)
    }

    pub fn exists(&self) -> Result<bool> {
        probe(&self.path)
    }
}

impl fmt::Display for CanonicalDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Whether `dir` directly contains the marker file.
pub fn has_marker(dir: &Path) -> Result<bool> {
    probe(&dir.join(MARKER_FILE))
}

// Missing paths are an answer, not a failure. Anything else (permissions,
// I/O) propagates.
fn probe(path: &Path) -> Result<bool> {
    match std::fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn relative_dirs_become_absolute() {
        let dir = CanonicalDir::new("downloads/users").unwrap();
        assert!(dir.as_path().is_absolute());
        assert!(dir.as_path().ends_with("downloads/users"));
    }

    #[cfg(unix)]
    #[test]
    fn dot_components_are_removed() {
        let dir = CanonicalDir::new("/data/./media/../users/").unwrap();
        assert_eq!(dir.as_str(), "/data/users");
    }

    #[cfg(unix)]
    #[test]
    fn parent_of_root_stays_at_root() {
        let dir = CanonicalDir::new("/../data").unwrap();
        assert_eq!(dir.as_str(), "/data");
    }

    #[cfg(unix)]
    #[test]
    fn matches_ignores_ascii_case() {
        let dir = CanonicalDir::new("/Data/Alice").unwrap();
        assert!(dir.matches(Path::new("/data/alice")));
        assert!(!dir.matches(Path::new("/data/alice2")));
    }

    #[test]
    fn marker_probe_follows_the_filesystem() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = CanonicalDir::new(tmp.path()).unwrap();
        assert!(dir.exists().unwrap());
        assert!(!dir.has_marker().unwrap());

        fs::write(tmp.path().join(MARKER_FILE), b"").unwrap();
        assert!(dir.has_marker().unwrap());
    }

    #[test]
    fn missing_directory_is_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let gone = CanonicalDir::new(tmp.path().join("never-created")).unwrap();
        assert!(!gone.exists().unwrap());
        assert!(!gone.has_marker().unwrap());
    }

    #[test]
    fn other_filesystem_errors_propagate() {
        // An interior NUL is rejected by the OS layer even for root.
        let err = has_marker(Path::new("/tmp/bad\0dir")).unwrap_err();
        match err {
            DbError::Io(e) => assert_eq!(e.kind(), ErrorKind::InvalidInput),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn file_in_place_of_a_directory_reads_as_no_marker() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("plain");
        fs::write(&file, b"x").unwrap();
        assert!(!has_marker(&file).unwrap());
    }
}
