//! Media source value type.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::MediaSourceError;

/// Absolute path to a source media file.
///
/// The file must exist when the source is created. It may disappear later;
/// that only surfaces when a stream for it is started.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaSource(PathBuf);

impl MediaSource {
    /// Validate and canonicalize a path into a media source.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, MediaSourceError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(MediaSourceError::EmptyPath);
        }

        let metadata = std::fs::metadata(path)
            .map_err(|_| MediaSourceError::NotFound(path.to_path_buf()))?;
        if !metadata.is_file() {
            return Err(MediaSourceError::NotAFile(path.to_path_buf()));
        }

        let absolute = path.canonicalize().map_err(|e| MediaSourceError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if absolute.to_str().is_none_or(|s| s.contains(['\n', '\r'])) {
            return Err(MediaSourceError::UnsupportedName(absolute));
        }

        Ok(Self(absolute))
    }

    /// Wrap a path as-is, without touching the filesystem or checking it.
    ///
    /// Test fixtures only; everything else goes through [`MediaSource::new`].
    pub fn from_trusted(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// File name for display (falls back to the full path).
    pub fn file_name(&self) -> String {
        self.0.file_name().map_or_else(
            || self.0.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
    }

    /// Whether the underlying file still exists.
    pub fn exists(&self) -> bool {
        self.0.is_file()
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for MediaSource {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_accepts_existing_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("clip.mp4");
        std::fs::write(&file, b"not really a video").unwrap();

        let source = MediaSource::new(&file).unwrap();
        assert!(source.path().is_absolute());
        assert_eq!(source.file_name(), "clip.mp4");
        assert!(source.exists());
    }

    #[test]
    fn test_new_rejects_missing_file() {
        let err = MediaSource::new("/definitely/not/here.mp4").unwrap_err();
        assert!(matches!(err, MediaSourceError::NotFound(_)));
    }

    #[test]
    fn test_new_rejects_directory() {
        let dir = TempDir::new().unwrap();
        let err = MediaSource::new(dir.path()).unwrap_err();
        assert!(matches!(err, MediaSourceError::NotAFile(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_new_rejects_line_break_in_name() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("two\nlines.mp4");
        std::fs::write(&file, b"x").unwrap();

        let err = MediaSource::new(&file).unwrap_err();
        assert!(matches!(err, MediaSourceError::UnsupportedName(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_new_rejects_non_utf8_name() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        let file = dir.path().join(OsStr::from_bytes(b"caf\xff.mp4"));
        // Some filesystems refuse non-UTF-8 names outright
        if std::fs::write(&file, b"x").is_err() {
            return;
        }

        let err = MediaSource::new(&file).unwrap_err();
        assert!(matches!(err, MediaSourceError::UnsupportedName(_)));
    }

    #[test]
    fn test_new_rejects_empty_path() {
        let err = MediaSource::new("").unwrap_err();
        assert!(matches!(err, MediaSourceError::EmptyPath));
    }

    #[test]
    fn test_source_goes_stale_after_delete() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("gone.mkv");
        std::fs::write(&file, b"x").unwrap();

        let source = MediaSource::new(&file).unwrap();
        std::fs::remove_file(&file).unwrap();
        assert!(!source.exists());
    }
}
