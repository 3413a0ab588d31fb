//! Persisted slot list.
//!
//! Format: one absolute source path per line, in slot order.
//!
//! ```text
//! /media/intro.mp4
//! /media/loop.mkv
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::MediaSource;

/// Reads and writes the slot list file.
#[derive(Debug, Clone)]
pub struct SlotListStore {
    path: PathBuf,
}

impl SlotListStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the slot list.
    ///
    /// A missing file yields an empty list. Blank lines, duplicates and
    /// entries whose file no longer exists are dropped. Entries are taken
    /// verbatim, so names with leading or trailing spaces survive.
    pub fn load(&self) -> io::Result<Vec<MediaSource>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut sources: Vec<MediaSource> = Vec::new();
        for line in content.lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            match MediaSource::new(line) {
                Ok(source) if !sources.contains(&source) => sources.push(source),
                Ok(_) => debug!(path = %line, "Skipping duplicate slot list entry"),
                Err(e) => warn!(path = %line, error = %e, "Dropping missing slot list entry"),
            }
        }

        Ok(sources)
    }

    /// Write the slot list atomically (temp file + rename).
    pub fn save(&self, sources: &[MediaSource]) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut content = String::new();
        for source in sources {
            let line = source
                .path()
                .to_str()
                .filter(|p| !p.contains(['\n', '\r']))
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("cannot store {} in the slot list", source.path().display()),
                    )
                })?;
            content.push_str(line);
            content.push('\n');
        }

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = SlotListStore::new(dir.path().join("slots.txt"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.mp4");
        let b = dir.path().join("b with space.mp4");
        fs::write(&a, b"a").unwrap();
        fs::write(&b, b"b").unwrap();

        let sources = vec![MediaSource::new(&b).unwrap(), MediaSource::new(&a).unwrap()];
        let store = SlotListStore::new(dir.path().join("state/slots.txt"));
        store.save(&sources).unwrap();

        assert_eq!(store.load().unwrap(), sources);
    }

    #[test]
    fn test_surrounding_spaces_in_names_survive() {
        let dir = TempDir::new().unwrap();
        let trailing = dir.path().join("clip.mp4 ");
        let leading = dir.path().join(" intro.mp4");
        fs::write(&trailing, b"t").unwrap();
        fs::write(&leading, b"l").unwrap();

        let sources = vec![
            MediaSource::new(&trailing).unwrap(),
            MediaSource::new(&leading).unwrap(),
        ];
        let store = SlotListStore::new(dir.path().join("slots.txt"));
        store.save(&sources).unwrap();

        assert_eq!(store.load().unwrap(), sources);
    }

    #[test]
    fn test_save_rejects_line_breaks() {
        let dir = TempDir::new().unwrap();
        let store = SlotListStore::new(dir.path().join("slots.txt"));
        let bad = MediaSource::from_trusted(PathBuf::from("/media/a\nb.mp4"));

        let err = store.save(&[bad]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_load_drops_stale_and_blank_entries() {
        let dir = TempDir::new().unwrap();
        let keep = dir.path().join("keep.mp4");
        fs::write(&keep, b"k").unwrap();
        let list = dir.path().join("slots.txt");
        fs::write(
            &list,
            format!(
                "{}\n\n/nowhere/gone.mp4\n{}\n",
                keep.display(),
                keep.display()
            ),
        )
        .unwrap();

        let loaded = SlotListStore::new(&list).load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], MediaSource::new(&keep).unwrap());
    }
}
