//! In-memory mock filesystem for testing the collector without real `/proc`.

use crate::collector::traits::FileSystem;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
///
/// Files can be added, replaced and removed between cycles, which lets tests
/// simulate a source file that disappears or turns malformed mid-run.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    files: HashMap<PathBuf, String>,
}

impl MockFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a file with the given content.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.files.insert(path.as_ref().to_path_buf(), content.into());
    }

    /// Removes a file, returning its previous content.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) -> Option<String> {
        self.files.remove(path.as_ref())
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_fs_add_file() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/buddyinfo", "Node 0, zone DMA\n");

        let content = fs.read_to_string(Path::new("/proc/buddyinfo")).unwrap();
        assert_eq!(content, "Node 0, zone DMA\n");

        fs.add_file("/proc/buddyinfo", "Node 1, zone Normal\n");
        let content = fs.read_to_string(Path::new("/proc/buddyinfo")).unwrap();
        assert_eq!(content, "Node 1, zone Normal\n");
    }

    #[test]
    fn test_mock_fs_remove_file() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/buddyinfo", "x");

        assert_eq!(fs.remove_file("/proc/buddyinfo").as_deref(), Some("x"));
        assert!(fs.read_to_string(Path::new("/proc/buddyinfo")).is_err());
        assert!(fs.remove_file("/proc/buddyinfo").is_none());
    }

    #[test]
    fn test_mock_fs_not_found() {
        let fs = MockFs::new();
        let result = fs.read_to_string(Path::new("/nonexistent"));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }
}
