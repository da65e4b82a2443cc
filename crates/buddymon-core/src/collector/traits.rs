//! Filesystem access used by the collector.
//!
//! `/proc/buddyinfo` only exists on Linux, so the collector reads through the
//! `FileSystem` trait and tests substitute [`MockFs`](super::MockFs).

use std::io;
use std::path::Path;

/// Read-only view of the files the collector needs.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}
