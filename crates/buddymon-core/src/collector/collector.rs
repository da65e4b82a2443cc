//! Reads and validates one buddyinfo snapshot per call.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::trace;

use crate::collector::buddyinfo::{BuddyRecord, ParseError, parse_buddyinfo};
use crate::collector::traits::FileSystem;

/// Error type for collection failures.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// The source file is missing or unreadable.
    #[error("failed to read {}: {source}", .path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line did not match the buddyinfo layout; nothing from this read is usable.
    #[error("{}:{line_number}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        line_number: usize,
        #[source]
        source: ParseError,
    },
}

/// Collects buddyinfo records from a file.
pub struct BuddyinfoCollector<F: FileSystem> {
    fs: F,
    path: PathBuf,
}

impl<F: FileSystem> BuddyinfoCollector<F> {
    /// Creates a collector reading `path` through `fs`.
    pub fn new(fs: F, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mutable access to the filesystem, used by tests to change the source between cycles.
    pub fn fs_mut(&mut self) -> &mut F {
        &mut self.fs
    }

    /// Reads the source file and parses every line.
    ///
    /// All-or-nothing: the first malformed line fails the whole read.
    pub fn collect(&mut self) -> Result<Vec<BuddyRecord>, CollectError> {
        let start = Instant::now();

        let content =
            self.fs
                .read_to_string(&self.path)
                .map_err(|source| CollectError::SourceRead {
                    path: self.path.clone(),
                    source,
                })?;

        let records =
            parse_buddyinfo(&content).map_err(|(line_number, source)| CollectError::Invalid {
                path: self.path.clone(),
                line_number,
                source,
            })?;

        let elapsed = start.elapsed();
        trace!(
            path = %self.path.display(),
            records = records.len(),
            elapsed_us = elapsed.as_micros() as u64,
            "buddyinfo collected"
        );

        Ok(records)
    }
}
