//! Pre-built `/proc/buddyinfo` states for testing.

use super::filesystem::MockFs;
use crate::collector::DEFAULT_BUDDYINFO_PATH;
use std::path::Path;

/// Two-node machine: DMA, DMA32 and Normal on node 0, Normal on node 1.
pub const TYPICAL_BUDDYINFO: &str = "\
Node 0, zone      DMA      1      1      1      0      2      1      1      0      1      1      3
Node 0, zone    DMA32      3      6      5      3      3      4      2      4      3      1    270
Node 0, zone   Normal  23821   5715     90     16      8      4      9      2      0      0      0
Node 1, zone   Normal   3888  10304    405    139     50     59     38     19      4      2      9
";

/// The node 0 `Normal` line is missing its last order.
pub const TRUNCATED_BUDDYINFO: &str = "\
Node 0, zone      DMA      1      1      1      0      2      1      1      0      1      1      3
Node 0, zone   Normal  23821   5715     90     16      8      4      9      2      0      0
";

impl MockFs {
    /// Buddyinfo of a typical two-node machine at the default path.
    pub fn typical_buddyinfo() -> Self {
        Self::with_buddyinfo(DEFAULT_BUDDYINFO_PATH, TYPICAL_BUDDYINFO)
    }

    /// A single buddyinfo file with arbitrary content.
    pub fn with_buddyinfo(path: impl AsRef<Path>, content: &str) -> Self {
        let mut fs = Self::new();
        fs.add_file(path, content);
        fs
    }
}
