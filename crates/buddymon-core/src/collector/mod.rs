//! Buddyinfo collection for Linux.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │           BuddyinfoCollector             │
//! │  read file ──► parse_buddyinfo (per line)│
//! └──────────────────┬───────────────────────┘
//!                    │
//!             ┌──────▼──────┐
//!             │  FileSystem │ (trait)
//!             └──────┬──────┘
//!            ┌───────┴───────┐
//!     ┌──────▼──────┐ ┌──────▼──────┐
//!     │   RealFs    │ │   MockFs    │
//!     │  (Linux)    │ │  (Testing)  │
//!     └─────────────┘ └─────────────┘
//! ```
//!
//! ```
//! use buddymon_core::collector::{BuddyinfoCollector, DEFAULT_BUDDYINFO_PATH, MockFs};
//!
//! let mut collector = BuddyinfoCollector::new(MockFs::typical_buddyinfo(), DEFAULT_BUDDYINFO_PATH);
//! let records = collector.collect().unwrap();
//! assert_eq!(records.len(), 4);
//! ```

pub mod buddyinfo;
#[allow(clippy::module_inception)]
mod collector;
pub mod mock;
pub mod traits;

pub use buddyinfo::{BuddyRecord, ParseError};
pub use collector::{BuddyinfoCollector, CollectError};
pub use mock::MockFs;
pub use traits::{FileSystem, RealFs};

/// Where the kernel exposes buddy allocator statistics.
pub const DEFAULT_BUDDYINFO_PATH: &str = "/proc/buddyinfo";
