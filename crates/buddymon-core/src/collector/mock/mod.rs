//! Mock filesystem and fixtures for testing without Linux.

mod filesystem;
mod scenarios;

pub use filesystem::MockFs;
pub use scenarios::{TRUNCATED_BUDDYINFO, TYPICAL_BUDDYINFO};
