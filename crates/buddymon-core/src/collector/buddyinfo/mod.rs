//! Reader for the kernel's `/proc/buddyinfo` free-page statistics.

pub mod parser;

pub use parser::{
    BuddyRecord, FIELD_COUNT, PAGE_ORDERS, ParseError, parse_buddyinfo, parse_buddyinfo_line,
};
