//! Parser for `/proc/buddyinfo`.
//!
//! Each line reports the free-block counts of one (node, zone) pair:
//!
//! ```text
//! Node 0, zone      DMA      1      1      1      0      2      1      1      0      1      1      3
//! ```
//!
//! Whitespace-split, that is 4 prefix tokens followed by one count per page
//! order. Only the 11-order layout is accepted; anything else is rejected
//! rather than guessed at.

/// Number of page orders reported per line.
pub const PAGE_ORDERS: usize = 11;

/// Whitespace-separated tokens in a valid line.
pub const FIELD_COUNT: usize = 4 + PAGE_ORDERS;

const NODE_TOKEN: usize = 1;
const ZONE_TOKEN: usize = 3;
const FIRST_COUNT_TOKEN: usize = 4;

/// A rejected buddyinfo line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("expected {expected} fields, found {actual} in line {line:?}")]
    FieldCountMismatch {
        expected: usize,
        actual: usize,
        line: String,
    },

    #[error("count {token:?} for order {order} is not a non-negative integer in line {line:?}")]
    NonNumericField {
        order: usize,
        token: String,
        line: String,
    },
}

impl ParseError {
    /// Short machine-readable reason, stable across releases.
    pub fn reason(&self) -> &'static str {
        match self {
            ParseError::FieldCountMismatch { .. } => "field-count-mismatch",
            ParseError::NonNumericField { .. } => "non-numeric-field",
        }
    }
}

/// One parsed buddyinfo line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuddyRecord {
    /// Node id, the first character of the node token (`"0,"` -> `"0"`).
    pub node: String,
    /// Zone name as printed by the kernel (`DMA`, `DMA32`, `Normal`, ...).
    pub zone: String,
    /// Free-block counts; index `i` counts blocks of `2^i` pages. The literal
    /// token text is kept.
    pub run_counts: Vec<String>,
}

/// Parses a single buddyinfo line.
pub fn parse_buddyinfo_line(line: &str) -> Result<BuddyRecord, ParseError> {
    let fields: Vec<&str> = line.split_whitespace().collect();

    if fields.len() != FIELD_COUNT {
        return Err(ParseError::FieldCountMismatch {
            expected: FIELD_COUNT,
            actual: fields.len(),
            line: line.to_string(),
        });
    }

    let counts = &fields[FIRST_COUNT_TOKEN..];
    for (order, token) in counts.iter().enumerate() {
        if !is_count(token) {
            return Err(ParseError::NonNumericField {
                order,
                token: token.to_string(),
                line: line.to_string(),
            });
        }
    }

    // split_whitespace never yields empty tokens
    let node = fields[NODE_TOKEN]
        .chars()
        .next()
        .map(String::from)
        .unwrap_or_default();

    Ok(BuddyRecord {
        node,
        zone: fields[ZONE_TOKEN].to_string(),
        run_counts: counts.iter().map(|s| s.to_string()).collect(),
    })
}

/// Parses a whole buddyinfo file, stopping at the first bad line.
///
/// On failure returns the 1-based number of the offending line with the error.
pub fn parse_buddyinfo(content: &str) -> Result<Vec<BuddyRecord>, (usize, ParseError)> {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| parse_buddyinfo_line(line).map_err(|e| (idx + 1, e)))
        .collect()
}

fn is_count(token: &str) -> bool {
    token.parse::<u64>().is_ok() && token.bytes().all(|b| b.is_ascii_digit())
}
