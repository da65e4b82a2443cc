//! Measurement points built from buddyinfo records.
//!
//! Node and zone become tags (indexed, low cardinality); the per-order counts
//! become fields keyed by block size in pages (`1p`, `2p`, `4p`, ... `1024p`).

pub mod batch;
pub mod line_protocol;

use std::collections::BTreeMap;

use crate::collector::BuddyRecord;

pub use batch::{Batch, assemble};
pub use line_protocol::{FieldEncoding, render_batch};

/// Tag set of a point. Sorted, so rendering is deterministic.
pub type Tags = BTreeMap<String, String>;

/// A single measurement point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Point {
    pub measurement: String,
    pub tags: Tags,
    /// `(label, count)` in page-order order.
    pub fields: Vec<(String, String)>,
    /// Nanoseconds since the Unix epoch. `None` until the batch assigns it.
    pub timestamp: Option<i64>,
}

impl Point {
    /// Looks up a field by label.
    pub fn field(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, value)| value.as_str())
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// Field label for a page order: `2^order` followed by `p`.
pub fn page_order_label(order: usize) -> String {
    format!("{}p", 1u64 << order)
}

/// Encodes a record into an untimestamped point.
///
/// The tag map is a fresh copy of `static_tags` per point; `node` and `zone`
/// from the record overwrite static tags of the same name.
pub fn encode_record(record: &BuddyRecord, measurement: &str, static_tags: &Tags) -> Point {
    let mut tags = static_tags.clone();
    tags.insert("node".to_string(), record.node.clone());
    tags.insert("zone".to_string(), record.zone.clone());

    let fields = record
        .run_counts
        .iter()
        .enumerate()
        .map(|(order, count)| (page_order_label(order), count.clone()))
        .collect();

    Point {
        measurement: measurement.to_string(),
        tags,
        fields,
        timestamp: None,
    }
}
