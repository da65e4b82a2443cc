//! Per-cycle batch assembly.
//!
//! The destination identifies a point by `(measurement, tags, timestamp)`, and
//! a duplicate identity silently replaces the earlier point. Timestamps are
//! therefore spaced one nanosecond apart from the cycle's base time, so points
//! stay distinct even where the clock is coarser than the loop or tags collapse.

use std::collections::BTreeSet;

use crate::collector::BuddyRecord;
use crate::point::{Point, Tags, encode_record};

/// Points produced by one polling cycle, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    points: Vec<Point>,
}

impl Batch {
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Short human-readable summary for logs, e.g. `4 points (nodes 0,1; zones DMA,DMA32,Normal)`.
    pub fn describe(&self) -> String {
        let nodes: BTreeSet<&str> = self.points.iter().filter_map(|p| p.tag("node")).collect();
        let zones: BTreeSet<&str> = self.points.iter().filter_map(|p| p.tag("zone")).collect();

        format!(
            "{} points (nodes {}; zones {})",
            self.points.len(),
            nodes.into_iter().collect::<Vec<_>>().join(","),
            zones.into_iter().collect::<Vec<_>>().join(",")
        )
    }
}

impl From<Vec<Point>> for Batch {
    fn from(points: Vec<Point>) -> Self {
        Self { points }
    }
}

/// Encodes `records` and stamps them `base_ns`, `base_ns + 1`, ... in input order.
pub fn assemble<'a>(
    records: impl IntoIterator<Item = &'a BuddyRecord>,
    measurement: &str,
    static_tags: &Tags,
    base_ns: i64,
) -> Batch {
    let points = records
        .into_iter()
        .zip(base_ns..)
        .map(|(record, timestamp)| {
            let mut point = encode_record(record, measurement, static_tags);
            point.timestamp = Some(timestamp);
            point
        })
        .collect();

    Batch { points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::buddyinfo::parse_buddyinfo;
    use crate::collector::mock::TYPICAL_BUDDYINFO;
    use std::collections::HashSet;

    const BASE: i64 = 1_700_000_000_000_000_000;

    fn typical_batch(tags: &Tags) -> Batch {
        let records = parse_buddyinfo(TYPICAL_BUDDYINFO).unwrap();
        assemble(&records, "buddyinfo", tags, BASE)
    }

    #[test]
    fn test_assemble_typical() {
        let batch = typical_batch(&Tags::new());

        assert_eq!(batch.len(), 4);
        let pairs: HashSet<(&str, &str)> = batch
            .points()
            .iter()
            .map(|p| (p.tag("node").unwrap(), p.tag("zone").unwrap()))
            .collect();
        assert_eq!(pairs.len(), 4);
    }

    #[test]
    fn test_timestamps_step_by_one_nanosecond() {
        let batch = typical_batch(&Tags::new());

        let stamps: Vec<i64> = batch.points().iter().map(|p| p.timestamp.unwrap()).collect();
        assert_eq!(stamps, vec![BASE, BASE + 1, BASE + 2, BASE + 3]);
        assert!(stamps.windows(2).all(|w| w[1] - w[0] == 1));
    }

    #[test]
    fn test_identities_unique_even_with_collapsed_tags() {
        let record = parse_buddyinfo(TYPICAL_BUDDYINFO).unwrap().remove(0);
        let records = vec![record.clone(), record.clone(), record];

        let batch = assemble(&records, "buddyinfo", &Tags::new(), BASE);

        let identities: HashSet<(Tags, i64)> = batch
            .points()
            .iter()
            .map(|p| (p.tags.clone(), p.timestamp.unwrap()))
            .collect();
        assert_eq!(identities.len(), 3);
    }

    #[test]
    fn test_order_matches_input() {
        let batch = typical_batch(&Tags::new());
        let zones: Vec<&str> = batch.points().iter().map(|p| p.tag("zone").unwrap()).collect();
        assert_eq!(zones, vec!["DMA", "DMA32", "Normal", "Normal"]);
    }

    #[test]
    fn test_points_own_their_tags() {
        let tags = Tags::from([("host".to_string(), "db01".to_string())]);
        let batch = typical_batch(&tags);

        assert_eq!(batch.points()[0].tag("zone"), Some("DMA"));
        assert_eq!(batch.points()[3].tag("zone"), Some("Normal"));
        assert_eq!(batch.points()[3].tag("node"), Some("1"));
        assert!(batch.points().iter().all(|p| p.tag("host") == Some("db01")));
        assert_eq!(tags.len(), 1);
    }

    #[test]
    fn test_assemble_empty() {
        let batch = assemble(&Vec::<BuddyRecord>::new(), "buddyinfo", &Tags::new(), BASE);
        assert!(batch.is_empty());
        assert_eq!(batch.describe(), "0 points (nodes ; zones )");
    }

    #[test]
    fn test_describe() {
        let batch = typical_batch(&Tags::new());
        assert_eq!(
            batch.describe(),
            "4 points (nodes 0,1; zones DMA,DMA32,Normal)"
        );
    }
}
