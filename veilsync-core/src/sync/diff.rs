//! Collection diff: classify names present on either cluster.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::sync::models::CollectionStats;

/// Classification of one collection name across the two clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    LocalOnly,
    CloudOnly,
    Synced,
    Diverged,
}

impl DiffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalOnly => "local_only",
            Self::CloudOnly => "cloud_only",
            Self::Synced => "synced",
            Self::Diverged => "diverged",
        }
    }
}

/// One row of a collection diff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<CollectionStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud: Option<CollectionStats>,
    pub status: DiffStatus,
}

/// Aggregate diff result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffReport {
    pub entries: Vec<DiffEntry>,
    pub synced: u64,
    pub diverged: u64,
    pub local_only: u64,
    pub cloud_only: u64,
}

impl DiffReport {
    pub fn from_entries(entries: Vec<DiffEntry>) -> Self {
        let count = |status: DiffStatus| entries.iter().filter(|e| e.status == status).count() as u64;
        Self {
            synced: count(DiffStatus::Synced),
            diverged: count(DiffStatus::Diverged),
            local_only: count(DiffStatus::LocalOnly),
            cloud_only: count(DiffStatus::CloudOnly),
            entries,
        }
    }
}

/// Diff two stats maps over the union of their collection names, sorted
/// ascending.
///
/// Only point counts decide the status; a dimension mismatch stays visible
/// in the entry but never reclassifies it.
pub fn diff_collections(
    local: &BTreeMap<String, CollectionStats>,
    cloud: &BTreeMap<String, CollectionStats>,
) -> Vec<DiffEntry> {
    let mut names: Vec<&String> = local.keys().chain(cloud.keys()).collect();
    names.sort();
    names.dedup();

    names
        .into_iter()
        .filter_map(|name| {
            let l = local.get(name).copied();
            let c = cloud.get(name).copied();
            let status = match (&l, &c) {
                (Some(_), None) => DiffStatus::LocalOnly,
                (None, Some(_)) => DiffStatus::CloudOnly,
                (Some(l), Some(c)) if l.points == c.points => DiffStatus::Synced,
                (Some(_), Some(_)) => DiffStatus::Diverged,
                (None, None) => return None,
            };
            Some(DiffEntry {
                name: name.clone(),
                local: l,
                cloud: c,
                status,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(points: u64, dimension: u64) -> CollectionStats {
        CollectionStats { points, dimension }
    }

    fn map(pairs: &[(&str, CollectionStats)]) -> BTreeMap<String, CollectionStats> {
        pairs.iter().map(|(n, s)| (n.to_string(), *s)).collect()
    }

    #[test]
    fn classifies_all_four_states() {
        let local = map(&[
            ("a", stats(10, 8)),
            ("b", stats(5, 8)),
            ("d", stats(7, 8)),
        ]);
        let cloud = map(&[
            ("a", stats(10, 8)),
            ("c", stats(3, 8)),
            ("d", stats(9, 8)),
        ]);

        let entries = diff_collections(&local, &cloud);
        let statuses: Vec<(&str, DiffStatus)> = entries
            .iter()
            .map(|e| (e.name.as_str(), e.status))
            .collect();

        assert_eq!(
            statuses,
            vec![
                ("a", DiffStatus::Synced),
                ("b", DiffStatus::LocalOnly),
                ("c", DiffStatus::CloudOnly),
                ("d", DiffStatus::Diverged),
            ]
        );
    }

    #[test]
    fn aggregate_counts_for_mixed_maps() {
        // local {a:10, b:5}, cloud {a:10, c:3}
        let local = map(&[("a", stats(10, 8)), ("b", stats(5, 8))]);
        let cloud = map(&[("a", stats(10, 8)), ("c", stats(3, 8))]);

        let report = DiffReport::from_entries(diff_collections(&local, &cloud));
        assert_eq!(report.synced, 1);
        assert_eq!(report.diverged, 0);
        assert_eq!(report.local_only, 1);
        assert_eq!(report.cloud_only, 1);
    }

    #[test]
    fn every_name_appears_exactly_once_sorted() {
        let local = map(&[("zeta", stats(1, 4)), ("alpha", stats(2, 4))]);
        let cloud = map(&[("mike", stats(3, 4)), ("alpha", stats(2, 4))]);

        let entries = diff_collections(&local, &cloud);
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mike", "zeta"]);
    }

    #[test]
    fn dimension_mismatch_does_not_change_status() {
        let local = map(&[("a", stats(10, 8))]);
        let cloud = map(&[("a", stats(10, 1536))]);

        let entries = diff_collections(&local, &cloud);
        assert_eq!(entries[0].status, DiffStatus::Synced);
        assert_eq!(entries[0].local.unwrap().dimension, 8);
        assert_eq!(entries[0].cloud.unwrap().dimension, 1536);
    }

    #[test]
    fn empty_maps_produce_empty_diff() {
        let entries = diff_collections(&BTreeMap::new(), &BTreeMap::new());
        assert!(entries.is_empty());

        let report = DiffReport::from_entries(entries);
        assert_eq!(report.synced + report.diverged + report.local_only + report.cloud_only, 0);
    }

    #[test]
    fn status_strings_are_wire_format() {
        assert_eq!(DiffStatus::LocalOnly.as_str(), "local_only");
        assert_eq!(
            serde_json::to_string(&DiffStatus::CloudOnly).unwrap(),
            "\"cloud_only\""
        );
    }
}
