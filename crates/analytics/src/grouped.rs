use crate::statistics::{self, Statistics};
use core_types::{AssessmentRecord, MetricKey, ScopeField};
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Name of the partition holding records without a value for the grouping field.
pub const UNKNOWN_GROUP: &str = "Unknown";

/// Statistics of one partition of a benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedStat {
    pub group_name: String,
    /// Set for the partition of records missing the grouping attribute, so it
    /// stays distinguishable from a literal "Unknown" value.
    pub is_unknown: bool,
    pub count: usize,
    /// Metrics with no data in this group are absent.
    pub metrics: BTreeMap<MetricKey, Statistics>,
}

/// Splits records by the exact value of `field`. Records without a value go to
/// a separate `None` partition, so partition sizes always add up to the input.
pub fn partition(
    records: &[AssessmentRecord],
    field: ScopeField,
) -> Vec<(Option<String>, Vec<&AssessmentRecord>)> {
    let mut groups: Vec<_> = records
        .iter()
        .into_group_map_by(|record| record.attribute(field))
        .into_iter()
        .collect();

    // Largest groups first, ties by name, the unknown partition last.
    groups.sort_by(|(a_key, a), (b_key, b)| match (a_key, b_key) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a_name), Some(b_name)) => b.len().cmp(&a.len()).then_with(|| a_name.cmp(b_name)),
    });
    groups
}

/// Computes per-group statistics. Groups and the metrics within each group are
/// independent tasks.
pub fn compute_grouped(records: &[AssessmentRecord], field: ScopeField) -> Vec<GroupedStat> {
    let metrics = MetricKey::statistics_metrics();
    partition(records, field)
        .into_par_iter()
        .map(|(key, members)| {
            let stats: BTreeMap<MetricKey, Statistics> = metrics
                .par_iter()
                .filter_map(|metric| {
                    statistics::compute(members.iter().copied(), *metric).map(|s| (*metric, s))
                })
                .collect();
            GroupedStat {
                is_unknown: key.is_none(),
                group_name: key.unwrap_or_else(|| UNKNOWN_GROUP.to_string()),
                count: members.len(),
                metrics: stats,
            }
        })
        .collect()
}
