use crate::statistics::{self, Statistics};
use configuration::{DataQualitySettings, QualityWeights};
use core_types::{AssessmentRecord, MetricKey, ScopeField};
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Share of records with a value for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCompleteness {
    pub field: String,
    pub present: usize,
    pub total: usize,
    /// 0..=100; 0 when there are no records.
    pub percentage: f64,
}

/// Records sharing one `sourceId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    pub source_id: String,
    pub count: usize,
    pub records: Vec<AssessmentRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateSummary {
    pub groups: Vec<DuplicateGroup>,
    /// Records belonging to any duplicate group.
    pub duplicate_records: usize,
    /// Copies beyond the first of each group.
    pub redundant_records: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierKind {
    High,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outlier {
    pub record_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub value: f64,
    pub z_score: f64,
    #[serde(rename = "type")]
    pub kind: OutlierKind,
}

/// Outliers of `eqTotal`. Mean, deviation and thresholds are absent when the
/// benchmark has no `eqTotal` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierReport {
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub z_threshold: f64,
    pub threshold_high: Option<f64>,
    pub threshold_low: Option<f64>,
    /// Largest `|zScore|` first.
    pub outliers: Vec<Outlier>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReliabilityBucket {
    pub label: String,
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReliabilityDistribution {
    pub buckets: Vec<ReliabilityBucket>,
    /// Values outside [0, 100].
    pub out_of_range: usize,
    pub stats: Option<Statistics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQualityReport {
    pub benchmark_id: String,
    pub total_records: usize,
    /// Least complete field first.
    pub completeness: Vec<FieldCompleteness>,
    pub average_completeness: f64,
    pub duplicates: DuplicateSummary,
    pub outliers: OutlierReport,
    pub reliability: ReliabilityDistribution,
    pub quality_score: f64,
}

const BUCKET_EDGES: [f64; 6] = [0.0, 20.0, 40.0, 60.0, 80.0, 100.0];

fn percentage(present: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        present as f64 / total as f64 * 100.0
    }
}

fn field_completeness(field: &str, present: usize, total: usize) -> FieldCompleteness {
    FieldCompleteness {
        field: field.to_string(),
        present,
        total,
        percentage: percentage(present, total),
    }
}

/// Completeness of `sourceId`, `sourceDate`, every scope field and every
/// statistics metric, least complete first.
pub fn completeness(records: &[AssessmentRecord]) -> Vec<FieldCompleteness> {
    let total = records.len();
    let mut fields = vec![
        field_completeness(
            "sourceId",
            records.iter().filter(|r| has_source_id(r)).count(),
            total,
        ),
        field_completeness(
            "sourceDate",
            records.iter().filter(|r| r.source_date.is_some()).count(),
            total,
        ),
    ];

    fields.extend(ScopeField::ALL.into_iter().map(|field| {
        let present = records.iter().filter(|r| r.attribute(field).is_some()).count();
        field_completeness(field.as_str(), present, total)
    }));

    let metrics: Vec<FieldCompleteness> = MetricKey::statistics_metrics()
        .into_par_iter()
        .map(|key| {
            let present = records.iter().filter(|r| r.metric(key).is_some()).count();
            field_completeness(key.as_str(), present, total)
        })
        .collect();
    fields.extend(metrics);

    fields.sort_by(|a, b| {
        a.percentage
            .total_cmp(&b.percentage)
            .then_with(|| a.field.cmp(&b.field))
    });
    fields
}

fn source_id(record: &AssessmentRecord) -> Option<&str> {
    record
        .source_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
}

fn has_source_id(record: &AssessmentRecord) -> bool {
    source_id(record).is_some()
}

/// Groups records by `sourceId`. Records without one are never grouped.
/// Largest groups first, ties by id.
pub fn find_duplicates(records: &[AssessmentRecord]) -> DuplicateSummary {
    let mut groups: Vec<DuplicateGroup> = records
        .iter()
        .filter_map(|record| source_id(record).map(|id| (id, record)))
        .into_group_map()
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(id, members)| DuplicateGroup {
            source_id: id.to_string(),
            count: members.len(),
            records: members.into_iter().cloned().collect(),
        })
        .collect();
    groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.source_id.cmp(&b.source_id)));

    let duplicate_records = groups.iter().map(|g| g.count).sum();
    let redundant_records = groups.iter().map(|g| g.count - 1).sum();
    DuplicateSummary {
        groups,
        duplicate_records,
        redundant_records,
    }
}

/// Flags records whose `eqTotal` lies at least `z_threshold` population
/// standard deviations from the mean. Nothing is flagged when the deviation
/// is zero.
pub fn detect_outliers(records: &[AssessmentRecord], z_threshold: f64) -> OutlierReport {
    let values = statistics::metric_values(records, MetricKey::EqTotal);
    let Some(Statistics { mean, std_dev, .. }) = statistics::from_values(values) else {
        return OutlierReport {
            mean: None,
            std_dev: None,
            z_threshold,
            threshold_high: None,
            threshold_low: None,
            outliers: Vec::new(),
            total: 0,
        };
    };

    let mut outliers: Vec<Outlier> = if std_dev > 0.0 {
        records
            .iter()
            .filter_map(|record| {
                let value = record.metric(MetricKey::EqTotal)?;
                let z_score = (value - mean) / std_dev;
                (z_score.abs() >= z_threshold).then(|| Outlier {
                    record_id: record.id.clone(),
                    source_id: record.source_id.clone(),
                    value,
                    z_score,
                    kind: if z_score > 0.0 {
                        OutlierKind::High
                    } else {
                        OutlierKind::Low
                    },
                })
            })
            .collect()
    } else {
        Vec::new()
    };
    outliers.sort_by(|a, b| {
        b.z_score
            .abs()
            .total_cmp(&a.z_score.abs())
            .then_with(|| a.record_id.cmp(&b.record_id))
    });

    OutlierReport {
        mean: Some(mean),
        std_dev: Some(std_dev),
        z_threshold,
        threshold_high: Some(mean + z_threshold * std_dev),
        threshold_low: Some(mean - z_threshold * std_dev),
        total: outliers.len(),
        outliers,
    }
}

/// Histogram of `reliabilityIndex` over `[0,20) [20,40) [40,60) [60,80) [80,100]`.
pub fn reliability_distribution(records: &[AssessmentRecord]) -> ReliabilityDistribution {
    let values = statistics::metric_values(records, MetricKey::ReliabilityIndex);
    let last = BUCKET_EDGES.len() - 2;

    let mut buckets: Vec<ReliabilityBucket> = BUCKET_EDGES
        .iter()
        .tuple_windows()
        .enumerate()
        .map(|(i, (lower, upper))| ReliabilityBucket {
            label: if i == last {
                format!("[{lower},{upper}]")
            } else {
                format!("[{lower},{upper})")
            },
            lower: *lower,
            upper: *upper,
            count: 0,
        })
        .collect();

    let mut out_of_range = 0;
    for value in &values {
        // Half-open buckets, except the last which also takes 100.
        let slot = buckets.iter().enumerate().position(|(i, b)| {
            *value >= b.lower && (*value < b.upper || (i == last && *value == b.upper))
        });
        match slot {
            Some(i) => buckets[i].count += 1,
            None => out_of_range += 1,
        }
    }

    ReliabilityDistribution {
        buckets,
        out_of_range,
        stats: statistics::from_values(values),
    }
}

/// Weighted 0-100 composite of completeness, the share of non-redundant
/// records and the average reliability. The reliability term is dropped when
/// no record has a reliability value.
pub fn quality_score(
    total_records: usize,
    average_completeness: f64,
    redundant_records: usize,
    average_reliability: Option<f64>,
    weights: &QualityWeights,
) -> f64 {
    if total_records == 0 {
        return 0.0;
    }
    let uniqueness = (1.0 - redundant_records as f64 / total_records as f64) * 100.0;

    let mut weighted = weights.completeness * average_completeness + weights.duplicates * uniqueness;
    let mut weight_sum = weights.completeness + weights.duplicates;
    if let Some(reliability) = average_reliability {
        weighted += weights.reliability * reliability.clamp(0.0, 100.0);
        weight_sum += weights.reliability;
    }
    if weight_sum <= 0.0 {
        return 0.0;
    }
    (weighted / weight_sum).clamp(0.0, 100.0)
}

/// Runs the four data-quality analyses over one benchmark's records.
pub fn analyze(
    benchmark_id: &str,
    records: &[AssessmentRecord],
    settings: &DataQualitySettings,
) -> DataQualityReport {
    let ((completeness, duplicates), (outliers, reliability)) = rayon::join(
        || rayon::join(|| completeness(records), || find_duplicates(records)),
        || {
            rayon::join(
                || detect_outliers(records, settings.outlier_z_threshold),
                || reliability_distribution(records),
            )
        },
    );

    let percentages: Vec<f64> = completeness.iter().map(|f| f.percentage).collect();
    let average_completeness = if records.is_empty() {
        0.0
    } else {
        statistics::mean(&percentages).unwrap_or(0.0)
    };
    let quality_score = quality_score(
        records.len(),
        average_completeness,
        duplicates.redundant_records,
        reliability.stats.as_ref().map(|s| s.mean),
        &settings.weights,
    );

    tracing::debug!(
        benchmark_id,
        records = records.len(),
        duplicate_groups = duplicates.groups.len(),
        outliers = outliers.total,
        quality_score,
        "Data quality analyzed."
    );

    DataQualityReport {
        benchmark_id: benchmark_id.to_string(),
        total_records: records.len(),
        completeness,
        average_completeness,
        duplicates,
        outliers,
        reliability,
        quality_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn eq_record(id: usize, eq: f64) -> AssessmentRecord {
        AssessmentRecord::new(format!("r{id}"), "bm").with_metric(MetricKey::EqTotal, eq)
    }

    #[test]
    fn scenario_c_one_group_of_three() {
        let mut records: Vec<AssessmentRecord> = (0..10)
            .map(|i| AssessmentRecord::new(format!("r{i}"), "bm").with_source_id(format!("TP-{i:04}")))
            .collect();
        for i in [3, 6, 9] {
            records[i].source_id = Some("TP-0042".to_string());
        }
        records.push(AssessmentRecord::new("no-source", "bm"));
        records.push(AssessmentRecord::new("blank", "bm").with_source_id("  "));

        let summary = find_duplicates(&records);
        assert_eq!(summary.groups.len(), 1);
        let group = &summary.groups[0];
        assert_eq!(group.source_id, "TP-0042");
        assert_eq!(group.count, 3);
        let ids: Vec<&str> = group.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r3", "r6", "r9"]);
        assert_eq!(summary.duplicate_records, 3);
        assert_eq!(summary.redundant_records, 2);
    }

    #[test]
    fn scenario_d_uniform_reliability_fills_buckets_evenly() {
        let records: Vec<AssessmentRecord> = (0..1000)
            .map(|i| {
                AssessmentRecord::new(format!("r{i}"), "bm")
                    .with_metric(MetricKey::ReliabilityIndex, i as f64 / 10.0)
            })
            .collect();
        let distribution = reliability_distribution(&records);
        let counts: Vec<usize> = distribution.buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![200; 5]);
        assert_eq!(distribution.out_of_range, 0);
        let labels: Vec<&str> = distribution.buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["[0,20)", "[20,40)", "[40,60)", "[60,80)", "[80,100]"]);
    }

    #[test]
    fn reliability_upper_edge_and_out_of_range() {
        let records: Vec<AssessmentRecord> = [100.0, 80.0, 79.99, -1.0, 100.5, 19.5]
            .iter()
            .enumerate()
            .map(|(i, v)| AssessmentRecord::new(format!("r{i}"), "bm").with_metric(MetricKey::ReliabilityIndex, *v))
            .collect();
        let distribution = reliability_distribution(&records);
        assert_eq!(distribution.buckets[4].count, 2);
        assert_eq!(distribution.buckets[3].count, 1);
        assert_eq!(distribution.buckets[0].label, "[0,20)");
        assert_eq!(distribution.buckets[0].count, 1);
        assert_eq!(distribution.out_of_range, 2);
        assert_eq!(distribution.stats.unwrap().n, 6);
    }

    #[test]
    fn outliers_are_flagged_by_z_score() {
        let mut records: Vec<AssessmentRecord> = (0..20).map(|i| eq_record(i, 100.0)).collect();
        records.push(eq_record(20, 160.0));
        records.push(eq_record(21, 40.0));

        let report = detect_outliers(&records, 2.0);
        assert_eq!(report.total, 2);
        assert_eq!(report.mean, Some(100.0));
        let kinds: Vec<OutlierKind> = report.outliers.iter().map(|o| o.kind).collect();
        assert!(kinds.contains(&OutlierKind::High) && kinds.contains(&OutlierKind::Low));
        assert!(report.threshold_high.unwrap() > 100.0);
        assert!(report.threshold_low.unwrap() < 100.0);
    }

    #[test]
    fn constant_values_have_no_outliers() {
        let records: Vec<AssessmentRecord> = (0..5).map(|i| eq_record(i, 90.0)).collect();
        let report = detect_outliers(&records, 2.0);
        assert_eq!(report.std_dev, Some(0.0));
        assert!(report.outliers.is_empty());
    }

    #[test]
    fn completeness_is_sorted_least_complete_first() {
        let mut full = AssessmentRecord::new("a", "bm").with_source_id("S-1");
        for key in MetricKey::statistics_metrics() {
            *full.metric_mut(key) = Some(1.0);
        }
        let partial = AssessmentRecord::new("b", "bm")
            .with_source_id("S-2")
            .with_metric(MetricKey::EqTotal, 1.0);

        let fields = completeness(&[full, partial]);
        assert_eq!(fields.len(), 2 + ScopeField::ALL.len() + MetricKey::statistics_metrics().len());
        assert_eq!(fields[0].percentage, 0.0);
        assert_eq!(fields[0].field, "ageRange");

        let by_name = |name: &str| fields.iter().find(|f| f.field == name).unwrap().percentage;
        assert_eq!(by_name("sourceId"), 100.0);
        assert_eq!(by_name("eqTotal"), 100.0);
        assert_eq!(by_name("health"), 50.0);
        assert!(fields.windows(2).all(|w| w[0].percentage <= w[1].percentage));
    }

    #[test]
    fn empty_benchmark_yields_an_empty_report() {
        let report = analyze("bm", &[], &DataQualitySettings::default());
        assert_eq!(report.total_records, 0);
        assert!(report.completeness.iter().all(|f| f.percentage == 0.0 && f.total == 0));
        assert_eq!(report.average_completeness, 0.0);
        assert!(report.duplicates.groups.is_empty());
        assert_eq!(report.outliers.total, 0);
        assert!(report.reliability.stats.is_none());
        assert_eq!(report.quality_score, 0.0);
    }

    #[test]
    fn quality_score_weighs_its_terms() {
        let weights = QualityWeights {
            completeness: 0.4,
            duplicates: 0.3,
            reliability: 0.3,
        };
        assert!((quality_score(10, 100.0, 0, Some(100.0), &weights) - 100.0).abs() < 1e-9);
        // 0.4*50 + 0.3*80 + 0.3*70 = 65
        assert!((quality_score(10, 50.0, 2, Some(70.0), &weights) - 65.0).abs() < 1e-9);
        // Without reliability: (0.4*50 + 0.3*80) / 0.7
        let expected = (0.4 * 50.0 + 0.3 * 80.0) / 0.7;
        assert!((quality_score(10, 50.0, 2, None, &weights) - expected).abs() < 1e-9);
        assert_eq!(quality_score(0, 100.0, 0, Some(100.0), &weights), 0.0);
    }

    #[test]
    fn report_serializes_outlier_kind_as_type() {
        let mut records: Vec<AssessmentRecord> = (0..20).map(|i| eq_record(i, 100.0)).collect();
        records.push(eq_record(20, 200.0));
        let report = analyze("bm", &records, &DataQualitySettings::default());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outliers"]["outliers"][0]["type"], "high");
        assert_eq!(json["benchmarkId"], "bm");
        assert!(report.quality_score > 0.0 && report.quality_score <= 100.0);
    }

    proptest! {
        #[test]
        fn lowering_the_threshold_never_flags_fewer(
            values in prop::collection::vec(0.0f64..200.0, 1..200),
            high in 0.5f64..4.0,
            delta in 0.0f64..2.0,
        ) {
            let records: Vec<AssessmentRecord> =
                values.iter().enumerate().map(|(i, v)| eq_record(i, *v)).collect();
            let strict = detect_outliers(&records, high).total;
            let loose = detect_outliers(&records, (high - delta).max(0.1)).total;
            prop_assert!(loose >= strict);
        }

        #[test]
        fn duplicate_groups_partition_records_with_source_ids(
            ids in prop::collection::vec(prop::option::of(0u8..10), 0..100),
        ) {
            let records: Vec<AssessmentRecord> = ids
                .iter()
                .enumerate()
                .map(|(i, id)| {
                    let record = AssessmentRecord::new(format!("r{i}"), "bm");
                    match id {
                        Some(id) => record.with_source_id(format!("S-{id}")),
                        None => record,
                    }
                })
                .collect();
            let summary = find_duplicates(&records);

            let mut seen = std::collections::HashSet::new();
            for group in &summary.groups {
                prop_assert!(group.count > 1);
                prop_assert_eq!(group.count, group.records.len());
                for record in &group.records {
                    prop_assert_eq!(record.source_id.as_deref(), Some(group.source_id.as_str()));
                    prop_assert!(seen.insert(record.id.clone()));
                }
            }
            let expected = ids
                .iter()
                .flatten()
                .counts()
                .into_values()
                .filter(|c| *c > 1)
                .sum::<usize>();
            prop_assert_eq!(summary.duplicate_records, expected);
        }
    }
}
