use crate::error::AnalyticsError;
use crate::statistics::{self, Statistics};
use configuration::ComparisonSettings;
use core_types::{AssessmentRecord, MetricKey};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// One column of a comparison: a whole benchmark or a segment of one.
#[derive(Debug, Clone)]
pub struct ComparisonInput {
    pub id: String,
    pub label: String,
    pub records: Vec<AssessmentRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonColumn {
    pub id: String,
    pub label: String,
    pub sample_size: usize,
}

/// Difference of one column against the base column for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDifference {
    pub column: String,
    pub mean_diff: f64,
    /// Omitted when the base mean is zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_diff_percent: Option<f64>,
    pub median_diff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricComparison {
    pub metric: MetricKey,
    /// Column id to statistics. Columns without data for the metric are absent.
    pub values: BTreeMap<String, Statistics>,
    /// One entry per column with data, the base included, in column order.
    pub differences: Vec<ColumnDifference>,
}

impl MetricComparison {
    /// The defined percentage differences of every column except `base`.
    pub fn non_base_percentages<'a>(&'a self, base: &'a str) -> impl Iterator<Item = f64> + 'a {
        self.differences
            .iter()
            .filter(move |d| d.column != base)
            .filter_map(|d| d.mean_diff_percent)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignificantDifference {
    pub metric: MetricKey,
    pub average_abs_diff_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub columns: Vec<ComparisonColumn>,
    /// Id of the first column; every difference is relative to it.
    pub base_column: String,
    pub metrics: Vec<MetricComparison>,
    pub significant_differences: Vec<SignificantDifference>,
}

fn validate(columns: &[ComparisonInput], settings: &ComparisonSettings) -> Result<(), AnalyticsError> {
    if columns.len() < settings.min_columns || columns.len() > settings.max_columns {
        return Err(AnalyticsError::InvalidColumnCount {
            min: settings.min_columns,
            max: settings.max_columns,
            actual: columns.len(),
        });
    }
    let mut seen = HashSet::new();
    for column in columns {
        if !seen.insert(column.id.as_str()) {
            return Err(AnalyticsError::DuplicateColumn(column.id.clone()));
        }
        if column.records.is_empty() {
            return Err(AnalyticsError::EmptyColumn(column.label.clone()));
        }
    }
    Ok(())
}

fn difference(column: &str, value: &Statistics, base: &Statistics) -> ColumnDifference {
    let mean_diff = value.mean - base.mean;
    ColumnDifference {
        column: column.to_string(),
        mean_diff,
        mean_diff_percent: (base.mean != 0.0).then(|| mean_diff / base.mean * 100.0),
        median_diff: value.median - base.median,
    }
}

fn compare_metric(columns: &[ComparisonInput], metric: MetricKey) -> Option<MetricComparison> {
    let per_column: Vec<(&str, Option<Statistics>)> = columns
        .par_iter()
        .map(|column| (column.id.as_str(), statistics::compute(&column.records, metric)))
        .collect();

    if per_column.iter().all(|(_, stats)| stats.is_none()) {
        return None;
    }

    let base = per_column[0].1.as_ref();
    let differences = match base {
        Some(base) => per_column
            .iter()
            .filter_map(|(id, stats)| stats.as_ref().map(|s| difference(id, s, base)))
            .collect(),
        None => Vec::new(),
    };

    let values = per_column
        .into_iter()
        .filter_map(|(id, stats)| stats.map(|s| (id.to_string(), s)))
        .collect();

    Some(MetricComparison {
        metric,
        values,
        differences,
    })
}

/// Compares 2..N columns metric by metric against the first column.
///
/// A metric is significant when the average absolute percentage difference of
/// the non-base columns exceeds the configured threshold.
pub fn compare(
    columns: &[ComparisonInput],
    settings: &ComparisonSettings,
) -> Result<ComparisonResult, AnalyticsError> {
    validate(columns, settings)?;
    let base_column = columns[0].id.clone();

    let metrics: Vec<MetricComparison> = MetricKey::comparison_metrics()
        .into_par_iter()
        .filter_map(|metric| compare_metric(columns, metric))
        .collect();

    let mut significant_differences: Vec<SignificantDifference> = metrics
        .iter()
        .filter_map(|comparison| {
            let percentages: Vec<f64> = comparison
                .non_base_percentages(&base_column)
                .map(f64::abs)
                .collect();
            let average = statistics::mean(&percentages)?;
            (average > settings.significance_threshold_pct).then_some(SignificantDifference {
                metric: comparison.metric,
                average_abs_diff_percent: average,
            })
        })
        .collect();
    significant_differences.sort_by(|a, b| {
        b.average_abs_diff_percent
            .total_cmp(&a.average_abs_diff_percent)
            .then_with(|| a.metric.cmp(&b.metric))
    });

    tracing::debug!(
        columns = columns.len(),
        metrics = metrics.len(),
        significant = significant_differences.len(),
        "Comparison computed."
    );

    Ok(ComparisonResult {
        columns: columns
            .iter()
            .map(|c| ComparisonColumn {
                id: c.id.clone(),
                label: c.label.clone(),
                sample_size: c.records.len(),
            })
            .collect(),
        base_column,
        metrics,
        significant_differences,
    })
}
