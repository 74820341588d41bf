use crate::error::AnalyticsError;
use crate::statistics::{self, Statistics};
use configuration::TopPerformerSettings;
use core_types::{AssessmentRecord, MetricCategory, MetricKey};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

/// How strongly one competency or talent separates the top cohort from the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionEffect {
    pub key: MetricKey,
    pub top_mean: f64,
    pub rest_mean: f64,
    /// Cohen's d of the top cohort against the rest.
    pub effect_size: f64,
    pub is_significant: bool,
}

/// Outcome statistics for the whole population and for both cohorts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortStatistics {
    pub population: Statistics,
    pub top: Statistics,
    pub rest: Option<Statistics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPerformerResult {
    pub benchmark_id: String,
    pub outcome: MetricKey,
    /// Outcome value at the cohort percentile; records at or above it are top performers.
    pub threshold_value: f64,
    /// Size of the top cohort.
    pub sample_size: usize,
    pub total_population: usize,
    pub confidence_level: ConfidenceLevel,
    /// The first `top_n` of `dimensions`, competencies and talents ranked together.
    pub top_competencies: Vec<DimensionEffect>,
    /// The strongest `top_n` talents alone.
    pub top_talents: Vec<DimensionEffect>,
    /// Every dimension with a defined effect, by descending |effect size|.
    pub dimensions: Vec<DimensionEffect>,
    pub statistics: CohortStatistics,
}

/// Marker for an outcome that has no values in the benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyTopPerformers {
    pub benchmark_id: String,
    pub outcome: MetricKey,
}

/// Result of a top-performer extraction. `Empty` means "computed, no signal",
/// which callers must not confuse with a result that was never generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum TopPerformerOutcome {
    Computed(TopPerformerResult),
    Empty(EmptyTopPerformers),
}

impl TopPerformerOutcome {
    pub fn outcome(&self) -> MetricKey {
        match self {
            TopPerformerOutcome::Computed(result) => result.outcome,
            TopPerformerOutcome::Empty(empty) => empty.outcome,
        }
    }

    pub fn as_computed(&self) -> Option<&TopPerformerResult> {
        match self {
            TopPerformerOutcome::Computed(result) => Some(result),
            TopPerformerOutcome::Empty(_) => None,
        }
    }
}

/// Selects the top cohort of `outcome` and ranks every competency and talent by
/// its effect size between the top cohort and the rest of the population.
pub fn extract(
    benchmark_id: &str,
    records: &[AssessmentRecord],
    outcome: MetricKey,
    settings: &TopPerformerSettings,
) -> Result<TopPerformerOutcome, AnalyticsError> {
    if !outcome.is_outcome() {
        return Err(AnalyticsError::InvalidMetric(outcome));
    }

    let population: Vec<(&AssessmentRecord, f64)> = records
        .iter()
        .filter_map(|record| record.metric(outcome).map(|value| (record, value)))
        .collect();

    let outcome_values: Vec<f64> = population.iter().map(|(_, value)| *value).collect();
    let Some(population_stats) = statistics::from_values(outcome_values.clone()) else {
        tracing::debug!(benchmark_id, outcome = %outcome, "No outcome values; returning empty marker.");
        return Ok(TopPerformerOutcome::Empty(EmptyTopPerformers {
            benchmark_id: benchmark_id.to_string(),
            outcome,
        }));
    };

    let mut sorted = outcome_values;
    sorted.sort_by(f64::total_cmp);
    let threshold = statistics::percentile_sorted(&sorted, settings.percentile);

    let (top, rest): (Vec<_>, Vec<_>) = population
        .into_iter()
        .partition(|(_, value)| *value >= threshold);
    let top: Vec<&AssessmentRecord> = top.into_iter().map(|(record, _)| record).collect();
    let rest: Vec<&AssessmentRecord> = rest.into_iter().map(|(record, _)| record).collect();

    let sample_size = top.len();
    let enough_sample = sample_size >= settings.min_sample_size;

    let mut dimensions: Vec<DimensionEffect> = MetricKey::COMPETENCIES
        .par_iter()
        .chain(MetricKey::TALENTS.par_iter())
        .filter_map(|key| {
            let top_values = statistics::metric_values(top.iter().copied(), *key);
            let rest_values = statistics::metric_values(rest.iter().copied(), *key);
            let (top_mean, rest_mean, effect_size) = cohens_d(&top_values, &rest_values)?;
            Some(DimensionEffect {
                key: *key,
                top_mean,
                rest_mean,
                effect_size,
                is_significant: enough_sample && effect_size.abs() >= settings.min_effect_size,
            })
        })
        .collect();

    dimensions.sort_by(|a, b| {
        b.effect_size
            .abs()
            .total_cmp(&a.effect_size.abs())
            .then_with(|| a.key.cmp(&b.key))
    });

    let top_competencies: Vec<DimensionEffect> =
        dimensions.iter().take(settings.top_n).cloned().collect();
    let top_talents: Vec<DimensionEffect> = dimensions
        .iter()
        .filter(|d| d.key.category() == MetricCategory::Talent)
        .take(settings.top_n)
        .cloned()
        .collect();

    let cohort_stats = CohortStatistics {
        population: population_stats.clone(),
        top: statistics::compute(top.iter().copied(), outcome).unwrap_or(population_stats),
        rest: statistics::compute(rest.iter().copied(), outcome),
    };

    tracing::debug!(
        benchmark_id,
        outcome = %outcome,
        threshold,
        sample_size,
        dimensions = dimensions.len(),
        "Top performers extracted."
    );

    Ok(TopPerformerOutcome::Computed(TopPerformerResult {
        benchmark_id: benchmark_id.to_string(),
        outcome,
        threshold_value: threshold,
        sample_size,
        total_population: sorted.len(),
        confidence_level: confidence_level(sample_size, settings),
        top_competencies,
        top_talents,
        dimensions,
        statistics: cohort_stats,
    }))
}

pub fn confidence_level(sample_size: usize, settings: &TopPerformerSettings) -> ConfidenceLevel {
    if sample_size >= settings.high_confidence_sample_size {
        ConfidenceLevel::High
    } else if sample_size >= settings.min_sample_size {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}

/// Cohen's d with the pooled (Bessel-corrected) standard deviation as
/// denominator. Returns `(mean_a, mean_b, d)`, or `None` when either group is
/// empty, there are fewer than three observations, or the pooled deviation is zero.
pub fn cohens_d(group_a: &[f64], group_b: &[f64]) -> Option<(f64, f64, f64)> {
    let (n_a, n_b) = (group_a.len(), group_b.len());
    if n_a == 0 || n_b == 0 || n_a + n_b < 3 {
        return None;
    }
    let mean_a = statistics::mean(group_a)?;
    let mean_b = statistics::mean(group_b)?;
    let var_a = statistics::sample_variance(group_a, mean_a).unwrap_or(0.0);
    let var_b = statistics::sample_variance(group_b, mean_b).unwrap_or(0.0);

    let pooled_var =
        ((n_a - 1) as f64 * var_a + (n_b - 1) as f64 * var_b) / (n_a + n_b - 2) as f64;
    let pooled_sd = pooled_var.sqrt();
    if !pooled_sd.is_finite() || pooled_sd <= 0.0 {
        return None;
    }
    Some((mean_a, mean_b, (mean_a - mean_b) / pooled_sd))
}
