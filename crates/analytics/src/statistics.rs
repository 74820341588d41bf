use core_types::{AssessmentRecord, MetricKey};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Descriptive statistics of one metric over a record set.
///
/// A metric with no values has no `Statistics`; callers carry that as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub n: usize,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
}

/// One entry of the overall statistics of a benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStat {
    pub metric: MetricKey,
    pub stats: Option<Statistics>,
}

/// The non-missing values of `key` across `records`.
pub fn metric_values<'a, I>(records: I, key: MetricKey) -> Vec<f64>
where
    I: IntoIterator<Item = &'a AssessmentRecord>,
{
    records.into_iter().filter_map(|r| r.metric(key)).collect()
}

/// Statistics of `key` over `records`, or `None` when no record has a value.
pub fn compute<'a, I>(records: I, key: MetricKey) -> Option<Statistics>
where
    I: IntoIterator<Item = &'a AssessmentRecord>,
{
    from_values(metric_values(records, key))
}

/// Statistics of a raw sample. Non-finite values are ignored.
pub fn from_values(mut values: Vec<f64>) -> Option<Statistics> {
    values.retain(|v| v.is_finite());
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let n = values.len();
    let min = values[0];
    let max = values[n - 1];

    // A constant sample has exactly zero spread, whatever rounding the sum picks up.
    let (mean, std_dev) = if min == max {
        (min, 0.0)
    } else {
        let mean = (values.iter().sum::<f64>() / n as f64).clamp(min, max);
        (mean, population_variance(&values, mean).sqrt())
    };

    let median = percentile_sorted(&values, 0.5);

    Some(Statistics {
        n,
        mean,
        median,
        std_dev,
        min,
        max,
        p10: percentile_sorted(&values, 0.10),
        p25: percentile_sorted(&values, 0.25),
        p50: median,
        p75: percentile_sorted(&values, 0.75),
        p90: percentile_sorted(&values, 0.90),
        p95: percentile_sorted(&values, 0.95),
    })
}

/// Percentile by linear interpolation between order statistics (R-7):
/// rank = p·(n−1), interpolated between the floor and ceiling ranks.
///
/// `sorted` must be non-empty and ascending; `p` is clamped to [0, 1].
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let p = p.clamp(0.0, 1.0);
    let rank = p * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    let (low, high) = (sorted[lower], sorted[upper]);
    (low + (high - low) * fraction).clamp(low, high)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn population_variance(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

/// Bessel-corrected variance; `None` below two observations.
pub fn sample_variance(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    Some(values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64)
}

/// Statistics for every metric of the catalogue, one task per metric.
pub fn overall(records: &[AssessmentRecord]) -> Vec<OverallStat> {
    MetricKey::statistics_metrics()
        .into_par_iter()
        .map(|metric| OverallStat {
            metric,
            stats: compute(records, metric),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn records_with_eq(values: &[f64]) -> Vec<AssessmentRecord> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| AssessmentRecord::new(format!("r{i}"), "bm").with_metric(MetricKey::EqTotal, *v))
            .collect()
    }

    #[test]
    fn scenario_a_five_eq_totals() {
        let records = records_with_eq(&[90.0, 95.0, 100.0, 105.0, 110.0]);
        let stats = compute(&records, MetricKey::EqTotal).unwrap();
        assert_eq!(stats.n, 5);
        assert_eq!(stats.mean, 100.0);
        assert_eq!(stats.median, 100.0);
        assert!((stats.std_dev - 7.0710678).abs() < 1e-6);
        assert_eq!(stats.min, 90.0);
        assert_eq!(stats.max, 110.0);
    }

    #[test]
    fn percentiles_interpolate_linearly() {
        let stats = from_values(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        // rank = 0.25 * 3 = 0.75 -> 1 + 0.75
        assert!((stats.p25 - 1.75).abs() < 1e-12);
        assert!((stats.p50 - 2.5).abs() < 1e-12);
        // rank = 0.9 * 3 = 2.7 -> 3 + 0.7
        assert!((stats.p90 - 3.7).abs() < 1e-12);
        assert!((stats.p95 - 3.85).abs() < 1e-12);
        assert_eq!(stats.p50, stats.median);
    }

    #[test]
    fn missing_values_are_excluded_and_empty_is_no_data() {
        let mut records = records_with_eq(&[10.0, 20.0]);
        records.push(AssessmentRecord::new("blank", "bm"));
        let stats = compute(&records, MetricKey::EqTotal).unwrap();
        assert_eq!(stats.n, 2);
        assert_eq!(stats.mean, 15.0);

        assert_eq!(compute(&records, MetricKey::Health), None);
        assert_eq!(compute(&Vec::<AssessmentRecord>::new(), MetricKey::EqTotal), None);
    }

    #[test]
    fn single_value_has_zero_spread() {
        let stats = from_values(vec![42.0]).unwrap();
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.p10, 42.0);
        assert_eq!(stats.p95, 42.0);
    }

    #[test]
    fn overall_covers_every_metric() {
        let records = records_with_eq(&[1.0, 2.0]);
        let overall = overall(&records);
        assert_eq!(overall.len(), MetricKey::statistics_metrics().len());
        assert_eq!(overall[0].metric, MetricKey::EqTotal);
        assert!(overall[0].stats.is_some());
        assert!(overall.iter().skip(1).all(|s| s.stats.is_none()));
    }

    #[test]
    fn sample_variance_needs_two_points() {
        assert_eq!(sample_variance(&[1.0], 1.0), None);
        assert_eq!(sample_variance(&[1.0, 3.0], 2.0), Some(2.0));
    }

    proptest! {
        #[test]
        fn ordering_invariants_hold(values in prop::collection::vec(-1000.0f64..1000.0, 1..200)) {
            let stats = from_values(values.clone()).unwrap();
            prop_assert!(stats.min <= stats.mean && stats.mean <= stats.max);
            prop_assert!(stats.min <= stats.median && stats.median <= stats.max);
            prop_assert!(stats.p10 <= stats.p25);
            prop_assert!(stats.p25 <= stats.p50);
            prop_assert!(stats.p50 <= stats.p75);
            prop_assert!(stats.p75 <= stats.p90);
            prop_assert!(stats.p90 <= stats.p95);
            prop_assert_eq!(stats.p50, stats.median);
            prop_assert!(stats.std_dev >= 0.0);
        }

        #[test]
        fn zero_spread_iff_identical(values in prop::collection::vec(-1000.0f64..1000.0, 1..50)) {
            let stats = from_values(values.clone()).unwrap();
            let identical = values.iter().all(|v| *v == values[0]);
            prop_assert_eq!(stats.std_dev == 0.0, identical);
        }

        #[test]
        fn constant_samples_have_zero_spread(value in -1000.0f64..1000.0, n in 1usize..100) {
            let stats = from_values(vec![value; n]).unwrap();
            prop_assert_eq!(stats.std_dev, 0.0);
            prop_assert_eq!(stats.mean, value);
        }

        #[test]
        fn record_order_is_irrelevant(mut values in prop::collection::vec(0.0f64..200.0, 1..100)) {
            let forward = from_values(values.clone()).unwrap();
            values.reverse();
            let backward = from_values(values).unwrap();
            prop_assert_eq!(forward.median, backward.median);
            prop_assert_eq!(forward.p90, backward.p90);
            prop_assert!((forward.mean - backward.mean).abs() < 1e-9);
        }
    }
}
