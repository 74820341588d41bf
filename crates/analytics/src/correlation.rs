use configuration::CorrelationSettings;
use core_types::{AssessmentRecord, MetricKey};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CorrelationStrength {
    Weak,
    Moderate,
    Strong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CorrelationDirection {
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationResult {
    pub benchmark_id: String,
    pub outcome: MetricKey,
    pub competency: MetricKey,
    /// Pearson's r, in [-1, 1].
    pub correlation: f64,
    pub strength: CorrelationStrength,
    pub direction: CorrelationDirection,
    /// Records with values for both metrics.
    pub sample_size: usize,
}

/// Presentation view: the correlations of one outcome, strongest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeCorrelations {
    pub outcome: MetricKey,
    pub correlations: Vec<CorrelationResult>,
}

/// Pearson's r over paired observations.
///
/// `None` when there are fewer than two pairs or either variable is constant.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    let n = pairs.len();
    if n < 2 {
        return None;
    }
    let (x0, y0) = pairs[0];
    if pairs.iter().all(|(x, _)| *x == x0) || pairs.iter().all(|(_, y)| *y == y0) {
        return None;
    }
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n as f64;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    let r = cov / (var_x.sqrt() * var_y.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

pub fn classify(r: f64, settings: &CorrelationSettings) -> CorrelationStrength {
    let magnitude = r.abs();
    if magnitude >= settings.strong_threshold {
        CorrelationStrength::Strong
    } else if magnitude >= settings.moderate_threshold {
        CorrelationStrength::Moderate
    } else {
        CorrelationStrength::Weak
    }
}

/// Pairs of (competency, outcome) values, using only records that have both.
fn joint_values(records: &[AssessmentRecord], a: MetricKey, b: MetricKey) -> Vec<(f64, f64)> {
    records
        .iter()
        .filter_map(|record| Some((record.metric(a)?, record.metric(b)?)))
        .collect()
}

/// Correlates every competency with every outcome. Each pair uses its own
/// subset of records (pairwise deletion); undefined pairs are left out.
pub fn calculate(
    benchmark_id: &str,
    records: &[AssessmentRecord],
    settings: &CorrelationSettings,
) -> Vec<CorrelationResult> {
    let pairs: Vec<(MetricKey, MetricKey)> = MetricKey::OUTCOMES
        .into_iter()
        .flat_map(|outcome| {
            MetricKey::COMPETENCIES
                .into_iter()
                .map(move |competency| (outcome, competency))
        })
        .collect();

    let results: Vec<CorrelationResult> = pairs
        .into_par_iter()
        .filter_map(|(outcome, competency)| {
            let values = joint_values(records, competency, outcome);
            if values.len() < settings.min_observations {
                return None;
            }
            let r = pearson(&values)?;
            Some(CorrelationResult {
                benchmark_id: benchmark_id.to_string(),
                outcome,
                competency,
                correlation: r,
                strength: classify(r, settings),
                direction: if r < 0.0 {
                    CorrelationDirection::Negative
                } else {
                    CorrelationDirection::Positive
                },
                sample_size: values.len(),
            })
        })
        .collect();

    tracing::debug!(benchmark_id, pairs = results.len(), "Correlations calculated.");
    results
}

/// Groups results by outcome (catalogue order), strongest correlation first.
pub fn group_by_outcome(results: &[CorrelationResult]) -> Vec<OutcomeCorrelations> {
    MetricKey::OUTCOMES
        .into_iter()
        .filter_map(|outcome| {
            let mut correlations: Vec<CorrelationResult> = results
                .iter()
                .filter(|r| r.outcome == outcome)
                .cloned()
                .collect();
            if correlations.is_empty() {
                return None;
            }
            correlations.sort_by(|a, b| b.correlation.abs().total_cmp(&a.correlation.abs()));
            Some(OutcomeCorrelations {
                outcome,
                correlations,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn perfect_linear_relationships() {
        let up: Vec<(f64, f64)> = (0..10).map(|i| (i as f64, 2.0 * i as f64 + 1.0)).collect();
        let down: Vec<(f64, f64)> = (0..10).map(|i| (i as f64, -(i as f64))).collect();
        assert!((pearson(&up).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&down).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn undefined_correlations_are_none() {
        assert_eq!(pearson(&[]), None);
        assert_eq!(pearson(&[(1.0, 2.0)]), None);
        assert_eq!(pearson(&[(1.0, 2.0), (1.0, 3.0)]), None);
    }

    #[test]
    fn strength_bands() {
        let settings = CorrelationSettings::default();
        assert_eq!(classify(0.29, &settings), CorrelationStrength::Weak);
        assert_eq!(classify(-0.3, &settings), CorrelationStrength::Moderate);
        assert_eq!(classify(0.49, &settings), CorrelationStrength::Moderate);
        assert_eq!(classify(-0.5, &settings), CorrelationStrength::Strong);
    }

    #[test]
    fn pairwise_deletion_and_omission() {
        let mut records: Vec<AssessmentRecord> = (0..20)
            .map(|i| {
                AssessmentRecord::new(format!("r{i}"), "bm")
                    .with_metric(MetricKey::Wellbeing, i as f64)
                    .with_metric(MetricKey::Empathy, 50.0 - i as f64)
            })
            .collect();
        // Competency without outcome: excluded from the pair, not an error.
        records.push(AssessmentRecord::new("x", "bm").with_metric(MetricKey::Empathy, 1000.0));
        // A single joint observation for another pair.
        records.push(
            AssessmentRecord::new("y", "bm")
                .with_metric(MetricKey::Health, 1.0)
                .with_metric(MetricKey::Optimism, 2.0),
        );

        let results = calculate("bm", &records, &CorrelationSettings::default());
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.outcome, MetricKey::Wellbeing);
        assert_eq!(result.competency, MetricKey::Empathy);
        assert_eq!(result.sample_size, 20);
        assert!((result.correlation + 1.0).abs() < 1e-12);
        assert_eq!(result.strength, CorrelationStrength::Strong);
        assert_eq!(result.direction, CorrelationDirection::Negative);
    }

    #[test]
    fn grouping_is_a_view() {
        let make = |outcome, competency, r: f64| CorrelationResult {
            benchmark_id: "bm".into(),
            outcome,
            competency,
            correlation: r,
            strength: CorrelationStrength::Weak,
            direction: CorrelationDirection::Positive,
            sample_size: 10,
        };
        let results = vec![
            make(MetricKey::Health, MetricKey::Optimism, 0.1),
            make(MetricKey::Effectiveness, MetricKey::Empathy, 0.2),
            make(MetricKey::Effectiveness, MetricKey::NobleGoals, -0.6),
        ];
        let grouped = group_by_outcome(&results);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].outcome, MetricKey::Effectiveness);
        assert_eq!(grouped[0].correlations[0].competency, MetricKey::NobleGoals);
        assert_eq!(grouped[1].outcome, MetricKey::Health);
    }

    proptest! {
        #[test]
        fn r_is_bounded(pairs in prop::collection::vec((-100.0f64..100.0, -100.0f64..100.0), 2..100)) {
            if let Some(r) = pearson(&pairs) {
                prop_assert!((-1.0..=1.0).contains(&r));
            }
        }

        #[test]
        fn self_correlation_is_one(xs in prop::collection::vec(-100.0f64..100.0, 2..100)) {
            let pairs: Vec<(f64, f64)> = xs.iter().map(|x| (*x, *x)).collect();
            if let Some(r) = pearson(&pairs) {
                prop_assert!((r - 1.0).abs() < 1e-9);
            } else {
                prop_assert!(xs.iter().all(|x| *x == xs[0]));
            }
        }
    }
}
