use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString, IntoStaticStr};

/// Every numeric measure carried by an SEI assessment record.
///
/// The string form (used on the wire, in the CLI and in CSV exports) is stable:
/// `eqTotal`, the pillar letters `K`/`C`/`G`, the competency codes (`EL`, `RP`, ...),
/// camelCase outcome and talent names, and `reliabilityIndex`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum MetricKey {
    EqTotal,

    // Pillars
    #[serde(rename = "K")]
    #[strum(serialize = "K")]
    KnowYourself,
    #[serde(rename = "C")]
    #[strum(serialize = "C")]
    ChooseYourself,
    #[serde(rename = "G")]
    #[strum(serialize = "G")]
    GiveYourself,

    // Competencies
    #[serde(rename = "EL")]
    #[strum(serialize = "EL")]
    EmotionalLiteracy,
    #[serde(rename = "RP")]
    #[strum(serialize = "RP")]
    RecognizePatterns,
    #[serde(rename = "ACT")]
    #[strum(serialize = "ACT")]
    ConsequentialThinking,
    #[serde(rename = "NE")]
    #[strum(serialize = "NE")]
    NavigateEmotions,
    #[serde(rename = "IM")]
    #[strum(serialize = "IM")]
    IntrinsicMotivation,
    #[serde(rename = "OP")]
    #[strum(serialize = "OP")]
    Optimism,
    #[serde(rename = "EMP")]
    #[strum(serialize = "EMP")]
    Empathy,
    #[serde(rename = "NG")]
    #[strum(serialize = "NG")]
    NobleGoals,

    // Outcomes
    Effectiveness,
    Relationships,
    Wellbeing,
    QualityOfLife,
    Influence,
    DecisionMaking,
    Community,
    Network,
    Achievement,
    Satisfaction,
    Balance,
    Health,

    // Brain talents
    DataMining,
    Modeling,
    Prioritizing,
    Connection,
    EmotionalInsight,
    Collaboration,
    Reflecting,
    Adaptability,
    CriticalThinking,
    Resilience,
    RiskTolerance,
    Imagination,
    Proactivity,
    Commitment,
    ProblemSolving,
    Vision,
    Design,
    Entrepreneurship,

    ReliabilityIndex,
}

/// The family a metric belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricCategory {
    Total,
    Pillar,
    Competency,
    Outcome,
    Talent,
    Reliability,
}

impl MetricKey {
    pub const PILLARS: [MetricKey; 3] = [
        MetricKey::KnowYourself,
        MetricKey::ChooseYourself,
        MetricKey::GiveYourself,
    ];

    pub const COMPETENCIES: [MetricKey; 8] = [
        MetricKey::EmotionalLiteracy,
        MetricKey::RecognizePatterns,
        MetricKey::ConsequentialThinking,
        MetricKey::NavigateEmotions,
        MetricKey::IntrinsicMotivation,
        MetricKey::Optimism,
        MetricKey::Empathy,
        MetricKey::NobleGoals,
    ];

    pub const OUTCOMES: [MetricKey; 12] = [
        MetricKey::Effectiveness,
        MetricKey::Relationships,
        MetricKey::Wellbeing,
        MetricKey::QualityOfLife,
        MetricKey::Influence,
        MetricKey::DecisionMaking,
        MetricKey::Community,
        MetricKey::Network,
        MetricKey::Achievement,
        MetricKey::Satisfaction,
        MetricKey::Balance,
        MetricKey::Health,
    ];

    pub const TALENTS: [MetricKey; 18] = [
        MetricKey::DataMining,
        MetricKey::Modeling,
        MetricKey::Prioritizing,
        MetricKey::Connection,
        MetricKey::EmotionalInsight,
        MetricKey::Collaboration,
        MetricKey::Reflecting,
        MetricKey::Adaptability,
        MetricKey::CriticalThinking,
        MetricKey::Resilience,
        MetricKey::RiskTolerance,
        MetricKey::Imagination,
        MetricKey::Proactivity,
        MetricKey::Commitment,
        MetricKey::ProblemSolving,
        MetricKey::Vision,
        MetricKey::Design,
        MetricKey::Entrepreneurship,
    ];

    /// Metrics compared across benchmarks and segments: pillars, competencies,
    /// outcomes and talents, in that order.
    pub fn comparison_metrics() -> Vec<MetricKey> {
        Self::PILLARS
            .iter()
            .chain(Self::COMPETENCIES.iter())
            .chain(Self::OUTCOMES.iter())
            .chain(Self::TALENTS.iter())
            .copied()
            .collect()
    }

    /// Every metric the overall statistics cover, in catalogue order.
    pub fn statistics_metrics() -> Vec<MetricKey> {
        let mut metrics = Vec::with_capacity(43);
        metrics.push(MetricKey::EqTotal);
        metrics.extend(Self::comparison_metrics());
        metrics.push(MetricKey::ReliabilityIndex);
        metrics
    }

    pub fn category(&self) -> MetricCategory {
        if *self == MetricKey::EqTotal {
            MetricCategory::Total
        } else if *self == MetricKey::ReliabilityIndex {
            MetricCategory::Reliability
        } else if Self::PILLARS.contains(self) {
            MetricCategory::Pillar
        } else if Self::COMPETENCIES.contains(self) {
            MetricCategory::Competency
        } else if Self::OUTCOMES.contains(self) {
            MetricCategory::Outcome
        } else {
            MetricCategory::Talent
        }
    }

    pub fn is_outcome(&self) -> bool {
        self.category() == MetricCategory::Outcome
    }

    /// The stable wire name of the metric.
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }

    /// Parses a wire name, mapping failures onto the crate error type.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        MetricKey::from_str(value).map_err(|_| CoreError::UnknownMetric(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_sizes_match_the_instrument() {
        assert_eq!(MetricKey::comparison_metrics().len(), 41);
        assert_eq!(MetricKey::statistics_metrics().len(), 43);
    }

    #[test]
    fn wire_names_are_stable() {
        assert_eq!(MetricKey::EqTotal.as_str(), "eqTotal");
        assert_eq!(MetricKey::KnowYourself.as_str(), "K");
        assert_eq!(MetricKey::ConsequentialThinking.as_str(), "ACT");
        assert_eq!(MetricKey::QualityOfLife.as_str(), "qualityOfLife");
        assert_eq!(MetricKey::DataMining.to_string(), "dataMining");
        assert_eq!(MetricKey::parse("EMP").unwrap(), MetricKey::Empathy);
        assert_eq!(MetricKey::parse("reliabilityIndex").unwrap(), MetricKey::ReliabilityIndex);
    }

    #[test]
    fn serde_and_strum_names_agree() {
        for key in MetricKey::statistics_metrics() {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
    }

    #[test]
    fn unknown_metric_is_rejected() {
        assert_eq!(
            MetricKey::parse("iq"),
            Err(CoreError::UnknownMetric("iq".to_string()))
        );
    }

    #[test]
    fn categories() {
        assert_eq!(MetricKey::Health.category(), MetricCategory::Outcome);
        assert_eq!(MetricKey::NobleGoals.category(), MetricCategory::Competency);
        assert_eq!(MetricKey::Vision.category(), MetricCategory::Talent);
        assert!(!MetricKey::EqTotal.is_outcome());
    }
}
