use crate::enums::{BenchmarkScope, BenchmarkStatus, BenchmarkType};
use crate::metrics::MetricKey;
use crate::scope::ScopeField;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A named, scoped population of assessment records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Benchmark {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub benchmark_type: BenchmarkType,
    pub scope: BenchmarkScope,
    pub status: BenchmarkStatus,
    pub total_rows: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Categorical attributes of the person who took the assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ScopeAttributes {
    pub country: Option<String>,
    pub region: Option<String>,
    pub sector: Option<String>,
    pub job_function: Option<String>,
    pub job_role: Option<String>,
    pub age_range: Option<String>,
    pub gender: Option<String>,
    pub education: Option<String>,
    pub year: Option<i32>,
}

/// The three pillars of the Six Seconds model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PillarScores {
    pub know: Option<f64>,
    pub choose: Option<f64>,
    pub give: Option<f64>,
}

/// The eight SEI competencies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CompetencyScores {
    pub el: Option<f64>,
    pub rp: Option<f64>,
    pub act: Option<f64>,
    pub ne: Option<f64>,
    pub im: Option<f64>,
    pub op: Option<f64>,
    pub emp: Option<f64>,
    pub ng: Option<f64>,
}

/// Self-reported life and work outcomes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeScores {
    pub effectiveness: Option<f64>,
    pub relationships: Option<f64>,
    pub wellbeing: Option<f64>,
    pub quality_of_life: Option<f64>,
    pub influence: Option<f64>,
    pub decision_making: Option<f64>,
    pub community: Option<f64>,
    pub network: Option<f64>,
    pub achievement: Option<f64>,
    pub satisfaction: Option<f64>,
    pub balance: Option<f64>,
    pub health: Option<f64>,
}

/// The eighteen brain talents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TalentScores {
    pub data_mining: Option<f64>,
    pub modeling: Option<f64>,
    pub prioritizing: Option<f64>,
    pub connection: Option<f64>,
    pub emotional_insight: Option<f64>,
    pub collaboration: Option<f64>,
    pub reflecting: Option<f64>,
    pub adaptability: Option<f64>,
    pub critical_thinking: Option<f64>,
    pub resilience: Option<f64>,
    pub risk_tolerance: Option<f64>,
    pub imagination: Option<f64>,
    pub proactivity: Option<f64>,
    pub commitment: Option<f64>,
    pub problem_solving: Option<f64>,
    pub vision: Option<f64>,
    pub design: Option<f64>,
    pub entrepreneurship: Option<f64>,
}

/// One imported SEI assessment. Immutable once ingested; any score may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    pub id: String,
    /// Identifier from the source system. Not unique: repeated values mark duplicates.
    pub source_id: Option<String>,
    pub source_date: Option<NaiveDate>,
    pub benchmark_id: String,
    #[sqlx(flatten)]
    pub attributes: ScopeAttributes,
    pub eq_total: Option<f64>,
    #[sqlx(flatten)]
    pub pillars: PillarScores,
    #[sqlx(flatten)]
    pub competencies: CompetencyScores,
    #[sqlx(flatten)]
    pub outcomes: OutcomeScores,
    #[sqlx(flatten)]
    pub talents: TalentScores,
    pub brain_style: Option<String>,
    pub reliability_index: Option<f64>,
}

impl AssessmentRecord {
    pub fn new(id: impl Into<String>, benchmark_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            benchmark_id: benchmark_id.into(),
            ..Self::default()
        }
    }

    /// Sets a metric value, builder style.
    pub fn with_metric(mut self, key: MetricKey, value: f64) -> Self {
        *self.metric_mut(key) = Some(value);
        self
    }

    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    /// The value of a categorical attribute, rendered as text.
    pub fn attribute(&self, field: ScopeField) -> Option<String> {
        let attributes = &self.attributes;
        match field {
            ScopeField::Country => attributes.country.clone(),
            ScopeField::Region => attributes.region.clone(),
            ScopeField::Sector => attributes.sector.clone(),
            ScopeField::JobFunction => attributes.job_function.clone(),
            ScopeField::JobRole => attributes.job_role.clone(),
            ScopeField::AgeRange => attributes.age_range.clone(),
            ScopeField::Gender => attributes.gender.clone(),
            ScopeField::Education => attributes.education.clone(),
            ScopeField::Year => attributes.year.map(|year| year.to_string()),
            ScopeField::BrainStyle => self.brain_style.clone(),
        }
    }
}

// Maps every catalogue key onto its storage slot. Listing each variant keeps
// the matches exhaustive, so adding a metric without a slot fails to compile.
macro_rules! metric_slots {
    ($($key:ident => $($path:ident).+;)*) => {
        impl AssessmentRecord {
            /// The value of a metric. Non-finite values count as missing.
            pub fn metric(&self, key: MetricKey) -> Option<f64> {
                let value = match key {
                    $(MetricKey::$key => self.$($path).+,)*
                };
                value.filter(|v| v.is_finite())
            }

            pub fn metric_mut(&mut self, key: MetricKey) -> &mut Option<f64> {
                match key {
                    $(MetricKey::$key => &mut self.$($path).+,)*
                }
            }
        }
    };
}

metric_slots! {
    EqTotal => eq_total;
    KnowYourself => pillars.know;
    ChooseYourself => pillars.choose;
    GiveYourself => pillars.give;
    EmotionalLiteracy => competencies.el;
    RecognizePatterns => competencies.rp;
    ConsequentialThinking => competencies.act;
    NavigateEmotions => competencies.ne;
    IntrinsicMotivation => competencies.im;
    Optimism => competencies.op;
    Empathy => competencies.emp;
    NobleGoals => competencies.ng;
    Effectiveness => outcomes.effectiveness;
    Relationships => outcomes.relationships;
    Wellbeing => outcomes.wellbeing;
    QualityOfLife => outcomes.quality_of_life;
    Influence => outcomes.influence;
    DecisionMaking => outcomes.decision_making;
    Community => outcomes.community;
    Network => outcomes.network;
    Achievement => outcomes.achievement;
    Satisfaction => outcomes.satisfaction;
    Balance => outcomes.balance;
    Health => outcomes.health;
    DataMining => talents.data_mining;
    Modeling => talents.modeling;
    Prioritizing => talents.prioritizing;
    Connection => talents.connection;
    EmotionalInsight => talents.emotional_insight;
    Collaboration => talents.collaboration;
    Reflecting => talents.reflecting;
    Adaptability => talents.adaptability;
    CriticalThinking => talents.critical_thinking;
    Resilience => talents.resilience;
    RiskTolerance => talents.risk_tolerance;
    Imagination => talents.imagination;
    Proactivity => talents.proactivity;
    Commitment => talents.commitment;
    ProblemSolving => talents.problem_solving;
    Vision => talents.vision;
    Design => talents.design;
    Entrepreneurship => talents.entrepreneurship;
    ReliabilityIndex => reliability_index;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_metric_has_its_own_slot() {
        let mut record = AssessmentRecord::new("r", "b");
        for (i, key) in MetricKey::statistics_metrics().into_iter().enumerate() {
            *record.metric_mut(key) = Some(i as f64);
        }
        for (i, key) in MetricKey::statistics_metrics().into_iter().enumerate() {
            assert_eq!(record.metric(key), Some(i as f64), "slot for {key}");
        }
    }

    #[test]
    fn non_finite_scores_read_as_missing() {
        let record = AssessmentRecord::new("r", "b").with_metric(MetricKey::EqTotal, f64::NAN);
        assert_eq!(record.metric(MetricKey::EqTotal), None);
    }

    #[test]
    fn attributes_render_as_text() {
        let mut record = AssessmentRecord::new("r", "b");
        record.attributes.year = Some(2024);
        record.brain_style = Some("Strategist".to_string());
        assert_eq!(record.attribute(ScopeField::Year).as_deref(), Some("2024"));
        assert_eq!(record.attribute(ScopeField::BrainStyle).as_deref(), Some("Strategist"));
        assert_eq!(record.attribute(ScopeField::Country), None);
    }
}
