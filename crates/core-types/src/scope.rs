use crate::error::CoreError;
use crate::structs::AssessmentRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumString, IntoStaticStr};

/// A categorical attribute of an assessment record that records can be grouped
/// or filtered by.
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
pub enum ScopeField {
    Country,
    Region,
    Sector,
    JobFunction,
    JobRole,
    AgeRange,
    Gender,
    Education,
    Year,
    BrainStyle,
}

impl ScopeField {
    pub const ALL: [ScopeField; 10] = [
        ScopeField::Country,
        ScopeField::Region,
        ScopeField::Sector,
        ScopeField::JobFunction,
        ScopeField::JobRole,
        ScopeField::AgeRange,
        ScopeField::Gender,
        ScopeField::Education,
        ScopeField::Year,
        ScopeField::BrainStyle,
    ];

    /// The column backing this field in the `assessment_records` table.
    pub fn column(&self) -> &'static str {
        match self {
            ScopeField::Country => "country",
            ScopeField::Region => "region",
            ScopeField::Sector => "sector",
            ScopeField::JobFunction => "job_function",
            ScopeField::JobRole => "job_role",
            ScopeField::AgeRange => "age_range",
            ScopeField::Gender => "gender",
            ScopeField::Education => "education",
            ScopeField::Year => "year",
            ScopeField::BrainStyle => "brain_style",
        }
    }

    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        ScopeField::from_str(value).map_err(|_| CoreError::UnknownScopeField(value.to_string()))
    }
}

/// A named subset of one benchmark's records.
///
/// A record belongs to the segment when every criterion matches its attribute
/// exactly. A segment without criteria matches every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentFilter {
    pub name: String,
    #[serde(default)]
    pub criteria: BTreeMap<ScopeField, String>,
}

impl SegmentFilter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            criteria: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field: ScopeField, value: impl Into<String>) -> Self {
        self.criteria.insert(field, value.into());
        self
    }

    pub fn matches(&self, record: &AssessmentRecord) -> bool {
        self.criteria
            .iter()
            .all(|(field, expected)| record.attribute(*field).as_deref() == Some(expected.as_str()))
    }
}

/// Parses the CLI form `<name>:<field>=<value>[,<field>=<value>...]`.
impl FromStr for SegmentFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, criteria) = s
            .split_once(':')
            .ok_or_else(|| CoreError::InvalidSegment(s.to_string()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::InvalidSegment(s.to_string()));
        }

        let mut segment = SegmentFilter::new(name);
        for pair in criteria.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (field, value) = pair
                .split_once('=')
                .ok_or_else(|| CoreError::InvalidSegment(s.to_string()))?;
            let field = ScopeField::parse(field.trim())?;
            segment.criteria.insert(field, value.trim().to_string());
        }
        Ok(segment)
    }
}

impl fmt::Display for SegmentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.name)?;
        let criteria: Vec<String> = self
            .criteria
            .iter()
            .map(|(field, value)| format!("{}={}", field, value))
            .collect();
        write!(f, "{}", criteria.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(country: Option<&str>, year: Option<i32>) -> AssessmentRecord {
        let mut record = AssessmentRecord::new("r-1", "bm-1");
        record.attributes.country = country.map(str::to_string);
        record.attributes.year = year;
        record
    }

    #[test]
    fn parses_cli_segment() {
        let segment: SegmentFilter = "DACH Managers:country=DE, jobRole=Manager".parse().unwrap();
        assert_eq!(segment.name, "DACH Managers");
        assert_eq!(segment.criteria.get(&ScopeField::Country).unwrap(), "DE");
        assert_eq!(segment.criteria.get(&ScopeField::JobRole).unwrap(), "Manager");
        assert_eq!(segment.to_string(), "DACH Managers:country=DE,jobRole=Manager");
    }

    #[test]
    fn segment_without_criteria_matches_everything() {
        let segment: SegmentFilter = "everyone:".parse().unwrap();
        assert!(segment.criteria.is_empty());
        assert!(segment.matches(&record(None, None)));
    }

    #[test]
    fn rejects_malformed_segments() {
        assert!(matches!("no-colon".parse::<SegmentFilter>(), Err(CoreError::InvalidSegment(_))));
        assert!(matches!(":country=DE".parse::<SegmentFilter>(), Err(CoreError::InvalidSegment(_))));
        assert!(matches!("x:country".parse::<SegmentFilter>(), Err(CoreError::InvalidSegment(_))));
        assert_eq!(
            "x:planet=Mars".parse::<SegmentFilter>(),
            Err(CoreError::UnknownScopeField("planet".to_string()))
        );
    }

    #[test]
    fn matching_is_exact_and_handles_numeric_year() {
        let segment = SegmentFilter::new("es-2023")
            .with(ScopeField::Country, "ES")
            .with(ScopeField::Year, "2023");
        assert!(segment.matches(&record(Some("ES"), Some(2023))));
        assert!(!segment.matches(&record(Some("es"), Some(2023))));
        assert!(!segment.matches(&record(Some("ES"), None)));
    }

    #[test]
    fn scope_fields_round_trip_through_json_keys() {
        let segment = SegmentFilter::new("a").with(ScopeField::AgeRange, "25-34");
        let json = serde_json::to_string(&segment).unwrap();
        assert_eq!(json, r#"{"name":"a","criteria":{"ageRange":"25-34"}}"#);
        let back: SegmentFilter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, segment);
    }
}
