use crate::DbError;
use analytics::{CorrelationDirection, CorrelationResult, CorrelationStrength, TopPerformerOutcome};
use chrono::{DateTime, Utc};
use core_types::{
    AssessmentRecord, Benchmark, BenchmarkScope, BenchmarkStatus, BenchmarkType, MetricKey,
    ScopeField, SegmentFilter,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgPool, Postgres};
use sqlx::{FromRow, QueryBuilder};
use std::str::FromStr;

/// Columns of `assessment_records`, in the order `AssessmentRecord` maps them.
const RECORD_COLUMNS: &str = "id, source_id, source_date, benchmark_id, \
    country, region, sector, job_function, job_role, age_range, gender, education, year, \
    eq_total, know, choose, give, el, rp, act, ne, im, op, emp, ng, \
    effectiveness, relationships, wellbeing, quality_of_life, influence, decision_making, \
    community, network, achievement, satisfaction, balance, health, \
    data_mining, modeling, prioritizing, connection, emotional_insight, collaboration, \
    reflecting, adaptability, critical_thinking, resilience, risk_tolerance, imagination, \
    proactivity, commitment, problem_solving, vision, design, entrepreneurship, \
    brain_style, reliability_index";

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

/// A derived result as it was last persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResult<T> {
    pub computed_at: DateTime<Utc>,
    pub result: T,
}

/// A row of the `benchmarks` table. Enum columns are stored as text.
#[derive(Debug, Clone, FromRow)]
pub struct DbBenchmark {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub benchmark_type: String,
    pub scope: String,
    pub status: String,
    pub total_rows: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbBenchmark> for Benchmark {
    type Error = DbError;

    fn try_from(row: DbBenchmark) -> Result<Self, Self::Error> {
        Ok(Benchmark {
            benchmark_type: BenchmarkType::from_str(&row.benchmark_type)
                .map_err(|_| DbError::corrupt("benchmark_type", &row.benchmark_type))?,
            scope: BenchmarkScope::from_str(&row.scope)
                .map_err(|_| DbError::corrupt("scope", &row.scope))?,
            status: BenchmarkStatus::from_str(&row.status)
                .map_err(|_| DbError::corrupt("status", &row.status))?,
            id: row.id,
            name: row.name,
            description: row.description,
            total_rows: row.total_rows,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
struct DbCorrelation {
    benchmark_id: String,
    outcome: String,
    competency: String,
    correlation: f64,
    strength: String,
    direction: String,
    sample_size: i64,
}

impl TryFrom<DbCorrelation> for CorrelationResult {
    type Error = DbError;

    fn try_from(row: DbCorrelation) -> Result<Self, Self::Error> {
        Ok(CorrelationResult {
            outcome: MetricKey::parse(&row.outcome)
                .map_err(|_| DbError::corrupt("outcome", &row.outcome))?,
            competency: MetricKey::parse(&row.competency)
                .map_err(|_| DbError::corrupt("competency", &row.competency))?,
            strength: CorrelationStrength::from_str(&row.strength)
                .map_err(|_| DbError::corrupt("strength", &row.strength))?,
            direction: CorrelationDirection::from_str(&row.direction)
                .map_err(|_| DbError::corrupt("direction", &row.direction))?,
            benchmark_id: row.benchmark_id,
            correlation: row.correlation,
            sample_size: usize::try_from(row.sample_size)
                .map_err(|_| DbError::corrupt("sample_size", row.sample_size.to_string()))?,
        })
    }
}

/// Builds the record query of one benchmark, narrowed by the segment criteria.
/// Every value is a bound parameter.
fn records_query<'a>(
    benchmark_id: &'a str,
    segment: Option<&'a SegmentFilter>,
) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "SELECT {RECORD_COLUMNS} FROM assessment_records WHERE benchmark_id = "
    ));
    builder.push_bind(benchmark_id);

    if let Some(segment) = segment {
        for (field, value) in &segment.criteria {
            // Criteria are text; the numeric year column is compared as text.
            let column = match field {
                ScopeField::Year => "year::text",
                other => other.column(),
            };
            builder.push(" AND ").push(column).push(" = ");
            builder.push_bind(value.as_str());
        }
    }

    builder.push(" ORDER BY id");
    builder
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches every benchmark, newest first.
    pub async fn list_benchmarks(&self) -> Result<Vec<Benchmark>, DbError> {
        let rows = sqlx::query_as::<_, DbBenchmark>(
            "SELECT id, name, description, benchmark_type, scope, status, total_rows, created_at, updated_at \
             FROM benchmarks ORDER BY created_at DESC, id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Benchmark::try_from).collect()
    }

    /// Fetches one benchmark's metadata, or `None` when it does not exist.
    pub async fn fetch_benchmark_meta(&self, benchmark_id: &str) -> Result<Option<Benchmark>, DbError> {
        let row = sqlx::query_as::<_, DbBenchmark>(
            "SELECT id, name, description, benchmark_type, scope, status, total_rows, created_at, updated_at \
             FROM benchmarks WHERE id = $1",
        )
        .bind(benchmark_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Benchmark::try_from).transpose()
    }

    /// Fetches the records of one benchmark, optionally only those of a segment.
    pub async fn fetch_records(
        &self,
        benchmark_id: &str,
        segment: Option<&SegmentFilter>,
    ) -> Result<Vec<AssessmentRecord>, DbError> {
        let mut query = records_query(benchmark_id, segment);
        let records = query
            .build_query_as::<AssessmentRecord>()
            .fetch_all(&self.pool)
            .await?;
        tracing::debug!(benchmark_id, records = records.len(), "Fetched assessment records.");
        Ok(records)
    }

    /// Replaces the stored top-performer result for one outcome of a benchmark.
    pub async fn save_top_performers(
        &self,
        benchmark_id: &str,
        result: &TopPerformerOutcome,
    ) -> Result<DateTime<Utc>, DbError> {
        let payload = serde_json::to_value(result)?;
        let outcome = result.outcome();
        let computed_at = Utc::now();

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM top_performer_results WHERE benchmark_id = $1 AND outcome = $2")
            .bind(benchmark_id)
            .bind(outcome.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO top_performer_results (benchmark_id, outcome, payload, computed_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(benchmark_id)
        .bind(outcome.as_str())
        .bind(&payload)
        .bind(computed_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(computed_at)
    }

    /// The stored top-performer result of one outcome; `None` when it has not
    /// been generated yet.
    pub async fn get_top_performers(
        &self,
        benchmark_id: &str,
        outcome: MetricKey,
    ) -> Result<Option<StoredResult<TopPerformerOutcome>>, DbError> {
        let row = sqlx::query_as::<_, (JsonValue, DateTime<Utc>)>(
            "SELECT payload, computed_at FROM top_performer_results WHERE benchmark_id = $1 AND outcome = $2",
        )
        .bind(benchmark_id)
        .bind(outcome.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(payload, computed_at)| {
            Ok(StoredResult {
                computed_at,
                result: serde_json::from_value(payload)?,
            })
        })
        .transpose()
    }

    /// Replaces every stored correlation of a benchmark in one transaction, so
    /// readers see either the previous set or the new one.
    pub async fn save_correlations(
        &self,
        benchmark_id: &str,
        results: &[CorrelationResult],
    ) -> Result<DateTime<Utc>, DbError> {
        let computed_at = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM correlation_results WHERE benchmark_id = $1")
            .bind(benchmark_id)
            .execute(&mut *tx)
            .await?;

        if !results.is_empty() {
            let mut insert = QueryBuilder::<Postgres>::new(
                "INSERT INTO correlation_results \
                 (benchmark_id, outcome, competency, correlation, strength, direction, sample_size, computed_at) ",
            );
            insert.push_values(results, |mut row, result| {
                row.push_bind(benchmark_id)
                    .push_bind(result.outcome.as_str())
                    .push_bind(result.competency.as_str())
                    .push_bind(result.correlation)
                    .push_bind(result.strength.to_string())
                    .push_bind(result.direction.to_string())
                    .push_bind(result.sample_size as i64)
                    .push_bind(computed_at);
            });
            insert.build().execute(&mut *tx).await?;
        }

        sqlx::query(
            "INSERT INTO correlation_runs (benchmark_id, computed_at) VALUES ($1, $2) \
             ON CONFLICT (benchmark_id) DO UPDATE SET computed_at = EXCLUDED.computed_at",
        )
        .bind(benchmark_id)
        .bind(computed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(benchmark_id, pairs = results.len(), "Stored correlations.");
        Ok(computed_at)
    }

    /// The correlations of the latest calculation; `None` when the benchmark has
    /// never been calculated. A calculation without defined pairs yields `[]`.
    pub async fn get_correlations(
        &self,
        benchmark_id: &str,
    ) -> Result<Option<StoredResult<Vec<CorrelationResult>>>, DbError> {
        let mut tx = self.pool.begin().await?;
        let computed_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT computed_at FROM correlation_runs WHERE benchmark_id = $1",
        )
        .bind(benchmark_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(computed_at) = computed_at else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, DbCorrelation>(
            "SELECT benchmark_id, outcome, competency, correlation, strength, direction, sample_size \
             FROM correlation_results WHERE benchmark_id = $1 ORDER BY outcome, competency",
        )
        .bind(benchmark_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        let result = rows
            .into_iter()
            .map(CorrelationResult::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(StoredResult { computed_at, result }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_benchmark_query_binds_only_the_id() {
        let builder = records_query("bm-1", None);
        let sql = builder.sql();
        assert!(sql.starts_with("SELECT id, source_id, source_date, benchmark_id, country"));
        assert!(sql.ends_with("FROM assessment_records WHERE benchmark_id = $1 ORDER BY id"));
    }

    #[test]
    fn segment_criteria_become_bound_conditions() {
        let segment = SegmentFilter::new("Spanish retail 2024")
            .with(ScopeField::Sector, "Retail")
            .with(ScopeField::Country, "Spain")
            .with(ScopeField::Year, "2024");
        let builder = records_query("bm-1", Some(&segment));
        assert!(builder.sql().ends_with(
            "WHERE benchmark_id = $1 AND country = $2 AND sector = $3 AND year::text = $4 ORDER BY id"
        ));
    }

    #[test]
    fn every_record_slot_has_a_column() {
        let columns: Vec<&str> = RECORD_COLUMNS.split(',').map(str::trim).collect();
        // Identity (4), scope attributes (9), metrics (43) and brain style.
        assert_eq!(columns.len(), 4 + 9 + MetricKey::statistics_metrics().len() + 1);
        for field in ScopeField::ALL {
            assert!(columns.contains(&field.column()), "missing {}", field.column());
        }
    }

    #[test]
    fn stored_enums_must_be_known() {
        let row = DbBenchmark {
            id: "bm".into(),
            name: "Global".into(),
            description: None,
            benchmark_type: "ROWIVERSE".into(),
            scope: "GLOBAL".into(),
            status: "ARCHIVED".into(),
            total_rows: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let err = Benchmark::try_from(row.clone()).unwrap_err();
        assert!(matches!(err, DbError::CorruptData { column: "status", .. }));

        let ok = Benchmark::try_from(DbBenchmark {
            status: "READY".into(),
            ..row
        })
        .unwrap();
        assert!(ok.status.is_ready());
    }
}
