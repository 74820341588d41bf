use crate::{AppState, error::AppError};
use analytics::{
    ComparisonResult, CorrelationResult, DataQualityReport, GroupedStat, OutcomeCorrelations,
    OverallStat, TopPerformerOutcome, comparison_to_csv, correlation,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use core_types::{Benchmark, MetricKey, ScopeField, SegmentFilter};
use database::StoredResult;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct GroupedQuery {
    pub group_by: String,
}

#[derive(Debug, Deserialize)]
pub struct CompareBenchmarksRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareSegmentsRequest {
    pub benchmark_id: String,
    pub segments: Vec<SegmentFilter>,
}

fn csv_response(body: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"comparison.csv\""),
        ],
        body,
    )
}

/// # GET /api/benchmarks
pub async fn list_benchmarks(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Benchmark>>, AppError> {
    Ok(Json(state.analyzer.list_benchmarks().await?))
}

/// # GET /api/benchmarks/:id/statistics
pub async fn get_statistics(
    Path(benchmark_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<OverallStat>>, AppError> {
    Ok(Json(state.analyzer.compute_statistics(&benchmark_id).await?))
}

/// # GET /api/benchmarks/:id/statistics/grouped?group_by=country
pub async fn get_grouped_statistics(
    Path(benchmark_id): Path<String>,
    Query(query): Query<GroupedQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<GroupedStat>>, AppError> {
    let field = ScopeField::parse(&query.group_by)?;
    Ok(Json(
        state
            .analyzer
            .compute_grouped_statistics(&benchmark_id, field)
            .await?,
    ))
}

/// # POST /api/benchmarks/:id/top-performers/:outcome
/// Regenerates and stores the result, replacing the previous one.
pub async fn generate_top_performers(
    Path((benchmark_id, outcome)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<StoredResult<TopPerformerOutcome>>, AppError> {
    let outcome = MetricKey::parse(&outcome)?;
    Ok(Json(
        state
            .analyzer
            .generate_top_performers(&benchmark_id, outcome)
            .await?,
    ))
}

/// # GET /api/benchmarks/:id/top-performers/:outcome
pub async fn get_top_performers(
    Path((benchmark_id, outcome)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<StoredResult<TopPerformerOutcome>>, AppError> {
    let outcome = MetricKey::parse(&outcome)?;
    state
        .analyzer
        .get_top_performers(&benchmark_id, outcome)
        .await?
        .map(Json)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Top performers for '{outcome}' have not been generated for benchmark '{benchmark_id}'"
            ))
        })
}

/// # POST /api/benchmarks/:id/correlations
pub async fn calculate_correlations(
    Path(benchmark_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<StoredResult<Vec<CorrelationResult>>>, AppError> {
    Ok(Json(state.analyzer.calculate_correlations(&benchmark_id).await?))
}

/// # GET /api/benchmarks/:id/correlations
/// The stored correlations, grouped by outcome.
pub async fn get_correlations(
    Path(benchmark_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<StoredResult<Vec<OutcomeCorrelations>>>, AppError> {
    let stored = state
        .analyzer
        .get_correlations(&benchmark_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Correlations have not been calculated for benchmark '{benchmark_id}'"
            ))
        })?;
    Ok(Json(StoredResult {
        computed_at: stored.computed_at,
        result: correlation::group_by_outcome(&stored.result),
    }))
}

/// # GET /api/benchmarks/:id/data-quality
pub async fn get_data_quality(
    Path(benchmark_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<DataQualityReport>, AppError> {
    Ok(Json(state.analyzer.analyze_data_quality(&benchmark_id).await?))
}

/// # POST /api/comparisons/benchmarks
pub async fn compare_benchmarks(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CompareBenchmarksRequest>,
) -> Result<Json<ComparisonResult>, AppError> {
    Ok(Json(state.analyzer.compare_benchmarks(&request.ids).await?))
}

/// # POST /api/comparisons/benchmarks/csv
pub async fn compare_benchmarks_csv(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CompareBenchmarksRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.analyzer.compare_benchmarks(&request.ids).await?;
    Ok(csv_response(comparison_to_csv(&result)?))
}

/// # POST /api/comparisons/segments
pub async fn compare_segments(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CompareSegmentsRequest>,
) -> Result<Json<ComparisonResult>, AppError> {
    Ok(Json(
        state
            .analyzer
            .compare_segments(&request.benchmark_id, &request.segments)
            .await?,
    ))
}

/// # POST /api/comparisons/segments/csv
pub async fn compare_segments_csv(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CompareSegmentsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = state
        .analyzer
        .compare_segments(&request.benchmark_id, &request.segments)
        .await?;
    Ok(csv_response(comparison_to_csv(&result)?))
}
