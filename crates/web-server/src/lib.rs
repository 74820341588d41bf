use analytics::AnalyticsEngine;
use analyzer::BenchmarkAnalyzer;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use configuration::Config;
use database::DbRepository;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: BenchmarkAnalyzer,
}

/// Builds the API router over an analyzer.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/benchmarks", get(handlers::list_benchmarks))
        .route("/api/benchmarks/:id/statistics", get(handlers::get_statistics))
        .route(
            "/api/benchmarks/:id/statistics/grouped",
            get(handlers::get_grouped_statistics),
        )
        .route(
            "/api/benchmarks/:id/top-performers/:outcome",
            get(handlers::get_top_performers).post(handlers::generate_top_performers),
        )
        .route(
            "/api/benchmarks/:id/correlations",
            get(handlers::get_correlations).post(handlers::calculate_correlations),
        )
        .route("/api/benchmarks/:id/data-quality", get(handlers::get_data_quality))
        .route("/api/comparisons/benchmarks", post(handlers::compare_benchmarks))
        .route(
            "/api/comparisons/benchmarks/csv",
            post(handlers::compare_benchmarks_csv),
        )
        .route("/api/comparisons/segments", post(handlers::compare_segments))
        .route(
            "/api/comparisons/segments/csv",
            post(handlers::compare_segments_csv),
        )
        .with_state(state)
        .layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024))
}

/// Connects to the database, applies migrations and serves the API until the
/// process is stopped. Tracing must already be initialised by the caller.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let addr = config.server.socket_addr()?;

    let db_pool = database::connect().await?;
    database::run_migrations(&db_pool).await?;
    let store = Arc::new(DbRepository::new(db_pool));
    let engine = Arc::new(AnalyticsEngine::new(config)?);
    tracing::info!(workers = engine.workers(), "Analytics engine ready.");

    let app_state = Arc::new(AppState {
        analyzer: BenchmarkAnalyzer::new(store, engine),
    });
    let app = build_router(app_state);

    tracing::info!("Web server listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
