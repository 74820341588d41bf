use crate::error::DbError;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

const DATABASE_URL_VAR: &str = "DATABASE_URL";
const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens the pool shared by every repository call.
///
/// The URL comes from `DATABASE_URL`; a `.env` file in the working directory
/// is honoured but optional.
pub async fn connect() -> Result<PgPool, DbError> {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "No .env file loaded.");
    }

    let database_url = std::env::var(DATABASE_URL_VAR).map_err(|_| {
        DbError::ConnectionConfigError(format!("{DATABASE_URL_VAR} must be set."))
    })?;

    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&database_url)
        .await?;

    tracing::info!(max_connections = MAX_CONNECTIONS, "Connected to the benchmark database.");
    Ok(pool)
}

/// Brings the benchmark, record and derived-result tables up to date.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::debug!("Schema migrations applied.");
    Ok(())
}
