use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to load environment variables for database connection: {0}")]
    ConnectionConfigError(String),

    #[error("Database query failed: {0}")]
    QueryError(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("An error occurred during JSON serialization/deserialization: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Stored value '{value}' in column '{column}' is not recognised")]
    CorruptData { column: &'static str, value: String },
}

impl DbError {
    pub(crate) fn corrupt(column: &'static str, value: impl Into<String>) -> Self {
        DbError::CorruptData {
            column,
            value: value.into(),
        }
    }
}
