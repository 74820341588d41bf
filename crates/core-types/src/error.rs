use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown metric key: '{0}'")]
    UnknownMetric(String),

    #[error("Unknown scope field: '{0}'")]
    UnknownScopeField(String),

    #[error("Invalid segment definition '{0}': expected '<name>:<field>=<value>[,<field>=<value>...]'")]
    InvalidSegment(String),
}
