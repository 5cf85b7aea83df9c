use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("KPI '{key}' has invalid target {target}: targets must be positive and finite")]
    InvalidTarget { key: String, target: f64 },

    #[error("KPI '{key}' is registered more than once")]
    DuplicateKpiKey { key: String },

    #[error("Malformed timestamp: '{raw}'")]
    MalformedTimestamp { raw: String },

    #[error("Metric '{key}' has non-finite value {value}")]
    NonFiniteValue { key: String, value: f64 },

    #[error("Unknown period '{period}': expected 'week' or 'month'")]
    InvalidPeriod { period: String },
}

pub type EngineResult<T> = Result<T, EngineError>;
