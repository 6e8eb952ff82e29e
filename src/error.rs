use thiserror::Error;

#[derive(Error, Debug)]
pub enum LvrError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed row {line} in {file}: {reason}")]
    MalformedRow {
        file: String,
        line: u64,
        reason: String,
    },

    #[error("Unrecognized trade type '{0}'")]
    UnrecognizedTradeType(String),

    #[error("Missing main file {main} for {file}")]
    MissingMainFile { file: String, main: String },

    #[error("Invalid filter condition: {0}")]
    InvalidCondition(String),

    #[error("Insufficient data: need at least 2 monthly averages, got {0}")]
    InsufficientData(usize),

    #[error("Degenerate fit: every sample has the same month offset")]
    DegenerateFit,

    #[error("Store connection error: {0}")]
    StoreConnection(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, LvrError>;
