// Custom error types and conversions
// One enum for both pipelines; binaries print these instead of panicking

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    // Response decoded but not in the expected shape
    #[error("unexpected api response: {0}")]
    ApiShape(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV file is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("row {row}: cannot parse timestamp '{value}'")]
    InvalidTimestamp { row: usize, value: String },

    #[error("row {row}: cannot parse rating '{value}'")]
    InvalidRating { row: usize, value: String },

    #[error("failed to load font {path}: {reason}")]
    Font { path: PathBuf, reason: String },

    #[error("word cloud error: {0}")]
    WordCloud(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

// Custom Result type using our AppError
pub type AppResult<T> = Result<T, AppError>;
