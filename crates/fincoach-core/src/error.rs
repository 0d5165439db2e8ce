//! Error types for fincoach

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Generation backend error: {0}")]
    Backend(String),

    #[error("Generation backend returned an empty completion")]
    EmptyResponse,

    #[error("Generation backend timed out after {0}s")]
    Timeout(u64),
}

pub type Result<T> = std::result::Result<T, Error>;
