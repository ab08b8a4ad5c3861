use std::io;

use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to load respondent sheet from {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("{0}")]
    Config(String),
    #[error("select a respondent first")]
    NoSelection,
    #[error("respondent #{index} is not in the current view ({len} shown)")]
    SelectionOutOfRange { index: usize, len: usize },
}
