use std::time::Duration;

use thiserror::Error;

/// Rejections raised while creating an alert. Display text is shown to users.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid asset type: {0}")]
    InvalidAssetClass(String),

    #[error("Symbol is required.")]
    MissingSymbol,

    #[error("Invalid crypto coin: {0}")]
    UnsupportedCoin(String),

    #[error("Threshold must be a valid number greater than 0.")]
    InvalidThreshold,

    #[error("Invalid direction, must be 'above' or 'below'.")]
    InvalidDirection(String),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{source_name} request failed: {status} {body}")]
    Status {
        source_name: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("{0} is missing in .env")]
    MissingApiKey(&'static str),

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("fetch task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read coin catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse coin catalog: {0}")]
    Json(#[from] serde_json::Error),
}
