use thiserror::Error;

#[derive(Error, Debug)]
pub enum TtError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Section not found on {site}: {selector}")]
    MissingSection { site: String, selector: String },

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, TtError>;
