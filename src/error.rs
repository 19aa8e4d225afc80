use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("timed out after {seconds}s while {action}: {url}")]
    Timeout {
        action: &'static str,
        seconds: u64,
        url: String,
    },

    #[error("No home cards loaded on the Redfin homepage ({0}).")]
    NoHomeCards(String),

    #[error("Unable to locate detail URL for a home card.")]
    MissingDetailUrl,

    #[error("Failed to load detail page ({status}): {url}")]
    DetailStatus { status: u16, url: String },

    #[error("Failed to load detail page (no response): {0}")]
    NoResponse(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
