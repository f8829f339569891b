use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: missing {}", .fields.join(", "))]
    MissingConfig { fields: Vec<String> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("API rate limit still exceeded after {retries} retries")]
    RateLimitExceeded { retries: u32 },

    #[error("API request timed out after {retries} retries")]
    TimeoutExceeded { retries: u32 },

    #[error("Google Sheets API error: {0}")]
    Sheets(String),

    #[error("OAuth2 authentication error: {0}")]
    Auth(String),

    #[error("Secret store error: {0}")]
    Secrets(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
