use thiserror::Error;

/// Raised before any network work when the target cannot be turned into a URL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid URL '{input}': {reason}")]
pub struct InvalidUrlError {
    pub input: String,
    pub reason: String,
}

impl InvalidUrlError {
    pub fn new(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Failure of the primary page request. Absorbed into a degraded report by the scanner.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Too many redirects (limit {limit})")]
    TooManyRedirects { limit: usize },

    #[error("Invalid redirect from {from}: {reason}")]
    InvalidRedirect { from: String, reason: String },

    #[error("Request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

/// robots.txt lookup failure. Never surfaces past the robots module.
#[derive(Error, Debug)]
pub enum RobotsCheckError {
    #[error("Invalid robots.txt location: {0}")]
    Location(String),

    #[error("robots.txt request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Persistence failure. A scan whose write failed is not committed.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store lock poisoned")]
    Poisoned,

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Site with domain '{0}' already exists")]
    DuplicateSite(String),

    #[error("State file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State file is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Failure while processing one monitoring config during a sweep.
#[derive(Error, Debug)]
#[error("Error processing monitoring config {config_id}: {source}")]
pub struct ConfigProcessingError {
    pub config_id: i64,
    #[source]
    pub source: StoreError,
}
