//! Error taxonomy for the notification core.
//!
//! Weather acquisition and cache access surface typed errors; push dispatch
//! failures are reported as result values by the notification service and
//! only use [`PushError`] at the provider seam.

/// Failure while acquiring weather data.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    /// The forecast service answered with a non-success result code.
    #[error("forecast service error {code}: {message}")]
    Provider { code: String, message: String },

    /// The forecast service answered successfully but with no observations.
    #[error("forecast response contained no observations")]
    NoData,

    /// A mandatory observation category was absent from the response.
    #[error("mandatory forecast category missing: {0}")]
    MissingData(&'static str),

    #[error("forecast request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to parse forecast response: {0}")]
    Parse(String),

    /// Cache read failures propagate; cache write failures do not (they are
    /// logged and swallowed on the acquisition path).
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl WeatherError {
    /// Stable machine-readable code for the failure.
    pub fn code(&self) -> &str {
        match self {
            Self::Provider { code, .. } => code,
            Self::NoData => "NO_DATA",
            Self::MissingData(_) => "MISSING_DATA",
            Self::Http(_) => "HTTP_ERROR",
            Self::Parse(_) => "PARSE_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
        }
    }
}

/// Failure at the cache store boundary.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache read failed for key {key}: {reason}")]
    Read { key: String, reason: String },

    #[error("cache write failed for key {key}: {reason}")]
    Write { key: String, reason: String },

    /// A stored payload could not be decoded. Treated as a read failure, not
    /// as a miss.
    #[error("corrupt cache payload for key {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Failure at the push provider seam.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("push request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("push service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider accepted the request but rejected this recipient.
    #[error("push rejected: {0}")]
    Rejected(String),

    #[error("failed to parse push service response: {0}")]
    Parse(String),
}
