//! Sumi-Fetcher: the fetch stage of a polite web crawler
//!
//! This crate turns resources handed out by a crawl frontier into uniform fetch
//! results, rotating user agents, bounding response sizes, and optionally
//! carrying the cookies of an authenticated session.

pub mod config;
pub mod fetcher;
pub mod model;
pub mod session;

use thiserror::Error;

/// Main error type for Sumi-Fetcher operations
#[derive(Debug, Error)]
pub enum SumiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while fetching a single resource
///
/// These never escape [`fetcher::Fetcher::fetch`]; they are converted into an
/// error-classified [`model::FetchedData`] instead.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: ::url::ParseError,
    },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {source}")]
    Connect { url: String, source: reqwest::Error },

    #[error("Resource not found: {url}")]
    NotFound { url: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Failed to read body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },
}

/// Status code reported for failures that are not a missing resource
pub const DEFAULT_ERROR_CODE: u16 = 400;

/// Status code reported for failures caused by a missing resource
pub const NOT_FOUND_CODE: u16 = 404;

impl FetchError {
    /// The HTTP-like status code recorded for a failed fetch
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => NOT_FOUND_CODE,
            _ => DEFAULT_ERROR_CODE,
        }
    }
}

/// Errors raised by the login/logout sequence
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: ::url::ParseError,
    },

    #[error("Login form at {url} has no {kind} input")]
    MissingField { url: String, kind: &'static str },

    #[error("Login rejected by {url} with status {status}")]
    LoginRejected { url: String, status: u16 },

    #[error("Logout rejected by {url} with status {status}")]
    LogoutRejected { url: String, status: u16 },
}

/// Result type alias for Sumi-Fetcher operations
pub type Result<T> = std::result::Result<T, SumiError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for session operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;

// Re-export commonly used types
pub use config::Config;
pub use fetcher::{fetch_all, fetch_stream, Fetcher, UserAgentRotator};
pub use model::{FetchedData, Resource, ResourceStatus};
pub use session::{Session, SessionCookies, SessionState};
