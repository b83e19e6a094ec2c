/// Resource definitions shared with the crawl frontier
///
/// The frontier owns resources; the fetcher only reads the URL and records
/// the outcome in the status field.
use std::fmt;

/// Represents the current state of a resource in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceStatus {
    // ===== Frontier States =====
    /// Resource is known to the frontier but has not been fetched
    #[default]
    Unfetched,

    /// Resource has been handed out for fetching
    Fetching,

    // ===== Fetch Outcomes =====
    /// A response was received (any HTTP status code)
    Fetched,

    /// The fetch failed before a response could be read
    Error,
}

impl ResourceStatus {
    /// Returns true if a fetch attempt has recorded its outcome
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Fetched | Self::Error)
    }

    /// Converts the status to the string form stored by the frontier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unfetched => "UNFETCHED",
            Self::Fetching => "FETCHING",
            Self::Fetched => "FETCHED",
            Self::Error => "ERROR",
        }
    }

    /// Parses a status from the frontier's string form
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UNFETCHED" => Some(Self::Unfetched),
            "FETCHING" => Some(Self::Fetching),
            "FETCHED" => Some(Self::Fetched),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fetch target supplied by the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// The URL to fetch
    pub url: String,

    /// Outcome of the most recent fetch attempt
    pub status: ResourceStatus,
}

impl Resource {
    /// Creates an unfetched resource for the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: ResourceStatus::Unfetched,
        }
    }
}
