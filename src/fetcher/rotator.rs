//! Round-robin user agent rotation
//!
//! The rotator is shared by every concurrent fetch; its index is advanced with
//! a single atomic update so no two callers read the same slot within a cycle.

use crate::config::UserAgentSource;
use crate::ConfigError;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Hands out configured user agents in round-robin order
#[derive(Debug, Default)]
pub struct UserAgentRotator {
    agents: Vec<String>,
    index: AtomicUsize,
}

impl UserAgentRotator {
    /// Creates a rotator over the given agents, dropping duplicates
    ///
    /// The first occurrence of each agent keeps its position.
    pub fn new<I, S>(agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let agents = agents
            .into_iter()
            .map(Into::into)
            .filter(|agent| seen.insert(agent.clone()))
            .collect();

        Self {
            agents,
            index: AtomicUsize::new(0),
        }
    }

    /// Builds a rotator from the configured source
    ///
    /// A missing source yields an empty rotator.
    pub fn from_source(source: Option<&UserAgentSource>) -> Result<Self, ConfigError> {
        match source {
            None => Ok(Self::default()),
            Some(UserAgentSource::List(agents)) => Ok(Self::new(agents.iter().cloned())),
            Some(UserAgentSource::File(path)) => Self::from_file(path),
        }
    }

    /// Loads agents from a newline-delimited file
    ///
    /// A file that does not exist is logged and treated as an empty list so
    /// fetching can proceed without rotation; any other read failure is an
    /// error.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(
                    "Could not find rotating user agents file {}",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    /// Parses a user agent list, skipping blank lines and `#` comments
    pub fn parse(content: &str) -> Self {
        Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    /// Returns the next user agent and advances the rotation
    pub fn next(&self) -> Option<String> {
        if self.agents.is_empty() {
            return None;
        }

        let len = self.agents.len();
        let slot = self
            .index
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |i| Some((i + 1) % len))
            .unwrap_or_else(|i| i);

        self.agents.get(slot).cloned()
    }

    /// The deduplicated agents in rotation order
    pub fn agents(&self) -> &[String] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
