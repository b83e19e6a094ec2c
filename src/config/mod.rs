//! Configuration module for Sumi-Fetcher
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sumi_fetcher::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("fetcher.toml")).unwrap();
//! println!("Read timeout: {}ms", config.fetcher.read_timeout);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, FetcherConfig, SessionConfig, UserAgentSource, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_CONTENT_LIMIT, DEFAULT_READ_TIMEOUT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
