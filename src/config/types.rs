use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Default connect timeout (milliseconds)
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 5_000;

/// Default read timeout (milliseconds)
pub const DEFAULT_READ_TIMEOUT: u64 = 10_000;

/// Default content limit (bytes)
pub const DEFAULT_CONTENT_LIMIT: usize = 100 * 1024 * 1024;

/// Main configuration structure for Sumi-Fetcher
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Optional login-protected site to authenticate against
    pub session: Option<SessionConfig>,
}

/// Fetch behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Rotating user agents: an inline list or a path to a list file
    #[serde(rename = "user-agents")]
    pub user_agents: Option<UserAgentSource>,

    /// Static headers added to every request
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Connect timeout (milliseconds)
    #[serde(rename = "connect-timeout", default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Read timeout (milliseconds)
    #[serde(rename = "read-timeout", default = "default_read_timeout")]
    pub read_timeout: u64,

    /// Maximum number of body bytes kept per response
    #[serde(rename = "content-limit", default = "default_content_limit")]
    pub content_limit: usize,
}

impl FetcherConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agents: None,
            headers: HashMap::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            content_limit: DEFAULT_CONTENT_LIMIT,
        }
    }
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT
}

fn default_read_timeout() -> u64 {
    DEFAULT_READ_TIMEOUT
}

fn default_content_limit() -> usize {
    DEFAULT_CONTENT_LIMIT
}

/// Where rotating user agents come from
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum UserAgentSource {
    /// User agents listed directly in the config
    List(Vec<String>),

    /// Newline-delimited file; `#` lines and blank lines are ignored
    File(PathBuf),
}

/// Login-protected site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Page holding the login form; credentials are posted back to it
    #[serde(rename = "login-url")]
    pub login_url: String,

    /// Page that ends the session
    #[serde(rename = "logout-url")]
    pub logout_url: Option<String>,

    pub username: String,

    pub password: String,

    /// Username input name, overriding discovery from the login page
    #[serde(rename = "username-field")]
    pub username_field: Option<String>,

    /// Password input name, overriding discovery from the login page
    #[serde(rename = "password-field")]
    pub password_field: Option<String>,
}
