use crate::config::types::{Config, FetcherConfig, SessionConfig, UserAgentSource};
use crate::fetcher::build_static_headers;
use crate::ConfigError;
use reqwest::header::HeaderValue;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    if let Some(session) = &config.session {
        validate_session_config(session)?;
    }
    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.connect_timeout == 0 {
        return Err(ConfigError::Validation(
            "connect_timeout must be > 0ms".to_string(),
        ));
    }

    if config.read_timeout == 0 {
        return Err(ConfigError::Validation(
            "read_timeout must be > 0ms".to_string(),
        ));
    }

    if config.content_limit == 0 {
        return Err(ConfigError::Validation(
            "content_limit must be > 0 bytes".to_string(),
        ));
    }

    build_static_headers(&config.headers)?;

    if let Some(UserAgentSource::List(agents)) = &config.user_agents {
        for agent in agents {
            HeaderValue::from_str(agent).map_err(|_| {
                ConfigError::Validation(format!("Invalid user agent '{}'", agent))
            })?;
        }
    }

    Ok(())
}

/// Validates session configuration
fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    validate_http_url("login_url", &config.login_url)?;

    if let Some(logout_url) = &config.logout_url {
        validate_http_url("logout_url", logout_url)?;
    }

    if config.username.is_empty() {
        return Err(ConfigError::Validation(
            "username cannot be empty".to_string(),
        ));
    }

    for field in [&config.username_field, &config.password_field]
        .into_iter()
        .flatten()
    {
        if field.is_empty() {
            return Err(ConfigError::Validation(
                "login form field names cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates that a URL parses and uses the http or https scheme
fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", key, value, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            key, value
        )));
    }

    Ok(())
}
