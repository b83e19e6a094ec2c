//! Single-resource HTTP fetcher
//!
//! This module performs one bounded GET per resource:
//! - Static headers, rotated user agent, and session cookies
//! - Connect timeout on the client, read timeout on every wait for data
//! - Body streamed into memory up to the content limit
//! - 404 and 410 answers and transport failures classified for the result
//!   mapper

use crate::config::FetcherConfig;
use crate::fetcher::mapper::into_fetched_data;
use crate::fetcher::rotator::UserAgentRotator;
use crate::model::{FetchedData, Resource};
use crate::session::SessionCookies;
use crate::{ConfigError, FetchError, SumiError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

/// Size of the slices the body is copied in
pub const READ_CHUNK_SIZE: usize = 4096;

/// A response read to completion or to the content limit
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// Body bytes, at most the content limit
    pub content: Vec<u8>,

    /// Declared Content-Type, or an empty string
    pub content_type: String,

    /// HTTP status code
    pub status_code: u16,

    /// Response headers keyed by lower-case name
    pub headers: HashMap<String, Vec<String>>,

    /// Whether reading stopped at the content limit
    pub truncated: bool,
}

/// Fetches resources with rotating user agents and bounded reads
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    rotator: Arc<UserAgentRotator>,
    headers: HeaderMap,
    connect_timeout: Duration,
    read_timeout: Duration,
    content_limit: usize,
    cookies: SessionCookies,
}

/// Builds the HTTP client used for resource fetches
///
/// Only the connect timeout is set on the client; the read timeout is applied
/// per wait so that a steady stream is bounded by the content limit instead.
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(config.connect_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

impl Fetcher {
    /// Creates a fetcher from configuration
    ///
    /// Loads the user agent list, which is the only step that touches the
    /// filesystem.
    pub fn new(config: &FetcherConfig) -> Result<Self, SumiError> {
        let rotator = UserAgentRotator::from_source(config.user_agents.as_ref())?;
        Self::with_rotator(config, Arc::new(rotator))
    }

    /// Creates a fetcher sharing an existing rotator
    pub fn with_rotator(
        config: &FetcherConfig,
        rotator: Arc<UserAgentRotator>,
    ) -> Result<Self, SumiError> {
        Ok(Self {
            client: build_http_client(config)?,
            rotator,
            headers: build_static_headers(&config.headers)?,
            connect_timeout: config.connect_timeout(),
            read_timeout: config.read_timeout(),
            content_limit: config.content_limit,
            cookies: SessionCookies::default(),
        })
    }

    /// Attaches the cookie set of an authenticated session
    pub fn with_cookies(mut self, cookies: SessionCookies) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn cookies(&self) -> &SessionCookies {
        &self.cookies
    }

    pub fn rotator(&self) -> &Arc<UserAgentRotator> {
        &self.rotator
    }

    pub fn content_limit(&self) -> usize {
        self.content_limit
    }

    /// Fetches a resource, converting any failure into an error result
    ///
    /// The resource status is always set: `Fetched` when a response was read,
    /// `Error` when the resource is gone (404/410) or the request failed.
    pub async fn fetch(&self, resource: Resource) -> FetchedData {
        let outcome = self.execute(&resource).await;
        into_fetched_data(resource, outcome)
    }

    /// Performs the request for a resource and reads its body
    ///
    /// A 404 or 410 answer is a not-found error and its body is not read.
    /// Other HTTP error statuses are returned as normal responses. Reaching
    /// the content limit is not an error.
    pub async fn execute(&self, resource: &Resource) -> Result<FetchedResponse, FetchError> {
        let url_str = resource.url.as_str();
        tracing::info!("Fetching {}", url_str);

        let url = Url::parse(url_str).map_err(|source| FetchError::InvalidUrl {
            url: url_str.to_string(),
            source,
        })?;

        let headers = self.request_headers();
        let request = self.client.get(url).headers(headers);

        // The response head must arrive within the connect and read windows
        let head_window = self.connect_timeout + self.read_timeout;
        let response = match timeout(head_window, request.send()).await {
            Ok(result) => result.map_err(|e| classify_error(url_str, e))?,
            Err(_) => {
                return Err(FetchError::Timeout {
                    url: url_str.to_string(),
                })
            }
        };

        let status_code = response.status().as_u16();
        tracing::debug!("Status code {} for {}", status_code, url_str);

        if matches!(response.status(), StatusCode::NOT_FOUND | StatusCode::GONE) {
            return Err(FetchError::NotFound {
                url: url_str.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let headers = collect_headers(response.headers());
        let declared_length = response.content_length();

        let (content, truncated) = self.read_body(url_str, response).await?;

        if truncated {
            tracing::info!(
                "Content truncated: {}, total size: {}, truncated size: {}",
                url_str,
                declared_length.map_or_else(|| "unknown".to_string(), |n| n.to_string()),
                content.len()
            );
        }

        Ok(FetchedResponse {
            content,
            content_type,
            status_code,
            headers,
            truncated,
        })
    }

    /// Assembles the headers for one request
    ///
    /// Consumes one rotation slot.
    fn request_headers(&self) -> HeaderMap {
        let mut headers = self.headers.clone();
        if headers.is_empty() {
            tracing::debug!("No static headers configured");
        } else {
            tracing::debug!("Adding headers: {:?}", headers.keys().collect::<Vec<_>>());
        }

        match self.rotator.next() {
            Some(agent) => match HeaderValue::from_str(&agent) {
                Ok(value) => {
                    tracing::debug!("User-Agent: {}", agent);
                    headers.insert(USER_AGENT, value);
                }
                Err(_) => tracing::warn!("Skipping invalid user agent {:?}", agent),
            },
            None => tracing::debug!("No rotating agents are available"),
        }

        for cookie in self.cookies.snapshot() {
            match HeaderValue::from_str(&cookie.header_value()) {
                Ok(value) => {
                    tracing::debug!("Cookie added: {}", cookie.name);
                    headers.append(COOKIE, value);
                }
                Err(_) => tracing::warn!("Skipping invalid cookie {}", cookie.name),
            }
        }

        headers
    }

    /// Streams the body into memory, stopping at the content limit
    ///
    /// Returns the bytes read and whether more data was left unread.
    async fn read_body(
        &self,
        url: &str,
        mut response: Response,
    ) -> Result<(Vec<u8>, bool), FetchError> {
        let capacity = response
            .content_length()
            .map_or(READ_CHUNK_SIZE, |n| usize::try_from(n).unwrap_or(usize::MAX))
            .min(self.content_limit);
        let mut buffer = Vec::with_capacity(capacity);

        loop {
            let chunk = match timeout(self.read_timeout, response.chunk()).await {
                Ok(Ok(Some(chunk))) => chunk,
                Ok(Ok(None)) => return Ok((buffer, false)),
                Ok(Err(e)) => return Err(classify_body_error(url, e)),
                Err(_) => {
                    return Err(FetchError::Timeout {
                        url: url.to_string(),
                    })
                }
            };

            for piece in chunk.chunks(READ_CHUNK_SIZE) {
                let remaining = self.content_limit - buffer.len();
                if piece.len() > remaining {
                    buffer.extend_from_slice(&piece[..remaining]);
                    return Ok((buffer, true));
                }
                buffer.extend_from_slice(piece);
            }
        }
    }
}

/// Parses configured static headers into a header map
pub(crate) fn build_static_headers(
    headers: &HashMap<String, String>,
) -> Result<HeaderMap, ConfigError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::Validation(format!("Invalid header name '{}'", name)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ConfigError::Validation(format!("Invalid value for header '{}'", name)))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Copies response headers into a name → values map
fn collect_headers(headers: &HeaderMap) -> HashMap<String, Vec<String>> {
    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in headers {
        map.entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    map
}

/// Classifies a failure to obtain a response
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    let url = url.to_string();
    if error.is_timeout() {
        FetchError::Timeout { url }
    } else if error.is_connect() {
        FetchError::Connect { url, source: error }
    } else {
        FetchError::Http { url, source: error }
    }
}

/// Classifies a failure while reading the body
fn classify_body_error(url: &str, error: reqwest::Error) -> FetchError {
    let url = url.to_string();
    if error.is_timeout() {
        FetchError::Timeout { url }
    } else {
        FetchError::Body { url, source: error }
    }
}
