//! Authenticated session handling
//!
//! A session logs in to a site by scraping its login form and posting the
//! credentials back, then hands the cookies it received to every fetcher
//! sharing its [`SessionCookies`]. Logging out always returns the session to
//! the anonymous state, whatever the server answers.
//!
//! # States
//!
//! ```text
//! Anonymous --login--> Authenticating --200--> Authenticated
//!     ^                      |                      |
//!     +------ failure -------+                      |
//!     +------------------- logout ------------------+
//! ```

mod cookies;
mod form;

pub use cookies::{apply_set_cookie, merge_cookies, Cookie, SessionCookies};
pub use form::LoginFields;

use crate::config::{FetcherConfig, SessionConfig};
use crate::{SessionError, SessionResult};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONTENT_TYPE, COOKIE, PRAGMA,
    USER_AGENT,
};
use reqwest::redirect::Policy;
use reqwest::{Client, Response, StatusCode};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use url::Url;

/// User agent presented while logging in and out
pub const BROWSER_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; sumi-fetcher/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Authentication state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session cookies are held
    #[default]
    Anonymous,

    /// A login sequence is in progress
    Authenticating,

    /// Login succeeded; fetches carry the session cookies
    Authenticated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Anonymous => "anonymous",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
        };
        f.write_str(name)
    }
}

/// Manages login and logout against a login-protected site
#[derive(Debug)]
pub struct Session {
    cookies: SessionCookies,
    state: Mutex<SessionState>,
    connect_timeout: Duration,
    read_timeout: Duration,
    page_limit: usize,
    username_field: Option<String>,
    password_field: Option<String>,
}

impl Session {
    /// Creates an anonymous session using the fetcher's timeouts
    pub fn new(config: &FetcherConfig) -> Self {
        Self {
            cookies: SessionCookies::default(),
            state: Mutex::new(SessionState::Anonymous),
            connect_timeout: config.connect_timeout(),
            read_timeout: config.read_timeout(),
            page_limit: config.content_limit,
            username_field: None,
            password_field: None,
        }
    }

    /// Creates a session applying any configured login field names
    pub fn from_config(fetcher: &FetcherConfig, session: &SessionConfig) -> Self {
        Self::new(fetcher).with_field_names(
            session.username_field.clone(),
            session.password_field.clone(),
        )
    }

    /// Fixes the login input names instead of discovering them
    pub fn with_field_names(
        mut self,
        username_field: Option<String>,
        password_field: Option<String>,
    ) -> Self {
        self.username_field = username_field;
        self.password_field = password_field;
        self
    }

    /// The cookie set to hand to fetchers
    pub fn cookies(&self) -> &SessionCookies {
        &self.cookies
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    fn set_state(&self, state: SessionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Logs in by submitting credentials through the site's login form
    ///
    /// # Login Flow
    ///
    /// 1. GET the login page with browser-like headers and caching disabled
    /// 2. Find the username (`type="text"`) and password inputs
    /// 3. POST the url-encoded credentials back to the login URL
    /// 4. On HTTP 200, keep the cookies received as the session cookies
    ///
    /// Any failure leaves the session anonymous with no cookies; the error is
    /// returned for the caller to report.
    pub async fn login(
        &self,
        login_url: &str,
        username: &str,
        password: &str,
    ) -> SessionResult<()> {
        self.set_state(SessionState::Authenticating);

        match self.authenticate(login_url, username, password).await {
            Ok(cookies) => {
                tracing::info!(
                    "Logged in to {} ({} session cookies)",
                    login_url,
                    cookies.len()
                );
                self.cookies.replace(cookies);
                self.set_state(SessionState::Authenticated);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Login to {} failed: {}", login_url, e);
                self.cookies.clear();
                self.set_state(SessionState::Anonymous);
                Err(e)
            }
        }
    }

    /// Runs the login requests and returns the captured cookies
    async fn authenticate(
        &self,
        login_url: &str,
        username: &str,
        password: &str,
    ) -> SessionResult<Vec<Cookie>> {
        let url = parse_url(login_url)?;

        // A fresh jar per attempt carries cookies from the form page to the
        // POST and through any redirects
        let jar = Arc::new(RecordingJar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .connect_timeout(self.connect_timeout)
            .timeout(self.connect_timeout + self.read_timeout)
            .build()
            .map_err(|source| http_error(login_url, source))?;

        let page = client
            .get(url.clone())
            .headers(browser_headers())
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|source| http_error(login_url, source))?;
        tracing::debug!("GET {} returned {}", login_url, page.status());

        let html = read_page(page, self.page_limit)
            .await
            .map_err(|source| http_error(login_url, source))?;

        let fields = LoginFields::resolve(
            &html,
            login_url,
            self.username_field.as_deref(),
            self.password_field.as_deref(),
        )?;
        let body = fields.encode(username, password);

        let response = client
            .post(url.clone())
            .headers(browser_headers())
            .header(CACHE_CONTROL, "no-cache")
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|source| http_error(login_url, source))?;

        let status = response.status();
        tracing::debug!("POST {} returned {}", login_url, status);
        if status != StatusCode::OK {
            return Err(SessionError::LoginRejected {
                url: login_url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(jar.received())
    }

    /// Logs out and discards the session cookies
    ///
    /// Logging out of an anonymous session does nothing. Otherwise the logout
    /// URL is requested without following redirects; any answer other than
    /// HTTP 200 is reported as an error, but the session is cleared either way.
    pub async fn logout(&self, logout_url: &str) -> SessionResult<()> {
        if self.state() == SessionState::Anonymous {
            tracing::debug!("Logout of anonymous session is a no-op");
            return Ok(());
        }

        let result = self.end_session(logout_url).await;

        self.cookies.clear();
        self.set_state(SessionState::Anonymous);

        match &result {
            Ok(()) => tracing::info!("Logged out of {}", logout_url),
            Err(e) => tracing::warn!("Failed to log out of {}: {}", logout_url, e),
        }
        result
    }

    async fn end_session(&self, logout_url: &str) -> SessionResult<()> {
        let url = parse_url(logout_url)?;

        let client = Client::builder()
            .redirect(Policy::none())
            .connect_timeout(self.connect_timeout)
            .timeout(self.connect_timeout + self.read_timeout)
            .build()
            .map_err(|source| http_error(logout_url, source))?;

        let mut headers = browser_headers();
        for cookie in self.cookies.snapshot() {
            if let Ok(value) = HeaderValue::from_str(&cookie.header_value()) {
                headers.append(COOKIE, value);
            }
        }

        let response = client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|source| http_error(logout_url, source))?;

        let status = response.status();
        tracing::debug!("GET {} returned {}", logout_url, status);
        if status != StatusCode::OK {
            return Err(SessionError::LogoutRejected {
                url: logout_url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}

/// Headers that make the session look like a browser
fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE),
    );
    headers
}

/// Reads the login page as text, keeping at most `limit` bytes
async fn read_page(mut page: Response, limit: usize) -> reqwest::Result<String> {
    let mut body = Vec::new();
    while let Some(chunk) = page.chunk().await? {
        let remaining = limit - body.len();
        if chunk.len() >= remaining {
            body.extend_from_slice(&chunk[..remaining]);
            tracing::debug!("Login page cut at {} bytes", limit);
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Cookie store that also keeps every cookie the server set
///
/// The inner jar decides what is sent back during login. The recorded list
/// ignores domain and path so cookies scoped below the login page survive
/// into the session.
#[derive(Debug, Default)]
struct RecordingJar {
    jar: Jar,
    received: Mutex<Vec<Cookie>>,
}

impl RecordingJar {
    fn received(&self) -> Vec<Cookie> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CookieStore for RecordingJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let headers: Vec<&HeaderValue> = cookie_headers.collect();
        {
            let mut received = self.received.lock().unwrap_or_else(PoisonError::into_inner);
            for header in headers.iter().filter_map(|h| h.to_str().ok()) {
                apply_set_cookie(&mut received, header);
            }
        }
        self.jar.set_cookies(&mut headers.into_iter(), url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.jar.cookies(url)
    }
}

fn parse_url(url: &str) -> SessionResult<Url> {
    Url::parse(url).map_err(|source| SessionError::InvalidUrl {
        url: url.to_string(),
        source,
    })
}

fn http_error(url: &str, source: reqwest::Error) -> SessionError {
    SessionError::Http {
        url: url.to_string(),
        source,
    }
}
