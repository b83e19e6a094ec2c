//! Login form discovery
//!
//! The username field is the first named `<input type="text">` on the login
//! page and the password field the first named `<input type="password">`.
//! Either can be fixed by configuration when the page layout defeats this.

use crate::{SessionError, SessionResult};
use scraper::{Html, Selector};
use url::form_urlencoded;

/// Names of the inputs credentials are posted under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginFields {
    pub username: String,
    pub password: String,
}

impl LoginFields {
    /// Locates the username and password inputs in a login page
    pub fn discover(html: &str, url: &str) -> SessionResult<Self> {
        Self::resolve(html, url, None, None)
    }

    /// Uses configured field names, discovering any that are missing
    pub fn resolve(
        html: &str,
        url: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> SessionResult<Self> {
        let document = Html::parse_document(html);

        let username = match username {
            Some(name) => name.to_string(),
            None => first_input_name(&document, "text").ok_or_else(|| {
                SessionError::MissingField {
                    url: url.to_string(),
                    kind: "text",
                }
            })?,
        };

        let password = match password {
            Some(name) => name.to_string(),
            None => first_input_name(&document, "password").ok_or_else(|| {
                SessionError::MissingField {
                    url: url.to_string(),
                    kind: "password",
                }
            })?,
        };

        tracing::debug!("Login fields: username={}, password={}", username, password);
        Ok(Self { username, password })
    }

    /// Builds the `application/x-www-form-urlencoded` login body
    pub fn encode(&self, username: &str, password: &str) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair(&self.username, username)
            .append_pair(&self.password, password)
            .finish()
    }
}

/// Returns the name of the first named input of the given type
fn first_input_name(document: &Html, input_type: &str) -> Option<String> {
    let selector = Selector::parse("input[type][name]").ok()?;

    document
        .select(&selector)
        .filter(|element| {
            element
                .value()
                .attr("type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case(input_type))
        })
        .filter_map(|element| element.value().attr("name"))
        .find(|name| !name.is_empty())
        .map(str::to_string)
}
