use std::sync::{Arc, PoisonError, RwLock};

/// A session cookie as sent back to the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Formats the cookie as a `Cookie` header value
    pub fn header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }

    /// Parses the pairs of a `Cookie` header value (`a=1; b=2`)
    pub fn parse_header(header: &str) -> Vec<Self> {
        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| Self::new(name, value))
            .collect()
    }
}

/// Applies one `Set-Cookie` header value to a list of cookies
///
/// A cookie expired through `Max-Age=0` (or a negative age) is removed;
/// any other cookie is merged in by name. Malformed headers are ignored.
pub fn apply_set_cookie(cookies: &mut Vec<Cookie>, header: &str) {
    let mut parts = header.split(';');
    let Some((name, value)) = parts.next().and_then(|pair| pair.split_once('=')) else {
        return;
    };
    let name = name.trim();
    if name.is_empty() {
        return;
    }

    let expired = parts
        .filter_map(|attr| attr.split_once('='))
        .filter(|(key, _)| key.trim().eq_ignore_ascii_case("max-age"))
        .any(|(_, age)| age.trim().parse::<i64>().is_ok_and(|age| age <= 0));

    if expired {
        cookies.retain(|c| c.name != name);
    } else {
        merge_cookies(cookies, [Cookie::new(name, value.trim())]);
    }
}

/// Adds cookies to a list, replacing earlier cookies with the same name
pub fn merge_cookies(cookies: &mut Vec<Cookie>, incoming: impl IntoIterator<Item = Cookie>) {
    for cookie in incoming {
        match cookies.iter_mut().find(|c| c.name == cookie.name) {
            Some(existing) => existing.value = cookie.value,
            None => cookies.push(cookie),
        }
    }
}

/// The cookie set of the active session, shared with every fetcher
///
/// Clones share the same underlying set. The lock is only held to copy or
/// swap the list, never across a request.
#[derive(Debug, Clone, Default)]
pub struct SessionCookies {
    inner: Arc<RwLock<Vec<Cookie>>>,
}

impl SessionCookies {
    /// Copies the current cookies
    pub fn snapshot(&self) -> Vec<Cookie> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the cookie set
    pub fn replace(&self, cookies: Vec<Cookie>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = cookies;
    }

    /// Empties the cookie set
    pub fn clear(&self) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
