use crate::model::{Resource, ResourceStatus};
use std::collections::HashMap;

/// Name of the synthetic header flagging a body cut at the content limit
pub const TRUNCATED_HEADER: &str = "x-content-truncated";

/// Uniform outcome of one fetch attempt, success or failure alike
#[derive(Debug, Clone)]
pub struct FetchedData {
    /// Raw body bytes (empty for failed fetches)
    pub content: Vec<u8>,

    /// Declared Content-Type, or an empty string
    pub content_type: String,

    /// HTTP status code, or the error code assigned to a failure
    pub status_code: u16,

    /// Response headers keyed by lower-case name, values in response order
    pub headers: HashMap<String, Vec<String>>,

    /// The resource this result was produced from
    pub resource: Resource,
}

impl FetchedData {
    /// Creates a result for a resource with no headers attached
    pub fn new(
        content: Vec<u8>,
        content_type: impl Into<String>,
        status_code: u16,
        resource: Resource,
    ) -> Self {
        Self {
            content,
            content_type: content_type.into(),
            status_code,
            headers: HashMap::new(),
            resource,
        }
    }

    /// Creates the empty result recorded for a failed fetch
    pub fn failed(status_code: u16, mut resource: Resource) -> Self {
        resource.status = ResourceStatus::Error;
        Self::new(Vec::new(), "", status_code, resource)
    }

    /// Marks the content as cut short at the content limit
    pub fn mark_truncated(&mut self) {
        self.headers
            .insert(TRUNCATED_HEADER.to_string(), vec![true.to_string()]);
    }

    /// Returns true if the body was cut at the content limit
    pub fn is_truncated(&self) -> bool {
        self.header(TRUNCATED_HEADER) == Some("true")
    }

    /// Returns the first value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns true if the attempt produced a response
    pub fn is_fetched(&self) -> bool {
        self.resource.status == ResourceStatus::Fetched
    }
}
