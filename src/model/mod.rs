//! Data model exchanged with the crawl frontier
//!
//! - `Resource`: a URL plus the status the fetch stage records for it
//! - `FetchedData`: the uniform result of one fetch attempt

mod fetched_data;
mod resource;

// Re-export main types
pub use fetched_data::{FetchedData, TRUNCATED_HEADER};
pub use resource::{Resource, ResourceStatus};
