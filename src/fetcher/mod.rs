//! Fetcher module for retrieving resources on behalf of the crawler
//!
//! This module contains the fetch stage, including:
//! - Round-robin user agent rotation
//! - Bounded single-resource HTTP fetches
//! - Mapping of responses and failures to uniform results
//! - A lazy stream adapter over sequences of resources

mod executor;
mod mapper;
mod rotator;
mod stream;

pub(crate) use executor::build_static_headers;
pub use executor::{build_http_client, FetchedResponse, Fetcher, READ_CHUNK_SIZE};
pub use mapper::into_fetched_data;
pub use rotator::UserAgentRotator;
pub use stream::{fetch_all, fetch_stream};
