use crate::fetcher::executor::FetchedResponse;
use crate::model::{FetchedData, Resource, ResourceStatus};
use crate::FetchError;

/// Converts the outcome of one fetch into a uniform result
///
/// | Outcome | Status code | Resource status |
/// |---------|-------------|-----------------|
/// | Response (any other HTTP status) | response status | `Fetched` |
/// | Not-found (HTTP 404 or 410) | 404 | `Error` |
/// | Any other failure | 400 | `Error` |
///
/// Failed results carry no content and an empty content type.
pub fn into_fetched_data(
    mut resource: Resource,
    outcome: Result<FetchedResponse, FetchError>,
) -> FetchedData {
    match outcome {
        Ok(response) => {
            resource.status = ResourceStatus::Fetched;
            let mut data = FetchedData::new(
                response.content,
                response.content_type,
                response.status_code,
                resource,
            );
            data.headers = response.headers;
            if response.truncated {
                data.mark_truncated();
            }
            data
        }
        Err(error) => {
            tracing::warn!("Fetch failed for {}: {}", resource.url, error);
            FetchedData::failed(error.status_code(), resource)
        }
    }
}
