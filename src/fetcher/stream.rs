use crate::fetcher::executor::Fetcher;
use crate::model::{FetchedData, Resource};
use futures::stream::{self, Stream, StreamExt};

/// Fetches a stream of resources, yielding one result per resource in order
///
/// Each resource is fetched only when the next result is polled, and a
/// failing resource yields an error result instead of ending the stream.
/// Consuming the output consumes the input; the stream cannot be restarted.
///
/// # Example
///
/// ```no_run
/// use futures::StreamExt;
/// use sumi_fetcher::config::FetcherConfig;
/// use sumi_fetcher::{fetch_stream, Fetcher, Resource};
///
/// # async fn run() -> sumi_fetcher::Result<()> {
/// let fetcher = Fetcher::new(&FetcherConfig::default())?;
/// let resources = futures::stream::iter(vec![Resource::new("https://example.com/")]);
/// let results: Vec<_> = fetch_stream(&fetcher, resources).collect().await;
/// assert_eq!(results.len(), 1);
/// # Ok(())
/// # }
/// ```
pub fn fetch_stream<'a, S>(
    fetcher: &'a Fetcher,
    resources: S,
) -> impl Stream<Item = FetchedData> + 'a
where
    S: Stream<Item = Resource> + 'a,
{
    resources.then(move |resource| fetcher.fetch(resource))
}

/// Fetches resources from an iterator, see [`fetch_stream`]
pub fn fetch_all<'a, I>(
    fetcher: &'a Fetcher,
    resources: I,
) -> impl Stream<Item = FetchedData> + 'a
where
    I: IntoIterator<Item = Resource>,
    I::IntoIter: 'a,
{
    fetch_stream(fetcher, stream::iter(resources))
}
