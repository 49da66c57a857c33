//! Lazy pagination over list endpoints of GitHub REST API.

use futures::{Stream, TryStreamExt as _, stream};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    client::GitHubClient,
    error::{Error, Result},
};

/// The page size requested from list endpoints. GitHub caps it at 100.
pub const PER_PAGE: u64 = 100;

/// A page of a list endpoint.
pub trait Page: DeserializeOwned {
    /// The entries listed.
    type Item;

    /// The number of entries across all pages.
    fn total_count(&self) -> u64;

    /// Consumes the page into its entries.
    fn into_items(self) -> Vec<Self::Item>;
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    page: u64,
    seen: u64,
    done: bool,
}

/// Streams every entry of a list endpoint in API order, requesting the next page only once the
/// previous one has been consumed.
///
/// The stream ends on an empty or short page, or once `total_count` entries have been yielded.
/// Dropping it early skips the remaining requests.
pub fn paginate<'a, P>(
    client: &'a GitHubClient,
    url: &'a str,
    query: &'a [(&'a str, String)],
    per_page: u64,
) -> impl Stream<Item = Result<P::Item>> + 'a
where
    P: Page + 'a,
    P::Item: 'a,
{
    let cursor = Cursor {
        page: 1,
        seen: 0,
        done: false,
    };

    stream::try_unfold(cursor, move |cursor| {
        fetch_page::<P>(client, url, query, per_page, cursor)
    })
    .map_ok(|items| stream::iter(items.into_iter().map(Ok::<_, Error>)))
    .try_flatten()
}

async fn fetch_page<P>(
    client: &GitHubClient,
    url: &str,
    query: &[(&str, String)],
    per_page: u64,
    cursor: Cursor,
) -> Result<Option<(Vec<P::Item>, Cursor)>>
where
    P: Page,
{
    if cursor.done {
        return Ok(None);
    }

    let mut page_query = query.to_vec();
    page_query.push(("per_page", per_page.to_string()));
    page_query.push(("page", cursor.page.to_string()));

    debug!("fetching page {} of {url}…", cursor.page);
    let page: P = client.get_json(url, &page_query).await?;
    let total_count = page.total_count();
    let items = page.into_items();
    if items.is_empty() {
        return Ok(None);
    }

    let fetched = items.len() as u64;
    let seen = cursor.seen + fetched;
    debug!("fetched {fetched} entries ({seen} / {total_count}) from {url}");

    let next = Cursor {
        page: cursor.page + 1,
        seen,
        done: fetched < per_page || seen >= total_count,
    };
    Ok(Some((items, next)))
}
