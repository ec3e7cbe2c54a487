//! Cursor-based pagination over Graph API result sets.
//!
//! The platform returns long collections in pages carrying opaque cursors:
//! `{"data": [...], "paging": {"cursors": {"before": "...", "after": "..."}}}`.
//! [`paginate`] turns a page-fetching function into a lazy stream of page
//! batches that walks the cursor chain until exhaustion or a caller-supplied
//! item limit.

use std::future::Future;

use futures::stream::Stream;
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// One page of a paginated response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paged<T> {
    /// Items in this page
    pub data: Vec<T>,

    /// Pagination metadata; absent on the final page of many endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paging: Option<Paging>,
}

/// Pagination metadata returned alongside each page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paging {
    /// Opaque cursor pair
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursors: Option<Cursors>,

    /// URL of the next page, when the platform supplies one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,

    /// URL of the previous page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
}

/// Opaque cursor pair bounding one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cursors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

impl<T> Paged<T> {
    /// Cursor for the page after this one, when present.
    pub fn after_cursor(&self) -> Option<&str> {
        self.paging.as_ref()?.cursors.as_ref()?.after.as_deref()
    }

    /// Check if this is the last page of the walk.
    pub fn is_last_page(&self) -> bool {
        self.after_cursor().is_none()
    }
}

/// Lazily walk a cursor-paginated collection, yielding one `Vec<T>` per page.
///
/// `fetch_page` is called with `None` first, then with each page's `after`
/// cursor. The stream ends when a page comes back empty, when no `after`
/// cursor is present, or when the running item total reaches `limit` — the
/// page that crosses the limit is still yielded in full, but no page beyond
/// it is fetched.
///
/// Page N+1 is never fetched before page N's cursor is known, and a fresh
/// call starts a fresh walk from the beginning — streams are not restartable
/// mid-walk.
///
/// # Examples
///
/// ```rust,no_run
/// use futures::TryStreamExt;
/// use meta_graph_core::pagination::{paginate, Paged};
///
/// # async fn example(
/// #     fetch: impl FnMut(Option<String>) -> std::pin::Pin<Box<dyn std::future::Future<
/// #         Output = Result<Paged<serde_json::Value>, meta_graph_core::GraphError>>>>,
/// # ) -> Result<(), meta_graph_core::GraphError> {
/// let stream = paginate(fetch, Some(100));
/// futures::pin_mut!(stream);
/// while let Some(page) = stream.try_next().await? {
///     println!("fetched {} items", page.len());
/// }
/// # Ok(())
/// # }
/// ```
pub fn paginate<T, F, Fut>(
    fetch_page: F,
    limit: Option<usize>,
) -> impl Stream<Item = Result<Vec<T>, GraphError>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Paged<T>, GraphError>>,
{
    struct Walk<F> {
        fetch: F,
        cursor: Option<String>,
        fetched: usize,
        done: bool,
    }

    futures::stream::try_unfold(
        Walk {
            fetch: fetch_page,
            cursor: None,
            fetched: 0,
            done: false,
        },
        move |mut walk| async move {
            if walk.done {
                return Ok(None);
            }

            let page = (walk.fetch)(walk.cursor.take()).await?;
            if page.data.is_empty() {
                return Ok(None);
            }

            walk.fetched += page.data.len();
            let after = page.after_cursor().map(str::to_string);
            let limit_reached = limit.is_some_and(|limit| walk.fetched >= limit);
            walk.done = limit_reached || after.is_none();
            walk.cursor = after;

            Ok(Some((page.data, walk)))
        },
    )
}

/// Drain a paginated collection into a single `Vec`.
///
/// Convenience over [`paginate`] for callers that want every item up front.
/// The final page is kept whole, so the result may exceed `limit` by up to
/// one page.
pub async fn drain<T, F, Fut>(fetch_page: F, limit: Option<usize>) -> Result<Vec<T>, GraphError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Paged<T>, GraphError>>,
{
    let stream = paginate(fetch_page, limit);
    futures::pin_mut!(stream);

    let mut items = Vec::new();
    while let Some(page) = stream.try_next().await? {
        items.extend(page);
    }
    Ok(items)
}

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod tests;
