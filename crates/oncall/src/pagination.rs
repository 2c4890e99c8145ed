//! Cursor-paged listings.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upper bound on how much of a page's reported `count` is pre-allocated.
const MAX_PREALLOCATE: usize = 4096;

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Total number of items across all pages.
    #[serde(default)]
    pub count: usize,
    /// Link to the next page. Absent or empty on the last page.
    #[serde(default)]
    pub next: Option<String>,
    /// Link to the previous page. Absent or empty on the first page.
    #[serde(default)]
    pub previous: Option<String>,
    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Whether the server advertised a further page.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.next.as_deref().is_some_and(|next| !next.is_empty())
    }
}

/// Walk every page of a listing and collect the items in order.
///
/// `fetch` is called with page index `0, 1, 2, ...` until a page comes back
/// without a `next` link. Pages are fetched strictly one after another. The
/// first page's `count` is only used as a capacity hint.
///
/// # Errors
///
/// The first failing fetch aborts the walk and its error is returned; items
/// gathered from earlier pages are dropped.
pub async fn paginate<'a, T, F, E, Fetch, Fut>(mut fetch: Fetch, filter: &'a F) -> Result<Vec<T>, E>
where
    F: ?Sized,
    Fetch: FnMut(u32, &'a F) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let mut page_index = 0;
    let mut page = fetch(page_index, filter).await?;

    let mut items = Vec::with_capacity(page.count.min(MAX_PREALLOCATE));
    loop {
        let more = page.has_next();
        debug!(
            page = page_index,
            items = page.results.len(),
            more,
            "Fetched page"
        );
        items.append(&mut page.results);
        if !more {
            break;
        }

        page_index += 1;
        page = fetch(page_index, filter).await?;
    }

    Ok(items)
}
