//! Lazy cursor pagination over list endpoints.
//!
//! A [`Pager`] issues its first request on the first pull and then follows
//! the server's "next" link page by page. It never computes offsets, never
//! restarts, and stops for good after the last page or the first failure.
//!
//! Records come back in server order. With `sort=updated_at` and
//! `order=desc`, a record updated during iteration can move behind the
//! cursor and be missed; that is how the service's cursors behave and the
//! pager does not try to hide it.

use std::collections::VecDeque;

use billow_core::{ApiRequest, HttpTransport, Page};
use futures_util::Stream;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{Error, Executor, HyperClient, Result};

#[derive(Debug)]
enum PagerState {
    /// The next page is fetched with this request.
    Pending(ApiRequest),
    /// The last page arrived but its next link is unusable; the error is
    /// returned by the following pull.
    Broken(Error),
    /// The last page was fetched.
    Exhausted,
    /// A page fetch failed; no more requests are made.
    Failed,
}

/// Lazy, single-pass iterator over the records of a list endpoint.
///
/// # Example
///
/// ```no_run
/// # async fn example(client: billow::BillingClient) -> billow::Result<()> {
/// use billow_core::{ListParams, Order, SortField};
///
/// let params: ListParams = ListParams::filtered()
///     .limit(200)
///     .sort(SortField::UpdatedAt)
///     .order(Order::Asc)
///     .into();
///
/// let mut accounts = client.list_accounts::<serde_json::Value>(&params)?;
/// while let Some(account) = accounts.next().await? {
///     println!("{}", account["code"]);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Pager<T = serde_json::Value, C = HyperClient> {
    executor: Executor<C>,
    state: PagerState,
    buffer: VecDeque<T>,
    pages_fetched: u32,
}

impl<T, C> Pager<T, C>
where
    T: DeserializeOwned,
    C: HttpTransport,
{
    /// Create a pager; nothing is sent until the first pull.
    #[must_use]
    pub fn new(executor: Executor<C>, initial: ApiRequest) -> Self {
        Self {
            executor,
            state: PagerState::Pending(initial),
            buffer: VecDeque::new(),
            pages_fetched: 0,
        }
    }

    /// Returns `true` once the last page was fetched.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self.state, PagerState::Exhausted)
    }

    /// Returns `true` if a page fetch failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self.state, PagerState::Failed)
    }

    /// Pages fetched so far.
    #[must_use]
    pub const fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Fetch the next page.
    ///
    /// Records already buffered by [`Pager::next`] are returned first.
    /// Returns `Ok(None)` without sending anything once the pager is
    /// exhausted or failed.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the pager is then failed for good. Records
    /// returned before stay valid. A page whose next link cannot be parsed
    /// is still returned; the parse error comes with the following call.
    pub async fn advance(&mut self) -> Result<Option<Vec<T>>> {
        if !self.buffer.is_empty() {
            return Ok(Some(self.buffer.drain(..).collect()));
        }

        match std::mem::replace(&mut self.state, PagerState::Failed) {
            PagerState::Broken(error) => {
                warn!(page = self.pages_fetched + 1, error = %error, "unusable next link");
                return Err(error);
            }
            state => self.state = state,
        }

        let PagerState::Pending(request) = &self.state else {
            return Ok(None);
        };
        let request = request.clone();

        match self.fetch(&request).await {
            Ok(records) => Ok(Some(records)),
            Err(error) => {
                warn!(page = self.pages_fetched + 1, error = %error, "page fetch failed");
                self.state = PagerState::Failed;
                Err(error)
            }
        }
    }

    async fn fetch(&mut self, request: &ApiRequest) -> Result<Vec<T>> {
        let page: Page<T> = self.executor.execute_page(request).await?;
        self.pages_fetched += 1;

        // The page is delivered even when its link is bad.
        self.state = match &page.next {
            Some(link) => match request.follow(link, self.executor.base_url()) {
                Ok(next) => PagerState::Pending(next),
                Err(error) => PagerState::Broken(error),
            },
            None => PagerState::Exhausted,
        };

        debug!(
            page = self.pages_fetched,
            records = page.data.len(),
            last = page.is_last(),
            "page fetched"
        );
        Ok(page.data)
    }

    /// Pull the next record, fetching pages as needed.
    ///
    /// # Errors
    ///
    /// Returns the error of a failed page fetch.
    pub async fn next(&mut self) -> Result<Option<T>> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Ok(Some(record));
            }
            match self.advance().await? {
                Some(records) => self.buffer.extend(records),
                None => return Ok(None),
            }
        }
    }

    /// Fetch every remaining page.
    ///
    /// # Errors
    ///
    /// Returns the first page fetch error; records gathered so far are lost.
    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut records = Vec::new();
        while let Some(page) = self.advance().await? {
            records.extend(page);
        }
        Ok(records)
    }

    /// Turn the pager into a stream of records.
    ///
    /// A fetch error is yielded once, then the stream ends.
    pub fn into_stream(self) -> impl Stream<Item = Result<T>> {
        futures_util::stream::unfold(self, |mut pager| async move {
            match pager.next().await {
                Ok(Some(record)) => Some((Ok(record), pager)),
                Ok(None) => None,
                Err(error) => Some((Err(error), pager)),
            }
        })
    }
}
