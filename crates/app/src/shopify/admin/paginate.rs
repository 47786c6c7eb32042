//! Cursor pagination over Admin API connections.

use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use futures::{Stream, TryStreamExt};
use tracing::instrument;

use crate::config::SyncConfig;
use crate::shopify::AdminShopifyError;

use super::AdminClient;
use super::queries::{ConnectionQuery, PageVariables};

/// Default node cap for [`Paginator::collect_all`].
pub const DEFAULT_COLLECT_LIMIT: usize = 1000;

/// Bounded retry with exponential backoff for transient Shopify failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each later one.
    pub base: Duration,
    /// Upper bound on any single delay, including `Retry-After`.
    pub max: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn from_config(config: &SyncConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base: config.retry_base,
            max: config.retry_max,
        }
    }

    /// Delay after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32, error: &AdminShopifyError) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let backoff = self.base.saturating_mul(1_u32 << exponent);
        let delay = match error {
            AdminShopifyError::RateLimited(secs) => backoff.max(Duration::from_secs(*secs)),
            _ => backoff,
        };
        delay.min(self.max)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// # Errors
    ///
    /// Returns the first non-transient error, or the last transient one once
    /// `max_attempts` is exhausted.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, AdminShopifyError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AdminShopifyError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.delay_for(attempt, &e);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Transient Shopify error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

/// One fetched page.
#[derive(Debug, Clone)]
pub struct Page<N> {
    pub nodes: Vec<N>,
    /// Cursor to resume after this page.
    pub end_cursor: Option<String>,
    /// Whether the stream will fetch another page.
    pub has_more: bool,
}

/// Walks a connection page by page.
#[derive(Clone)]
pub struct Paginator {
    client: AdminClient,
    page_size: i64,
    retry: RetryPolicy,
}

impl Paginator {
    #[must_use]
    pub fn new(client: &AdminClient, config: &SyncConfig) -> Self {
        Self {
            client: client.clone(),
            page_size: config.page_size,
            retry: RetryPolicy::from_config(config),
        }
    }

    /// Lazy stream of pages for `Q`.
    ///
    /// Starts after `start_after` when given. With a `limit`, the stream stops
    /// once that many nodes were yielded; the last page is truncated to fit.
    /// A page that claims more results but carries no cursor ends the stream.
    pub fn pages<Q: ConnectionQuery>(
        &self,
        filter: Q::Filter,
        start_after: Option<String>,
        limit: Option<usize>,
    ) -> impl Stream<Item = Result<Page<Q::Node>, AdminShopifyError>> + Send {
        async_stream::try_stream! {
            let mut after = start_after;
            let mut fetched = 0usize;
            let mut finished = limit == Some(0);

            while !finished {
                let variables = PageVariables {
                    first: self.page_size,
                    after: after.clone(),
                    filter: filter.clone(),
                };
                let data: Q::Data = self
                    .retry
                    .run(|| {
                        self.client
                            .execute(Q::QUERY, Q::OPERATION_NAME, variables.clone())
                    })
                    .await?;

                let connection = Q::connection(data);
                let page_info = connection.page_info.clone();
                let mut nodes = connection.into_nodes();

                let mut limit_reached = false;
                if let Some(limit) = limit {
                    let remaining = limit.saturating_sub(fetched);
                    if nodes.len() >= remaining {
                        nodes.truncate(remaining);
                        limit_reached = true;
                    }
                }
                fetched += nodes.len();

                let has_more =
                    page_info.has_next_page && page_info.end_cursor.is_some() && !limit_reached;
                if page_info.has_next_page && page_info.end_cursor.is_none() {
                    tracing::warn!(
                        operation = Q::OPERATION_NAME,
                        "Page reports more results without a cursor, stopping"
                    );
                }
                tracing::debug!(
                    operation = Q::OPERATION_NAME,
                    nodes = nodes.len(),
                    fetched,
                    has_more,
                    "Fetched page"
                );

                finished = !has_more;
                after.clone_from(&page_info.end_cursor);
                yield Page {
                    nodes,
                    end_cursor: page_info.end_cursor,
                    has_more,
                };
            }
        }
    }

    /// Count every node of `Q`.
    ///
    /// # Errors
    ///
    /// Returns the first page fetch that fails after retries.
    #[instrument(skip(self, filter), fields(operation = Q::OPERATION_NAME))]
    pub async fn count_all<Q: ConnectionQuery>(
        &self,
        filter: Q::Filter,
    ) -> Result<usize, AdminShopifyError> {
        let mut pages = pin!(self.pages::<Q>(filter, None, None));
        let mut total = 0;
        while let Some(page) = pages.try_next().await? {
            total += page.nodes.len();
        }
        Ok(total)
    }

    /// Collect at most `limit` nodes of `Q`, in connection order.
    ///
    /// # Errors
    ///
    /// Returns the first page fetch that fails after retries.
    #[instrument(skip(self, filter), fields(operation = Q::OPERATION_NAME))]
    pub async fn collect_all<Q: ConnectionQuery>(
        &self,
        filter: Q::Filter,
        limit: usize,
    ) -> Result<Vec<Q::Node>, AdminShopifyError> {
        let mut pages = pin!(self.pages::<Q>(filter, None, Some(limit)));
        let mut nodes = Vec::new();
        while let Some(page) = pages.try_next().await? {
            nodes.extend(page.nodes);
        }
        Ok(nodes)
    }
}
