//! Resilient, resumable retrieval of one collection, page by page.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use crate::client::{FetchedPage, MetadataClient};
use crate::error::{ApiError, Result};

pub const DEFAULT_PAGE_SIZE: u32 = 10_000;

/// Bounded-retry policy for transient fetch failures.
///
/// The delay before attempt `n + 1` is `n * backoff_unit`. Exhausting the
/// budget aborts the entire run: a systematically failing collection makes
/// the watermark advance unsafe.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff_unit: Duration::from_secs(2),
        }
    }
}

/// Fetch tuning shared across collections.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub page_size: u32,
    pub retry: RetryPolicy,
    /// Cooldown observed before each page request of a special collection,
    /// to avoid overloading the remote store.
    pub cooldown: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            retry: RetryPolicy::default(),
            cooldown: Duration::from_secs(2),
        }
    }
}

/// Paginated fetcher with retry, backoff and per-collection failure policy.
pub struct Fetcher {
    client: MetadataClient,
    options: FetchOptions,
}

impl Fetcher {
    pub fn new(client: MetadataClient) -> Self {
        Self {
            client,
            options: FetchOptions::default(),
        }
    }

    pub fn with_options(client: MetadataClient, options: FetchOptions) -> Self {
        Self { client, options }
    }

    /// Fetch one page, recovering per-collection failures and retrying
    /// transient ones with linearly increasing backoff.
    ///
    /// Unknown collections and authentication failures yield an empty page
    /// whose pager terminates the caller's loop; every other failure is
    /// retried up to the attempt budget and then surfaced as
    /// [`ApiError::RetryBudgetExhausted`].
    pub async fn fetch_page(
        &self,
        collection: &str,
        page: u32,
        since: Option<DateTime<Utc>>,
        special: bool,
    ) -> Result<FetchedPage> {
        let mut attempt = 1u32;

        loop {
            if special {
                tokio::time::sleep(self.options.cooldown).await;
            }

            let result = self
                .client
                .fetch_page(collection, page, self.options.page_size, since)
                .await;

            match result {
                Ok(fetched) => return Ok(fetched),
                Err(e) if e.is_not_found() => {
                    debug!(collection, "Collection not found on remote, skipping");
                    return Ok(FetchedPage::empty(page));
                }
                Err(e) if e.is_auth() => {
                    error!(collection, error = %e, "Authentication rejected for collection");
                    return Ok(FetchedPage::empty(page));
                }
                Err(e) if attempt < self.options.retry.max_attempts => {
                    let backoff = self.options.retry.backoff_unit * attempt;
                    warn!(
                        collection,
                        page,
                        attempt,
                        error = %e,
                        "Fetch failed, retrying after backoff"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(collection, page, attempt, error = %e, "Retry budget exhausted");
                    return Err(ApiError::RetryBudgetExhausted {
                        collection: collection.to_string(),
                        attempts: attempt,
                    });
                }
            }
        }
    }
}
