//! # metarepo-api
//!
//! HTTP access to the remote configuration-management server: an
//! authenticated JSON client plus the resilient paginated fetcher with
//! retry, backoff and per-collection failure policy.

pub mod client;
pub mod error;
pub mod fetcher;

pub use client::{resolve_collections, FetchedPage, MetadataClient, Pager};
pub use error::{ApiError, Result};
pub use fetcher::{FetchOptions, Fetcher, RetryPolicy, DEFAULT_PAGE_SIZE};
