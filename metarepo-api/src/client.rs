//! Authenticated JSON client for the remote metadata store.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, Result};

/// Page metadata returned alongside every record page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pager {
    pub page: u32,
    pub page_count: u32,
}

/// One page of raw records plus its pager. Records stay untyped here; the
/// core projects the fields it needs and the rest goes to disk verbatim.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchedPage {
    #[serde(default)]
    pub records: Vec<Value>,
    pub pager: Pager,
}

impl FetchedPage {
    /// The empty page used when a collection is recovered as absent; its
    /// pager terminates the caller's page loop immediately.
    pub fn empty(page: u32) -> Self {
        Self {
            records: Vec::new(),
            pager: Pager {
                page,
                page_count: page,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct CollectionList {
    collections: Vec<String>,
}

/// HTTP client carrying endpoint and basic-auth credentials.
///
/// All calls are read-only against the remote store, so retrying any of them
/// is safe.
#[derive(Clone)]
pub struct MetadataClient {
    base_url: String,
    username: String,
    password: String,
    client: Client,
}

impl MetadataClient {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent(concat!("metarepo/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            client,
        })
    }

    /// List every collection the server exposes.
    pub async fn list_collections(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/collections", self.base_url);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, message });
        }

        let list: CollectionList = response.json().await?;
        Ok(list.collections)
    }

    /// Fetch one page of one collection, optionally restricted to records
    /// updated strictly after `since`.
    pub async fn fetch_page(
        &self,
        collection: &str,
        page: u32,
        page_size: u32,
        since: Option<DateTime<Utc>>,
    ) -> Result<FetchedPage> {
        let url = format!("{}/api/{}", self.base_url, collection);
        let mut request = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .query(&[
                ("page", page.to_string()),
                ("pageSize", page_size.to_string()),
            ]);

        if let Some(since) = since {
            request = request.query(&[("updatedAfter", since.to_rfc3339())]);
        }

        debug!(collection, page, "Requesting page");
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, message });
        }

        Ok(response.json().await?)
    }
}

/// Resolve the collections to mirror: the configured inclusion list when
/// present, otherwise everything the server advertises, minus exclusions,
/// in order.
pub async fn resolve_collections(
    client: &MetadataClient,
    inclusions: Option<&[String]>,
    exclusions: &[String],
) -> Result<Vec<String>> {
    let base = match inclusions {
        Some(names) => names.to_vec(),
        None => client.list_collections().await?,
    };

    Ok(base
        .into_iter()
        .filter(|name| !exclusions.contains(name))
        .collect())
}
