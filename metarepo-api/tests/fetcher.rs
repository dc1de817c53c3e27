//! Fetcher behavior tests against a mock remote store.

use std::time::Duration;

use metarepo_api::{
    resolve_collections, ApiError, FetchOptions, Fetcher, MetadataClient, RetryPolicy,
};
use serde_json::json;
use wiremock::matchers::{basic_auth, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> MetadataClient {
    MetadataClient::new(server.uri(), "admin", "secret").unwrap()
}

/// Zero delays so retry paths run instantly under test.
fn fast_fetcher(server: &MockServer) -> Fetcher {
    Fetcher::with_options(
        client(server),
        FetchOptions {
            page_size: 50,
            retry: RetryPolicy {
                max_attempts: 10,
                backoff_unit: Duration::ZERO,
            },
            cooldown: Duration::ZERO,
        },
    )
}

fn page_body(ids: &[&str], page: u32, page_count: u32) -> serde_json::Value {
    json!({
        "records": ids.iter().map(|id| json!({ "id": id })).collect::<Vec<_>>(),
        "pager": { "page": page, "pageCount": page_count }
    })
}

mod paging {
    use super::*;

    #[tokio::test]
    async fn first_run_sends_no_update_filter() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/units"))
            .and(query_param("page", "1"))
            .and(query_param("pageSize", "50"))
            .and(query_param_is_missing("updatedAfter"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&["a"], 1, 1)))
            .expect(1)
            .mount(&server)
            .await;

        let fetched = fast_fetcher(&server)
            .fetch_page("units", 1, None, false)
            .await
            .unwrap();

        assert_eq!(fetched.records.len(), 1);
        assert_eq!(fetched.pager.page_count, 1);
    }

    #[tokio::test]
    async fn watermark_is_passed_as_update_filter() {
        let server = MockServer::start().await;
        let since = "2024-01-01T00:00:00Z".parse().unwrap();

        Mock::given(method("GET"))
            .and(path("/api/units"))
            .and(query_param("updatedAfter", "2024-01-01T00:00:00+00:00"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[], 1, 1)))
            .expect(1)
            .mount(&server)
            .await;

        let fetched = fast_fetcher(&server)
            .fetch_page("units", 1, Some(since), false)
            .await
            .unwrap();

        assert!(fetched.records.is_empty());
    }

    #[tokio::test]
    async fn pager_reports_multiple_pages() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/units"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&["b"], 2, 3)))
            .mount(&server)
            .await;

        let fetched = fast_fetcher(&server)
            .fetch_page("units", 2, None, false)
            .await
            .unwrap();

        assert_eq!(fetched.pager.page, 2);
        assert_eq!(fetched.pager.page_count, 3);
    }
}

mod failure_policy {
    use super::*;

    #[tokio::test]
    async fn unknown_collection_recovers_as_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/renamedAway"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let fetched = fast_fetcher(&server)
            .fetch_page("renamedAway", 1, None, false)
            .await
            .unwrap();

        assert!(fetched.records.is_empty());
        assert_eq!(fetched.pager.page, 1);
        assert_eq!(fetched.pager.page_count, 1);
    }

    #[tokio::test]
    async fn auth_failure_recovers_as_empty_without_retry() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/units"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let fetched = fast_fetcher(&server)
            .fetch_page("units", 1, None, false)
            .await
            .unwrap();

        assert!(fetched.records.is_empty());
    }

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/units"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(9)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/units"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&["a"], 1, 1)))
            .expect(1)
            .mount(&server)
            .await;

        let fetched = fast_fetcher(&server)
            .fetch_page("units", 1, None, false)
            .await
            .unwrap();

        assert_eq!(fetched.records.len(), 1);
    }

    #[tokio::test]
    async fn exhausted_retry_budget_aborts() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/units"))
            .respond_with(ResponseTemplate::new(500))
            .expect(10)
            .mount(&server)
            .await;

        let error = fast_fetcher(&server)
            .fetch_page("units", 1, None, false)
            .await
            .unwrap_err();

        match error {
            ApiError::RetryBudgetExhausted {
                collection,
                attempts,
            } => {
                assert_eq!(collection, "units");
                assert_eq!(attempts, 10);
            }
            other => panic!("Expected RetryBudgetExhausted, got {other}"),
        }
    }
}

mod collections {
    use super::*;

    #[tokio::test]
    async fn server_collections_minus_exclusions() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/collections"))
            .and(basic_auth("admin", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "collections": ["units", "dashboards", "reports"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resolved = resolve_collections(
            &client(&server),
            None,
            &["dashboards".to_string()],
        )
        .await
        .unwrap();

        assert_eq!(resolved, ["units", "reports"]);
    }

    #[tokio::test]
    async fn inclusion_list_skips_server_listing() {
        let server = MockServer::start().await;

        let resolved = resolve_collections(
            &client(&server),
            Some(&["units".to_string(), "reports".to_string()]),
            &["reports".to_string()],
        )
        .await
        .unwrap();

        assert_eq!(resolved, ["units"]);
    }
}
