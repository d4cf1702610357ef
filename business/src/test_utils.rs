//! Test utilities for exercising the accounts layer against a mock server.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{TestContext, account_json};
//!
//! #[tokio::test]
//! async fn test_refresh() {
//!     let ctx = TestContext::new().await;
//!     ctx.mock_list(serde_json::json!([account_json(1, "A", true)])).await;
//!     ctx.mock_technical_stats(1, 1).await;
//!
//!     let mut sync = ctx.sync();
//!     sync.refresh().await.unwrap();
//!     assert_eq!(sync.state().accounts().len(), 1);
//! }
//! ```

#![cfg(test)]

use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, Request, ResponseTemplate,
    matchers::{method, path, query_param},
};

use crate::{AccountsApi, AccountsSync, BusinessConfig};

/// A mock server plus a config pointing at it.
pub struct TestContext {
    pub mock_server: MockServer,
    pub config: BusinessConfig,
}

impl TestContext {
    pub async fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let mock_server = MockServer::start().await;
        let config = BusinessConfig::new(mock_server.uri());
        Self {
            mock_server,
            config,
        }
    }

    pub fn api(&self) -> AccountsApi {
        AccountsApi::new(&self.config).expect("client should build")
    }

    pub fn sync(&self) -> AccountsSync {
        AccountsSync::new(self.api())
    }

    // =========================================================================
    // Mock endpoint helpers
    // =========================================================================

    /// `GET /users?user_type=technical` answers with `body` (any search term).
    pub async fn mock_list(&self, body: Value) {
        Mock::given(method("GET"))
            .and(path("/users"))
            .and(query_param("user_type", "technical"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.mock_server)
            .await;
    }

    pub async fn mock_list_error(&self, status: u16, error: &str) {
        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "error": error })))
            .mount(&self.mock_server)
            .await;
    }

    pub async fn mock_stats(&self, body: Value) {
        Mock::given(method("GET"))
            .and(path("/users/stats"))
            .and(query_param("detailed", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.mock_server)
            .await;
    }

    /// Statistics endpoint with a `technical` breakdown.
    pub async fn mock_technical_stats(&self, total: u64, active: u64) {
        self.mock_stats(json!({
            "by_user_type": {
                "technical": {
                    "total": total,
                    "new_today": 0,
                    "active": active,
                    "churn_rate": "0%"
                }
            }
        }))
        .await;
    }

    pub async fn mock_stats_error(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/users/stats"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.mock_server)
            .await;
    }

    /// Any write endpoint answering with a bare status.
    pub async fn mock_mutation(&self, http_method: &str, endpoint: &str, status: u16) {
        Mock::given(method(http_method))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.mock_server)
            .await;
    }

    /// Number of `GET /users` calls received so far.
    pub async fn list_request_count(&self) -> usize {
        self.list_requests().await.len()
    }

    /// Search terms of every `GET /users` call, `None` for unfiltered ones.
    pub async fn list_search_terms(&self) -> Vec<Option<String>> {
        self.list_requests()
            .await
            .iter()
            .map(|request| {
                request
                    .url
                    .query_pairs()
                    .find(|(key, _)| key == "search")
                    .map(|(_, value)| value.into_owned())
            })
            .collect()
    }

    async fn list_requests(&self) -> Vec<Request> {
        self.mock_server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.method.as_str() == "GET" && request.url.path() == "/users")
            .collect()
    }
}

/// One account as the server would send it.
pub fn account_json(id: u64, name: &str, is_active: bool) -> Value {
    json!({
        "id": id,
        "name": name,
        "email": format!("{}@x.com", name.to_lowercase()),
        "is_active": is_active,
        "last_login": null,
        "user_type": "technical"
    })
}
