//! Accounts API client.
//!
//! Performs network IO against the `/users` endpoints, filtered to one user
//! subtype. Functions return typed results; mapping them into published state
//! is the job of [`AccountsSync`](crate::AccountsSync).

use log::debug;
use thiserror::Error;
use ustr::Ustr;

use crate::BusinessConfig;
use crate::accounts::model::{
    Account, AccountDraft, AccountId, AccountStats, ListAccountsResponse, StatsResponse,
    TaggedDraft,
};
use crate::http::{HttpClient, HttpError, RequestBuilder, Response};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountsApiError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Transport(String),
    /// The server answered outside 2xx.
    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },
    /// The body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("failed to encode request: {0}")]
    Encode(String),
}

impl From<HttpError> for AccountsApiError {
    fn from(err: HttpError) -> Self {
        Self::Transport(err.message)
    }
}

impl AccountsApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, AccountsApiError>;

/// Extra list filter merged into the subtype filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountFilter {
    search: Option<String>,
}

impl AccountFilter {
    /// Every account of the configured subtype.
    pub fn all() -> Self {
        Self::default()
    }

    /// Text search. A blank term is the same as [`AccountFilter::all`].
    pub fn search(term: &str) -> Self {
        let term = term.trim();
        Self {
            search: (!term.is_empty()).then(|| term.to_owned()),
        }
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct AccountsApi {
    http: HttpClient,
    user_type: Ustr,
}

impl AccountsApi {
    pub fn new(config: &BusinessConfig) -> ApiResult<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
            user_type: config.user_type(),
        })
    }

    pub fn user_type(&self) -> Ustr {
        self.user_type
    }

    /// `GET /users?user_type=<subtype>[&search=<term>]` request, unsent.
    pub(crate) fn list_request(&self, filter: &AccountFilter) -> RequestBuilder {
        let request = self
            .http
            .get("users")
            .query("user_type", self.user_type.as_str());
        match filter.search_term() {
            Some(term) => request.query("search", term),
            None => request,
        }
    }

    /// `GET /users/stats?detailed=true` request, unsent.
    pub(crate) fn stats_request(&self) -> RequestBuilder {
        self.http.get("users/stats").query("detailed", "true")
    }

    /// GET `/users`
    ///
    /// Accepts a bare list or a `users` / `results` envelope; order is kept.
    pub async fn list(&self, filter: &AccountFilter) -> ApiResult<Vec<Account>> {
        let response = expect_success(self.list_request(filter).send().await?)?;

        let list: ListAccountsResponse = response.json().map_err(|_| {
            AccountsApiError::Decode(
                "account list: expected a list or a `users` / `results` envelope".to_owned(),
            )
        })?;
        let payloads = list
            .into_payloads()
            .map_err(|e| AccountsApiError::Decode(format!("account list: {e}")))?;

        let accounts: Vec<Account> = payloads
            .into_iter()
            .map(|payload| payload.into_account(self.user_type))
            .collect();
        debug!("Listed {} {} accounts", accounts.len(), self.user_type);
        Ok(accounts)
    }

    /// GET `/users/stats?detailed=true`
    ///
    /// `Ok(None)` when the server answered but had no breakdown for this
    /// subtype.
    pub async fn stats(&self) -> ApiResult<Option<AccountStats>> {
        let response = expect_success(self.stats_request().send().await?)?;

        let stats: StatsResponse = response
            .json()
            .map_err(|e| AccountsApiError::Decode(format!("statistics: {e}")))?;
        Ok(stats.breakdown(&self.user_type))
    }

    /// POST `/users`
    /// Body: draft fields plus `user_type`.
    pub async fn create(&self, draft: &AccountDraft) -> ApiResult<()> {
        let request = self.http.post("users").json(&self.tag(draft));
        send_expecting_success(request).await
    }

    /// PUT `/users/{id}`
    /// Body: draft fields plus `user_type`; replaces the whole record.
    pub async fn update(&self, id: AccountId, draft: &AccountDraft) -> ApiResult<()> {
        let request = self.http.put(&format!("users/{id}")).json(&self.tag(draft));
        send_expecting_success(request).await
    }

    /// DELETE `/users/{id}`
    pub async fn delete(&self, id: AccountId) -> ApiResult<()> {
        expect_success(self.http.delete(&format!("users/{id}")).send().await?)?;
        Ok(())
    }

    /// POST `/users/{id}/suspend`
    pub async fn suspend(&self, id: AccountId) -> ApiResult<()> {
        expect_success(self.http.post(&format!("users/{id}/suspend")).send().await?)?;
        Ok(())
    }

    /// POST `/users/{id}/activate`
    pub async fn activate(&self, id: AccountId) -> ApiResult<()> {
        expect_success(self.http.post(&format!("users/{id}/activate")).send().await?)?;
        Ok(())
    }

    fn tag<'a>(&'a self, draft: &'a AccountDraft) -> TaggedDraft<'a> {
        TaggedDraft {
            draft,
            user_type: self.user_type.as_str(),
        }
    }
}

async fn send_expecting_success(
    request: Result<RequestBuilder, serde_json::Error>,
) -> ApiResult<()> {
    let request = request.map_err(|e| AccountsApiError::Encode(e.to_string()))?;
    expect_success(request.send().await?)?;
    Ok(())
}

fn expect_success(response: Response) -> ApiResult<Response> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(AccountsApiError::Status {
            status: response.status,
            body: response.body_excerpt(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TestContext, account_json};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    #[test]
    fn blank_search_is_no_filter() {
        assert_eq!(AccountFilter::search("   "), AccountFilter::all());
        assert_eq!(AccountFilter::search(" bob ").search_term(), Some("bob"));
    }

    #[tokio::test]
    async fn list_sends_subtype_and_search_filters() {
        let ctx = TestContext::new().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .and(query_param("user_type", "technical"))
            .and(query_param("search", "ann"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"users": [account_json(3, "Ann", true)]})),
            )
            .expect(1)
            .mount(&ctx.mock_server)
            .await;

        let accounts = ctx
            .api()
            .list(&AccountFilter::search("ann"))
            .await
            .unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].name, "Ann");
    }

    #[tokio::test]
    async fn list_maps_status_errors() {
        let ctx = TestContext::new().await;
        ctx.mock_list_error(503, "maintenance").await;

        let err = ctx.api().list(&AccountFilter::all()).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert!(err.to_string().contains("maintenance"));
    }

    #[tokio::test]
    async fn list_rejects_unexpected_shape() {
        let ctx = TestContext::new().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&ctx.mock_server)
            .await;

        let err = ctx.api().list(&AccountFilter::all()).await.unwrap_err();
        assert!(matches!(err, AccountsApiError::Decode(_)));
        assert!(err.to_string().contains("envelope"));
    }

    #[tokio::test]
    async fn list_tolerates_null_active_flag() {
        let ctx = TestContext::new().await;
        ctx.mock_list(json!([
            account_json(1, "A", true),
            {"id": 2, "name": "B", "email": "b@x.com", "is_active": null}
        ]))
        .await;

        let accounts = ctx.api().list(&AccountFilter::all()).await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert!(accounts[0].is_active());
        assert!(!accounts[1].is_active());
    }

    #[tokio::test]
    async fn list_names_the_bad_record() {
        let ctx = TestContext::new().await;
        ctx.mock_list(json!([account_json(1, "A", true), {"name": "no id"}]))
            .await;

        let err = ctx.api().list(&AccountFilter::all()).await.unwrap_err();
        assert!(matches!(err, AccountsApiError::Decode(_)));
        assert!(err.to_string().contains("record 1"), "{err}");
    }

    #[tokio::test]
    async fn transport_failure_is_reported() {
        let api = AccountsApi::new(&BusinessConfig::new("http://127.0.0.1:9")).unwrap();

        let err = api.list(&AccountFilter::all()).await.unwrap_err();
        assert!(matches!(err, AccountsApiError::Transport(_)));
    }

    #[tokio::test]
    async fn update_puts_tagged_body() {
        let ctx = TestContext::new().await;
        Mock::given(method("PUT"))
            .and(path("/users/7"))
            .and(body_json(
                json!({"name": "Zed", "email": "z@x.com", "user_type": "technical"}),
            ))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&ctx.mock_server)
            .await;

        ctx.api()
            .update(AccountId(7), &AccountDraft::new("Zed", "z@x.com"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn stats_without_breakdown_is_none() {
        let ctx = TestContext::new().await;
        ctx.mock_stats(json!({"total": 40})).await;

        assert_eq!(ctx.api().stats().await.unwrap(), None);
    }
}
