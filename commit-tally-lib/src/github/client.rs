//! GitHub GraphQL API client
//!
//! Issues one GraphQL request per call and classifies every failure into a [`RemoteError`].
//! Retrying, pacing and pagination are left to the crawl.

use super::queries::{
    BRANCHES_QUERY, BranchesData, COMMITS_QUERY, CommitsData, DEFAULT_BRANCH_QUERY, DefaultBranchData, REPOSITORIES_QUERY,
    RepositoriesData,
};
use crate::crawl::{CommitNode, Page, Remote, RemoteError};
use chrono::{DateTime, Utc};
use core::time::Duration;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

const LOG_TARGET: &str = "    github";

/// The public GitHub GraphQL endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.github.com/graphql";

/// Delay assumed when GitHub answers 429 without saying how long to wait.
const DEFAULT_TOO_MANY_REQUESTS_DELAY: Duration = Duration::from_secs(5);

/// Rate limit information from response headers
#[derive(Debug, Clone, Copy)]
pub struct RateLimitInfo {
    pub remaining: usize,
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// GitHub GraphQL client, authenticated with a personal access token.
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    endpoint: String,
}

impl Client {
    /// Create a new client sending requests to `endpoint`.
    pub fn new(token: &str, endpoint: impl Into<String>, timeout: Duration) -> crate::Result<Self> {
        use reqwest::header::{AUTHORIZATION, HeaderValue};

        let mut auth_val = HeaderValue::from_str(&format!("Bearer {token}"))?;
        auth_val.set_sensitive(true);

        let mut headers = HeaderMap::new();
        let _ = headers.insert(AUTHORIZATION, auth_val);

        let client = reqwest::Client::builder()
            .user_agent("commit-tally")
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Get the endpoint for this client
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run a GraphQL query and decode its `data` member into `T`.
    async fn execute<T: DeserializeOwned>(&self, query: &str, variables: serde_json::Value) -> Result<T, RemoteError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| RemoteError::transient(format!("request to {} failed: {e}", self.endpoint)))?;

        let status = resp.status();
        let rate_limit = extract_rate_limit_from_headers(resp.headers());

        if !status.is_success() {
            let headers = resp.headers().clone();
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, &headers, &body));
        }

        if let Some(info) = rate_limit {
            log::trace!(target: LOG_TARGET, "{} requests left until {}", info.remaining, info.reset_at);
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| RemoteError::transient(format!("could not read response body: {e}")))?;

        let response: GraphQlResponse = serde_json::from_slice(&body)
            .map_err(|e| RemoteError::transient(format!("response is not valid JSON: {e}")))?;

        classify_response::<T>(response, rate_limit)
    }
}

/// Classify a non-success HTTP status.
fn classify_status(status: StatusCode, headers: &HeaderMap, body: &str) -> RemoteError {
    let message = error_message(status, body);

    match status {
        StatusCode::UNAUTHORIZED => RemoteError::Unauthorized { message },

        StatusCode::TOO_MANY_REQUESTS => RemoteError::Transient {
            message,
            retry_after: Some(parse_retry_after(headers).unwrap_or(DEFAULT_TOO_MANY_REQUESTS_DELAY)),
        },

        StatusCode::FORBIDDEN => {
            // secondary rate limit
            if let Some(delay) = parse_retry_after(headers) {
                return RemoteError::Transient {
                    message,
                    retry_after: Some(delay),
                };
            }

            match extract_rate_limit_from_headers(headers) {
                Some(info) if info.remaining == 0 => RemoteError::QuotaExhausted {
                    message,
                    reset_at: Some(info.reset_at),
                },
                _ => RemoteError::transient(message),
            }
        }

        _ => RemoteError::transient(message),
    }
}

/// Turn a decoded GraphQL reply into typed data, or classify its errors.
fn classify_response<T: DeserializeOwned>(response: GraphQlResponse, rate_limit: Option<RateLimitInfo>) -> Result<T, RemoteError> {
    if let Some(error) = response.errors.iter().find(|e| e.kind.as_deref() == Some("RATE_LIMITED")) {
        return Err(RemoteError::QuotaExhausted {
            message: error.message.clone(),
            reset_at: rate_limit.map(|info| info.reset_at),
        });
    }

    let messages = response.errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join("; ");

    let data = match response.data {
        Some(data) if !data.is_null() => data,
        _ if messages.is_empty() => return Err(RemoteError::malformed("response carried no data")),
        _ => return Err(RemoteError::malformed(messages)),
    };

    if !messages.is_empty() {
        log::debug!(target: LOG_TARGET, "Partial GraphQL response: {messages}");
    }

    serde_json::from_value(data).map_err(|e| {
        if messages.is_empty() {
            RemoteError::malformed(format!("unexpected response shape: {e}"))
        } else {
            RemoteError::malformed(messages)
        }
    })
}

fn error_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body).map_or_else(|_| format!("HTTP {status}"), |b| format!("HTTP {status}: {}", b.message))
}

/// Extract rate limit information from API response headers
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<usize>().ok()?;

    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;

    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}

/// Parse a `Retry-After` header given in seconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let s = headers.get(reqwest::header::RETRY_AFTER).and_then(|h| h.to_str().ok())?;
    s.trim().parse::<u64>().ok().map(Duration::from_secs)
}

impl Remote for Client {
    async fn list_repositories(&self, org: &str, cursor: Option<&str>, first: u32) -> Result<Page<String>, RemoteError> {
        let data: RepositoriesData = self
            .execute(REPOSITORIES_QUERY, json!({ "org": org, "first": first, "cursor": cursor }))
            .await?;
        data.into_page(org)
    }

    async fn list_branches(&self, owner: &str, repo: &str, cursor: Option<&str>, first: u32) -> Result<Page<String>, RemoteError> {
        let data: BranchesData = self
            .execute(
                BRANCHES_QUERY,
                json!({ "owner": owner, "repo": repo, "first": first, "cursor": cursor }),
            )
            .await?;
        data.into_page(owner, repo)
    }

    async fn list_commits(
        &self,
        owner: &str,
        repo: &str,
        branch_ref: &str,
        cursor: Option<&str>,
        first: u32,
    ) -> Result<Page<CommitNode>, RemoteError> {
        let data: CommitsData = self
            .execute(
                COMMITS_QUERY,
                json!({ "owner": owner, "repo": repo, "branch": branch_ref, "first": first, "cursor": cursor }),
            )
            .await?;
        data.into_page(owner, repo, branch_ref)
    }

    async fn default_branch(&self, owner: &str, repo: &str) -> Result<Option<String>, RemoteError> {
        let data: DefaultBranchData = self
            .execute(DEFAULT_BRANCH_QUERY, json!({ "owner": owner, "repo": repo }))
            .await?;
        data.into_branch(owner, repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::FailureClass;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            let _ = headers.insert(*name, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn test_extract_rate_limit_from_headers() {
        let headers = headers(&[("x-ratelimit-remaining", "4999"), ("x-ratelimit-reset", "1704067200")]);

        let rate_limit = extract_rate_limit_from_headers(&headers).unwrap();

        assert_eq!(rate_limit.remaining, 4999);
        assert_eq!(rate_limit.reset_at.timestamp(), 1_704_067_200);
    }

    #[test]
    fn test_extract_rate_limit_missing_headers() {
        assert!(extract_rate_limit_from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_extract_rate_limit_invalid_reset() {
        let headers = headers(&[("x-ratelimit-remaining", "4999"), ("x-ratelimit-reset", "invalid")]);
        assert!(extract_rate_limit_from_headers(&headers).is_none());
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after(&headers(&[("retry-after", "30")])), Some(Duration::from_secs(30)));
        assert_eq!(parse_retry_after(&headers(&[("retry-after", "soon")])), None);
        assert_eq!(parse_retry_after(&HeaderMap::new()), None);
    }

    #[test]
    fn test_unauthorized_is_fatal() {
        let err = classify_status(StatusCode::UNAUTHORIZED, &HeaderMap::new(), r#"{"message":"Bad credentials"}"#);
        assert_eq!(err.class(), FailureClass::Fatal);
        assert!(err.to_string().contains("Bad credentials"));
    }

    #[test]
    fn test_too_many_requests_defaults_delay() {
        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, &HeaderMap::new(), "");
        assert_eq!(err.class(), FailureClass::Retryable);
        assert_eq!(err.retry_after(), Some(DEFAULT_TOO_MANY_REQUESTS_DELAY));
    }

    #[test]
    fn test_forbidden_with_retry_after_is_secondary_limit() {
        let err = classify_status(StatusCode::FORBIDDEN, &headers(&[("retry-after", "60")]), "");
        assert_eq!(err.class(), FailureClass::Retryable);
        assert_eq!(err.retry_after(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_forbidden_with_exhausted_quota_is_fatal() {
        let headers = headers(&[("x-ratelimit-remaining", "0"), ("x-ratelimit-reset", "1704067200")]);
        let err = classify_status(StatusCode::FORBIDDEN, &headers, r#"{"message":"API rate limit exceeded"}"#);
        match err {
            RemoteError::QuotaExhausted { message, reset_at } => {
                assert!(message.contains("API rate limit exceeded"));
                assert_eq!(reset_at.unwrap().timestamp(), 1_704_067_200);
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn test_server_error_is_retryable() {
        let err = classify_status(StatusCode::BAD_GATEWAY, &HeaderMap::new(), "<html>");
        assert_eq!(err.class(), FailureClass::Retryable);
        assert_eq!(err.retry_after(), None);
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_rate_limited_graphql_error_is_fatal() {
        let response: GraphQlResponse = serde_json::from_str(
            r#"{ "data": null, "errors": [{ "type": "RATE_LIMITED", "message": "API rate limit exceeded for user" }] }"#,
        )
        .unwrap();

        let err = classify_response::<serde_json::Value>(response, None).unwrap_err();
        assert!(matches!(err, RemoteError::QuotaExhausted { reset_at: None, .. }));
    }

    #[test]
    fn test_graphql_errors_without_data_are_malformed() {
        let response: GraphQlResponse = serde_json::from_str(
            r#"{ "data": null, "errors": [{ "type": "NOT_FOUND", "message": "Could not resolve to an Organization" }] }"#,
        )
        .unwrap();

        let err = classify_response::<serde_json::Value>(response, None).unwrap_err();
        assert_eq!(err.class(), FailureClass::Malformed);
        assert!(err.to_string().contains("Could not resolve"));
    }

    #[test]
    fn test_partial_data_is_decoded() {
        let response: GraphQlResponse = serde_json::from_str(
            r#"{ "data": { "organization": null }, "errors": [{ "type": "NOT_FOUND", "message": "Could not resolve" }] }"#,
        )
        .unwrap();

        let data = classify_response::<RepositoriesData>(response, None).unwrap();
        assert!(data.into_page("nope").is_err());
    }

    #[test]
    fn test_empty_response_is_malformed() {
        let response: GraphQlResponse = serde_json::from_str("{}").unwrap();
        let err = classify_response::<serde_json::Value>(response, None).unwrap_err();
        assert_eq!(err.class(), FailureClass::Malformed);
    }

    #[test]
    fn test_client_endpoint() {
        let client = Client::new("test_token", DEFAULT_ENDPOINT, Duration::from_secs(10)).unwrap();
        assert_eq!(client.endpoint(), DEFAULT_ENDPOINT);
    }
}
