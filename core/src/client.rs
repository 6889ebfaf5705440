//! Fallback-aware JSON client.
//!
//! # Design
//! `ResilientClient` owns no connection state of its own: it holds the shared
//! `EndpointSet`, a `Transport` that performs one round-trip, and a
//! `TokenStore` it reads before every call. Each call is a flat linear scan:
//! current primary first, then every other candidate in declared order, each
//! attempted exactly once with no delay in between. The first 2xx wins; if it
//! came from a fallback, that URL becomes the primary for later calls.
//!
//! Building the request and interpreting the response are plain functions
//! (`build_request`, `parse_response`) so the interesting logic stays testable
//! without any I/O.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::endpoints::EndpointSet;
use crate::envelope::ApiResponse;
use crate::error::{AttemptError, RequestError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::token::TokenStore;
use crate::transport::{ReqwestTransport, Transport};

/// Per-attempt deadline used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Path prefix the civic base URLs end with. Routes such as `/health` are
/// served at the server root, outside it.
pub const API_PREFIX: &str = "/api/v1";

/// Where a path is resolved against a candidate base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mount {
    Api,
    Root,
}

impl Mount {
    fn base(self, base: &str) -> &str {
        match self {
            Mount::Api => base,
            Mount::Root => base.strip_suffix(API_PREFIX).unwrap_or(base),
        }
    }
}

#[derive(Clone)]
pub struct ResilientClient {
    endpoints: Arc<EndpointSet>,
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenStore>,
    timeout: Duration,
}

impl std::fmt::Debug for ResilientClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientClient")
            .field("endpoints", &self.endpoints)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ResilientClient {
    pub fn new(
        endpoints: EndpointSet,
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        tracing::info!(
            primary = %endpoints.primary(),
            candidates = ?endpoints.candidates(),
            "API client initialized"
        );
        Self {
            endpoints: Arc::new(endpoints),
            transport,
            tokens,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Client over HTTP with the endpoints and timeout from `config`.
    pub fn from_config(config: &ClientConfig, tokens: Arc<dyn TokenStore>) -> Self {
        Self::new(config.endpoint_set(), Arc::new(ReqwestTransport::new()), tokens)
            .with_timeout(config.timeout())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoints(&self) -> &EndpointSet {
        &self.endpoints
    }

    /// Base URL the next call will try first.
    pub fn primary(&self) -> &str {
        self.endpoints.primary()
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, RequestError> {
        self.send(HttpMethod::Get, path, None).await
    }

    /// GET a route mounted at the server root instead of under
    /// [`API_PREFIX`]. Goes through the same fallback scan and promotion.
    pub async fn get_root<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, RequestError> {
        self.dispatch(Mount::Root, HttpMethod::Get, path, None).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<ApiResponse<T>, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_string(body)?;
        self.send(HttpMethod::Post, path, Some(body)).await
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, RequestError> {
        self.send(HttpMethod::Post, path, None).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<ApiResponse<T>, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_string(body)?;
        self.send(HttpMethod::Put, path, Some(body)).await
    }

    pub async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, RequestError> {
        self.send(HttpMethod::Put, path, None).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, RequestError> {
        self.send(HttpMethod::Delete, path, None).await
    }

    /// Run one call through the fallback scan.
    ///
    /// `Err` only for a malformed call; every network or HTTP failure is
    /// reported as `ApiResponse::Error`.
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
    ) -> Result<ApiResponse<T>, RequestError> {
        self.dispatch(Mount::Api, method, path, body).await
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        mount: Mount,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
    ) -> Result<ApiResponse<T>, RequestError> {
        if !path.starts_with('/') {
            return Err(RequestError::InvalidPath(path.to_string()));
        }
        let token = self.tokens.access_token().await;
        Ok(self.try_fetch(mount, method, path, body.as_deref(), token.as_deref()).await)
    }

    async fn try_fetch<T: DeserializeOwned>(
        &self,
        mount: Mount,
        method: HttpMethod,
        path: &str,
        body: Option<&str>,
        token: Option<&str>,
    ) -> ApiResponse<T> {
        let observed = self.endpoints.primary_index();
        let candidates = self.endpoints.candidates();
        let mut failures: Vec<(&str, AttemptError)> = Vec::new();

        for index in self.endpoints.attempt_order(observed) {
            let base = candidates[index].as_str();
            let is_fallback = index != observed;
            let request = build_request(method, mount.base(base), path, body, token);
            tracing::debug!(%method, url = %request.url, fallback = is_fallback, "trying request");

            match self.attempt(&request).await {
                Ok(data) => {
                    if is_fallback {
                        if self.endpoints.promote(observed, index) {
                            tracing::info!(primary = %base, "connected using fallback, promoted to primary");
                        } else {
                            tracing::debug!(url = %base, "fallback succeeded but primary changed concurrently");
                        }
                    }
                    return ApiResponse::Data(data);
                }
                Err(err) => {
                    tracing::warn!(url = %request.url, error = %err, "request attempt failed");
                    failures.push((base, err));
                }
            }
        }

        let message = exhausted_message(&failures);
        tracing::error!(%method, path, error = %message, "all endpoints failed");
        ApiResponse::Error(message)
    }

    async fn attempt<T: DeserializeOwned>(&self, request: &HttpRequest) -> Result<T, AttemptError> {
        let response = tokio::time::timeout(self.timeout, self.transport.execute(request))
            .await
            .map_err(|_| AttemptError::Timeout(self.timeout))??;
        parse_response(response)
    }
}

/// Build the request for one attempt against `base`.
pub fn build_request(
    method: HttpMethod,
    base: &str,
    path: &str,
    body: Option<&str>,
    token: Option<&str>,
) -> HttpRequest {
    let mut headers = vec![("content-type".to_string(), "application/json".to_string())];
    if let Some(token) = token {
        headers.push(("authorization".to_string(), format!("Bearer {token}")));
    }
    HttpRequest {
        method,
        url: format!("{base}{path}"),
        headers,
        body: body.map(str::to_string),
    }
}

/// Interpret one response: 2xx decodes into `T`, anything else is a failure
/// carrying the message the caller should see.
pub fn parse_response<T: DeserializeOwned>(response: HttpResponse) -> Result<T, AttemptError> {
    if !response.is_success() {
        let status = response.status;
        return Err(match server_detail(&response) {
            Some(detail) => AttemptError::Rejected { status, detail },
            None => AttemptError::Status {
                status,
                message: status_message(&response),
            },
        });
    }
    // 204 and friends: an empty body decodes like JSON null.
    let body = match response.body.trim() {
        "" => "null",
        body => body,
    };
    serde_json::from_str(body).map_err(|e| AttemptError::Decode(e.to_string()))
}

/// The server's `detail` when it sent one, else `HTTP <code>: <reason>`.
pub fn error_message(response: &HttpResponse) -> String {
    server_detail(response).unwrap_or_else(|| status_message(response))
}

/// Non-string details (validation error lists) are rendered as JSON.
fn server_detail(response: &HttpResponse) -> Option<String> {
    let detail = match serde_json::from_str::<Value>(&response.body) {
        Ok(Value::Object(mut map)) => map.remove("detail")?,
        _ => return None,
    };
    match detail {
        Value::String(detail) if !detail.is_empty() => Some(detail),
        Value::String(_) | Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn status_message(response: &HttpResponse) -> String {
    match response.status_text() {
        "" => format!("HTTP {}", response.status),
        text => format!("HTTP {}: {}", response.status, text),
    }
}

fn exhausted_message(failures: &[(&str, AttemptError)]) -> String {
    // A lone rejection is shown the way the server phrased it.
    if let [(_, AttemptError::Rejected { detail, .. })] = failures {
        return detail.clone();
    }
    let tried = failures
        .iter()
        .map(|(base, err)| format!("{base} ({err})"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("Network error: Could not connect to any server. Tried: {tried}")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::error::TransportError;
    use crate::token::{MemoryTokenStore, NoTokens};

    #[derive(Clone)]
    enum Outcome {
        Respond(u16, &'static str),
        Refuse,
        Hang,
    }

    /// Scripted transport keyed by base URL; records every request it sees.
    #[derive(Default)]
    struct FakeTransport {
        outcomes: HashMap<String, Outcome>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl FakeTransport {
        fn with(outcomes: &[(&str, Outcome)]) -> Arc<Self> {
            Arc::new(Self {
                outcomes: outcomes
                    .iter()
                    .map(|(base, outcome)| (base.to_string(), outcome.clone()))
                    .collect(),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.seen.lock().unwrap().clone()
        }

        fn urls(&self) -> Vec<String> {
            self.requests().into_iter().map(|r| r.url).collect()
        }

        fn clear(&self) {
            self.seen.lock().unwrap().clear();
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            let outcome = self
                .outcomes
                .iter()
                .find(|(base, _)| request.url.starts_with(&format!("{base}/")))
                .map(|(_, outcome)| outcome.clone())
                .unwrap_or(Outcome::Refuse);
            match outcome {
                Outcome::Respond(status, body) => Ok(HttpResponse::new(status, body)),
                Outcome::Refuse => Err(TransportError("connection refused".to_string())),
                Outcome::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Err(TransportError("unreachable".to_string()))
                }
            }
        }
    }

    fn client(fallbacks: &[&str], transport: Arc<FakeTransport>) -> ResilientClient {
        ResilientClient::new(
            EndpointSet::new("http://alpha", fallbacks),
            transport,
            Arc::new(NoTokens),
        )
    }

    #[tokio::test]
    async fn primary_success_returns_data_without_fallbacks() {
        let transport = FakeTransport::with(&[("http://alpha", Outcome::Respond(200, r#"{"ok":true}"#))]);
        let c = client(&["http://beta"], transport.clone());

        let resp: ApiResponse<Value> = c.get("/health").await.unwrap();
        assert_eq!(resp, ApiResponse::Data(json!({"ok": true})));
        assert_eq!(transport.urls(), vec!["http://alpha/health"]);
        assert_eq!(c.primary(), "http://alpha");
    }

    #[tokio::test]
    async fn first_successful_fallback_stops_the_scan() {
        let transport = FakeTransport::with(&[
            ("http://alpha", Outcome::Refuse),
            ("http://beta", Outcome::Respond(200, r#"{"id":"7"}"#)),
            ("http://gamma", Outcome::Respond(200, r#"{"id":"never"}"#)),
        ]);
        let c = client(&["http://beta", "http://gamma"], transport.clone());

        let resp: ApiResponse<Value> = c.get("/issues/7").await.unwrap();
        assert_eq!(resp, ApiResponse::Data(json!({"id": "7"})));
        assert_eq!(transport.urls(), vec!["http://alpha/issues/7", "http://beta/issues/7"]);
    }

    #[tokio::test]
    async fn fallback_success_promotes_and_next_call_tries_it_first() {
        let transport = FakeTransport::with(&[
            ("http://alpha", Outcome::Refuse),
            ("http://beta", Outcome::Refuse),
            ("http://gamma", Outcome::Respond(200, r#"{"id":"42"}"#)),
        ]);
        let c = client(&["http://beta", "http://gamma"], transport.clone());

        let resp: ApiResponse<Value> = c.get("/issues").await.unwrap();
        assert_eq!(resp, ApiResponse::Data(json!({"id": "42"})));
        assert_eq!(c.primary(), "http://gamma");

        transport.clear();
        let _: ApiResponse<Value> = c.get("/issues").await.unwrap();
        assert_eq!(transport.urls(), vec!["http://gamma/issues"]);
    }

    #[tokio::test]
    async fn http_error_status_also_triggers_fallback() {
        let transport = FakeTransport::with(&[
            ("http://alpha", Outcome::Respond(502, "bad gateway")),
            ("http://beta", Outcome::Respond(201, r#"{"id":"c1"}"#)),
        ]);
        let c = client(&["http://beta"], transport.clone());

        let resp: ApiResponse<Value> = c.post("/issues/1/comments", &json!({"text": "hi"})).await.unwrap();
        assert_eq!(resp.data(), Some(&json!({"id": "c1"})));
        assert_eq!(c.primary(), "http://beta");
    }

    #[tokio::test]
    async fn single_endpoint_surfaces_detail_verbatim() {
        let transport = FakeTransport::with(&[("http://alpha", Outcome::Respond(503, r#"{"detail":"overloaded"}"#))]);
        let c = client(&[], transport);

        let resp: ApiResponse<Value> = c.get("/issues").await.unwrap();
        assert_eq!(resp, ApiResponse::Error("overloaded".to_string()));
    }

    #[tokio::test]
    async fn exhaustion_names_every_attempted_url() {
        let transport = FakeTransport::with(&[
            ("http://alpha", Outcome::Respond(500, "<html>boom</html>")),
            ("http://beta", Outcome::Respond(502, "not json")),
        ]);
        let c = client(&["http://beta"], transport.clone());

        let resp: ApiResponse<Value> = c.get("/issues").await.unwrap();
        let message = resp.error().expect("error envelope");
        assert!(message.contains("http://alpha"), "{message}");
        assert!(message.contains("http://beta"), "{message}");
        assert!(message.contains("HTTP 500: Internal Server Error"), "{message}");
        assert!(message.contains("HTTP 502: Bad Gateway"), "{message}");
        assert!(resp.data().is_none());
        assert_eq!(c.primary(), "http://alpha");
    }

    #[tokio::test]
    async fn each_url_is_attempted_once_after_promotion() {
        let transport = FakeTransport::with(&[
            ("http://alpha", Outcome::Refuse),
            ("http://beta", Outcome::Respond(200, "{}")),
        ]);
        let c = client(&["http://alpha", "http://beta", "http://beta/"], transport.clone());

        let _: ApiResponse<Value> = c.get("/a").await.unwrap();
        assert_eq!(transport.urls(), vec!["http://alpha/a", "http://beta/a"]);
        assert_eq!(c.primary(), "http://beta");

        // Promoted primary now fails too: both remaining candidates once each.
        let transport = FakeTransport::with(&[]);
        let c2 = ResilientClient::new(
            EndpointSet::new("http://alpha", ["http://beta"]),
            transport.clone(),
            Arc::new(NoTokens),
        );
        c2.endpoints().promote_url("http://beta");
        let resp: ApiResponse<Value> = c2.get("/b").await.unwrap();
        assert!(resp.is_error());
        assert_eq!(transport.urls(), vec!["http://beta/b", "http://alpha/b"]);
    }

    #[tokio::test]
    async fn bearer_header_on_every_attempt_when_token_present() {
        let transport = FakeTransport::with(&[
            ("http://alpha", Outcome::Refuse),
            ("http://beta", Outcome::Respond(404, r#"{"detail":"Issue not found"}"#)),
        ]);
        let c = ResilientClient::new(
            EndpointSet::new("http://alpha", ["http://beta"]),
            transport.clone(),
            Arc::new(MemoryTokenStore::with_access_token("tok-1")),
        );

        let _: ApiResponse<Value> = c.get("/issues/9").await.unwrap();
        let seen = transport.requests();
        assert_eq!(seen.len(), 2);
        for request in seen {
            assert_eq!(request.header("authorization"), Some("Bearer tok-1"));
            assert_eq!(request.header("content-type"), Some("application/json"));
        }
    }

    #[tokio::test]
    async fn no_bearer_header_without_token() {
        let transport = FakeTransport::with(&[("http://alpha", Outcome::Refuse)]);
        let c = client(&["http://beta"], transport.clone());

        let _: ApiResponse<Value> = c.delete("/issues/9").await.unwrap();
        assert_eq!(transport.requests().len(), 2);
        assert!(transport.requests().iter().all(|r| r.header("authorization").is_none()));
    }

    #[tokio::test]
    async fn hanging_endpoint_times_out_and_falls_back() {
        let transport = FakeTransport::with(&[
            ("http://alpha", Outcome::Hang),
            ("http://beta", Outcome::Respond(200, r#"{"status":"healthy","version":"1.0.0"}"#)),
        ]);
        let c = client(&["http://beta"], transport).with_timeout(Duration::from_millis(50));

        let resp: ApiResponse<crate::types::Health> = c.get("/health").await.unwrap();
        assert_eq!(resp.data().map(|h| h.status.as_str()), Some("healthy"));
        assert_eq!(c.primary(), "http://beta");
    }

    #[tokio::test]
    async fn undecodable_success_body_is_a_failed_attempt() {
        let transport = FakeTransport::with(&[
            ("http://alpha", Outcome::Respond(200, "<html>captive portal</html>")),
            ("http://beta", Outcome::Respond(200, r#"{"status":"healthy","version":"1.0.0"}"#)),
        ]);
        let c = client(&["http://beta"], transport);

        let resp: ApiResponse<crate::types::Health> = c.get("/health").await.unwrap();
        assert!(resp.is_data());
        assert_eq!(c.primary(), "http://beta");
    }

    #[tokio::test]
    async fn relative_path_is_a_programmer_error() {
        let transport = FakeTransport::with(&[]);
        let c = client(&[], transport.clone());

        let err = c.get::<Value>("issues").await.unwrap_err();
        assert!(matches!(err, RequestError::InvalidPath(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn single_endpoint_timeout_names_the_url() {
        let transport = FakeTransport::with(&[("http://alpha", Outcome::Hang)]);
        let c = client(&[], transport).with_timeout(Duration::from_millis(50));

        let resp: ApiResponse<Value> = c.get("/issues").await.unwrap();
        let message = resp.error().expect("error envelope");
        assert!(message.contains("Tried: http://alpha (timed out after 50ms)"), "{message}");
    }

    #[tokio::test]
    async fn single_endpoint_plain_text_error_names_the_url() {
        let transport = FakeTransport::with(&[("http://alpha", Outcome::Respond(503, "upstream unavailable"))]);
        let c = client(&[], transport);

        let resp: ApiResponse<Value> = c.get("/issues").await.unwrap();
        assert_eq!(
            resp.error(),
            Some("Network error: Could not connect to any server. Tried: http://alpha (HTTP 503: Service Unavailable)")
        );
    }

    #[tokio::test]
    async fn single_endpoint_refusal_names_the_url() {
        let transport = FakeTransport::with(&[]);
        let c = client(&[], transport);

        let resp: ApiResponse<Value> = c.get("/issues").await.unwrap();
        let message = resp.error().expect("error envelope");
        assert!(message.contains("http://alpha (network error: connection refused)"), "{message}");
    }

    #[tokio::test]
    async fn root_routes_drop_the_api_prefix_and_still_fall_back() {
        let transport = FakeTransport::with(&[
            ("http://alpha", Outcome::Refuse),
            ("http://beta", Outcome::Respond(200, r#"{"status":"healthy","version":"1.0.0"}"#)),
        ]);
        let c = ResilientClient::new(
            EndpointSet::new("http://alpha/api/v1", ["http://beta/api/v1"]),
            transport.clone(),
            Arc::new(NoTokens),
        );

        let resp: ApiResponse<crate::types::Health> = c.get_root("/health").await.unwrap();
        assert!(resp.is_data());
        assert_eq!(transport.urls(), vec!["http://alpha/health", "http://beta/health"]);
        assert_eq!(c.primary(), "http://beta/api/v1");

        transport.clear();
        let _: ApiResponse<Value> = c.get("/issues").await.unwrap();
        assert_eq!(transport.urls(), vec!["http://beta/api/v1/issues"]);
    }

    #[tokio::test]
    async fn empty_verbs_send_no_body() {
        let transport = FakeTransport::with(&[("http://alpha", Outcome::Respond(204, ""))]);
        let c = client(&[], transport.clone());

        let resp: ApiResponse<()> = c.post_empty("/issues/1/vote").await.unwrap();
        assert_eq!(resp, ApiResponse::Data(()));
        let resp: ApiResponse<Option<Value>> = c.put_empty("/tasks/1").await.unwrap();
        assert_eq!(resp, ApiResponse::Data(None));

        let seen = transport.requests();
        assert_eq!(
            seen.iter().map(|r| r.method).collect::<Vec<_>>(),
            vec![HttpMethod::Post, HttpMethod::Put]
        );
        assert!(seen.iter().all(|r| r.body.is_none()));
    }

    #[test]
    fn non_detail_failure_is_a_status_error() {
        let err = parse_response::<Value>(HttpResponse::new(503, "upstream unavailable")).unwrap_err();
        assert!(matches!(err, AttemptError::Status { status: 503, .. }));

        let err = parse_response::<Value>(HttpResponse::new(404, r#"{"detail":"Issue not found"}"#)).unwrap_err();
        assert!(matches!(err, AttemptError::Rejected { status: 404, .. }));
    }

    #[test]
    fn build_request_sets_url_headers_and_body() {
        let req = build_request(HttpMethod::Put, "http://alpha", "/tasks/1", Some("{}"), Some("t"));
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "http://alpha/tasks/1");
        assert_eq!(
            req.headers,
            vec![
                ("content-type".to_string(), "application/json".to_string()),
                ("authorization".to_string(), "Bearer t".to_string()),
            ]
        );
        assert_eq!(req.body.as_deref(), Some("{}"));
    }

    #[test]
    fn parse_response_empty_body_decodes_as_unit() {
        parse_response::<()>(HttpResponse::new(204, "")).unwrap();
    }

    #[test]
    fn error_message_variants() {
        let detail = HttpResponse::new(401, r#"{"detail":"Incorrect email or password"}"#);
        assert_eq!(error_message(&detail), "Incorrect email or password");

        let no_detail = HttpResponse::new(503, r#"{"message":"x"}"#);
        assert_eq!(error_message(&no_detail), "HTTP 503: Service Unavailable");

        let unparsable = HttpResponse::new(500, "oops");
        assert_eq!(error_message(&unparsable), "HTTP 500: Internal Server Error");

        let structured = HttpResponse::new(422, r#"{"detail":[{"loc":["body","title"]}]}"#);
        assert_eq!(error_message(&structured), r#"[{"loc":["body","title"]}]"#);
    }
}
