//! Request dispatch and response normalization
//!
//! The dispatcher owns the per-call sequence Compose → Sign → Send → Parse →
//! Normalize. One attempt per call, no retries, no state mutated across
//! calls. Every outcome — success, upstream rejection, transport failure,
//! malformed body — comes back as an [`ApiResult`] value; dispatch itself
//! never fails.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::StatusCode;
use tracing::{debug, warn};

use ruten_domain::constants::{
    HEADER_UPSTREAM_REQUEST_ID, REQUEST_TIMEOUT_SECS, USER_AGENT,
};
use ruten_domain::{ApiError, ApiResult, Result, RutenError};

use crate::credentials::Credentials;
use crate::diagnostics::{DiagnosticsSink, DispatchRecord, TracingDiagnostics};
use crate::intent::RequestIntent;
use crate::signature::{canonical_path, sign, AuthHeaders};

/// Signs and dispatches [`RequestIntent`]s against one upstream host.
///
/// Holds no mutable state after construction; may be shared and called
/// concurrently without coordination.
#[derive(Clone)]
pub struct RequestDispatcher {
    base_url: String,
    credentials: Credentials,
    http: reqwest::Client,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl RequestDispatcher {
    /// Build a dispatcher for `base_url` with the default request timeout
    /// and `tracing`-backed diagnostics.
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Result<Self> {
        Self::with_diagnostics(
            base_url,
            credentials,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
            Arc::new(TracingDiagnostics),
        )
    }

    /// Build a dispatcher with an injected diagnostics sink and timeout.
    pub fn with_diagnostics(
        base_url: impl Into<String>,
        credentials: Credentials,
        timeout: Duration,
        diagnostics: Arc<dyn DiagnosticsSink>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RutenError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { base_url: base_url.into(), credentials, http, diagnostics })
    }

    /// Dispatch one intent: sign, send once, normalize the outcome.
    pub async fn dispatch(&self, intent: RequestIntent) -> ApiResult {
        let body_string = match intent.body_string() {
            Ok(body) => body,
            Err(err) => {
                return ApiResult::Error(ApiError::transport(err.to_string()));
            }
        };

        // The signed path+query string is byte-identical to what goes on the
        // wire; building the URL from it keeps signature and request in sync.
        let path_and_query = canonical_path(intent.path(), intent.query_pairs());
        let url = format!("{}{}", self.base_url, path_and_query);

        // Single clock read per call: header and signature share this value.
        let timestamp = Utc::now().timestamp().to_string();
        let payload = sign(&self.credentials, &path_and_query, &body_string, &timestamp);
        let headers = AuthHeaders::build(&self.credentials, &payload);

        debug!(
            method = %intent.method(),
            path = %path_and_query,
            api_key = %self.credentials.preview(),
            "sending signed request"
        );

        let mut builder = self
            .http
            .request(intent.method().clone(), &url)
            .header("Content-Type", headers.content_type);
        for (name, value) in headers.as_pairs() {
            builder = builder.header(name, value);
        }
        if !body_string.is_empty() {
            builder = builder.body(body_string);
        }

        let mut record = DispatchRecord {
            correlation_id: uuid::Uuid::new_v4().to_string(),
            method: intent.method().as_str().to_string(),
            path: path_and_query,
            status: None,
            signature_preview: DispatchRecord::preview_of(&payload.digest),
            upstream_request_id: None,
        };

        let outcome = match builder.send().await {
            Ok(response) => {
                record.status = Some(response.status().as_u16());
                record.upstream_request_id = response
                    .headers()
                    .get(HEADER_UPSTREAM_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .map(ToString::to_string);
                normalize_response(response).await
            }
            Err(err) => ApiResult::Error(ApiError::transport(describe_send_error(&err))),
        };

        self.diagnostics.record(&record);
        outcome
    }
}

/// Turn a received HTTP response into the caller-facing result value.
async fn normalize_response(response: reqwest::Response) -> ApiResult {
    let status = response.status();
    let body_text = match response.text().await {
        Ok(text) => text,
        Err(err) => {
            return ApiResult::Error(ApiError::upstream(
                status.as_u16(),
                format!("failed to read response body: {err}"),
                None,
                None,
                None,
            ));
        }
    };

    if status.is_success() {
        normalize_success(status, body_text)
    } else {
        normalize_failure(status, body_text)
    }
}

fn normalize_success(status: StatusCode, body_text: String) -> ApiResult {
    match serde_json::from_str::<serde_json::Value>(&body_text) {
        Ok(body) => {
            // HTTP 2xx can still carry an application-level failure; surface
            // it in the logs but hand the full body to the caller unchanged.
            if let Some(app_status) = body.get("status").and_then(|v| v.as_str()) {
                if app_status != "success" {
                    warn!(
                        status = app_status,
                        error_code = body.get("error_code").and_then(|v| v.as_str()),
                        error_msg = body.get("error_msg").and_then(|v| v.as_str()),
                        "upstream returned non-success application status"
                    );
                }
            }
            ApiResult::Success { status_code: status.as_u16(), body }
        }
        Err(_) => ApiResult::Error(ApiError::malformed_success(status.as_u16(), Some(body_text))),
    }
}

fn normalize_failure(status: StatusCode, body_text: String) -> ApiResult {
    let transport_message = format!("HTTP {} from upstream", status.as_u16());

    match serde_json::from_str::<serde_json::Value>(&body_text) {
        Ok(body) => ApiResult::Error(ApiError::upstream(
            status.as_u16(),
            transport_message,
            body.get("error_code").map(detail_string),
            body.get("error_msg").map(detail_string),
            Some(body_text),
        )),
        Err(_) => ApiResult::Error(ApiError::unparseable(
            status.as_u16(),
            transport_message,
            Some(body_text),
        )),
    }
}

fn detail_string(value: &serde_json::Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

fn describe_send_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        format!("HTTP request failed: {err}")
    }
}

#[cfg(test)]
mod tests {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use ruten_domain::{NON_JSON_RESPONSE, UNPARSEABLE_DETAIL};

    use super::*;

    fn test_credentials() -> Credentials {
        Credentials::new("dsu6tjuf8dvc8xdc7uajk6da8agdxxhv", "wu68zrcikttdjnieqv3pyydixmxbjady", "dma29ifwy56i")
            .expect("valid test credentials")
    }

    fn dispatcher_for(server: &MockServer) -> (RequestDispatcher, Arc<crate::diagnostics::CapturingDiagnostics>) {
        let sink = Arc::new(crate::diagnostics::CapturingDiagnostics::default());
        let dispatcher = RequestDispatcher::with_diagnostics(
            server.uri(),
            test_credentials(),
            Duration::from_secs(5),
            sink.clone(),
        )
        .expect("dispatcher");
        (dispatcher, sink)
    }

    #[tokio::test]
    async fn success_response_is_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/product/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "data": [{"item_id": "1234"}]
            })))
            .mount(&server)
            .await;

        let (dispatcher, _) = dispatcher_for(&server);
        let intent = RequestIntent::get("/api/v1/product/list").query("status", "all");
        let result = dispatcher.dispatch(intent).await;

        match result {
            ApiResult::Success { status_code, body } => {
                assert_eq!(status_code, 200);
                assert_eq!(body["status"], "success");
            }
            ApiResult::Error(err) => panic!("expected success, got {err:?}"),
        }
    }

    #[tokio::test]
    async fn transmitted_signature_verifies_against_transmitted_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/product/list"))
            .and(header_exists("X-RT-Key"))
            .and(header_exists("X-RT-Timestamp"))
            .and(header_exists("X-RT-Authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "success"})))
            .mount(&server)
            .await;

        let (dispatcher, _) = dispatcher_for(&server);
        let intent = RequestIntent::get("/api/v1/product/list")
            .query("status", "all")
            .query("offset", 1)
            .query("limit", 30);
        let result = dispatcher.dispatch(intent).await;
        assert!(result.is_success());

        let requests = server.received_requests().await.expect("requests recorded");
        assert_eq!(requests.len(), 1);
        let request = &requests[0];

        // Wire query string equals the signed query string.
        assert_eq!(request.url.query(), Some("status=all&offset=1&limit=30"));

        let timestamp = request.headers.get("X-RT-Timestamp").expect("timestamp header").to_str().expect("ascii");
        let sent_signature =
            request.headers.get("X-RT-Authorization").expect("signature header").to_str().expect("ascii");

        // Independent recomputation of the digest from what was transmitted.
        let canonical = format!(
            "dma29ifwy56i/api/v1/product/list?status=all&offset=1&limit=30{timestamp}"
        );
        let mut mac = Hmac::<Sha256>::new_from_slice(b"wu68zrcikttdjnieqv3pyydixmxbjady")
            .expect("HMAC can take key of any size");
        mac.update(canonical.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        assert_eq!(sent_signature, expected);
        assert_eq!(request.headers.get("X-RT-Key").expect("key header"), "dsu6tjuf8dvc8xdc7uajk6da8agdxxhv");
    }

    #[tokio::test]
    async fn signed_body_matches_transmitted_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/order/detail"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "success"})))
            .mount(&server)
            .await;

        let (dispatcher, _) = dispatcher_for(&server);
        let intent = RequestIntent::post("/api/v1/order/detail")
            .body(serde_json::json!({"order_ids": ["20241201-001"]}));
        assert!(dispatcher.dispatch(intent).await.is_success());

        let requests = server.received_requests().await.expect("requests recorded");
        let request = &requests[0];
        let body = String::from_utf8(request.body.clone()).expect("utf-8 body");
        assert_eq!(body, r#"{"order_ids":["20241201-001"]}"#);

        let timestamp = request.headers.get("X-RT-Timestamp").expect("timestamp header").to_str().expect("ascii");
        let canonical = format!("dma29ifwy56i/api/v1/order/detail{body}{timestamp}");
        let mut mac = Hmac::<Sha256>::new_from_slice(b"wu68zrcikttdjnieqv3pyydixmxbjady")
            .expect("HMAC can take key of any size");
        mac.update(canonical.as_bytes());
        assert_eq!(
            request.headers.get("X-RT-Authorization").expect("signature header").to_str().expect("ascii"),
            hex::encode(mac.finalize().into_bytes())
        );
    }

    #[tokio::test]
    async fn json_error_body_detail_is_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "status": "error",
                "error_code": "E1001",
                "error_msg": "invalid item id"
            })))
            .mount(&server)
            .await;

        let (dispatcher, _) = dispatcher_for(&server);
        let result = dispatcher.dispatch(RequestIntent::get("/api/v1/product/item/x")).await;

        let err = result.as_error().expect("error variant");
        assert_eq!(err.status_code, Some(400));
        assert_eq!(err.error_code.as_deref(), Some("E1001"));
        assert_eq!(err.error_message.as_deref(), Some("invalid item id"));
        assert!(err.raw_body.as_deref().is_some_and(|b| b.contains("E1001")));
    }

    #[tokio::test]
    async fn html_error_body_yields_unparseable_sentinel() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(502)
                    .set_body_string("<html><body>Bad Gateway</body></html>"),
            )
            .mount(&server)
            .await;

        let (dispatcher, _) = dispatcher_for(&server);
        let result = dispatcher.dispatch(RequestIntent::get("/api/v1/order/list")).await;

        let err = result.as_error().expect("error variant");
        assert_eq!(err.status_code, Some(502));
        assert_eq!(err.error_code.as_deref(), Some(UNPARSEABLE_DETAIL));
        assert_eq!(err.error_message.as_deref(), Some(UNPARSEABLE_DETAIL));
    }

    #[tokio::test]
    async fn non_json_success_is_not_mistaken_for_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .mount(&server)
            .await;

        let (dispatcher, _) = dispatcher_for(&server);
        let result = dispatcher.dispatch(RequestIntent::get("/api/v1/product/list")).await;

        assert!(!result.is_success());
        let err = result.as_error().expect("error variant");
        assert_eq!(err.status_code, Some(200));
        assert_eq!(err.error_code.as_deref(), Some(NON_JSON_RESPONSE));
    }

    #[tokio::test]
    async fn connection_failure_reports_transport_error() {
        // Unroutable port: nothing is listening there.
        let sink = Arc::new(crate::diagnostics::CapturingDiagnostics::default());
        let dispatcher = RequestDispatcher::with_diagnostics(
            "http://127.0.0.1:9",
            test_credentials(),
            Duration::from_secs(2),
            sink,
        )
        .expect("dispatcher");

        let result = dispatcher.dispatch(RequestIntent::get("/api/v1/product/list")).await;
        let err = result.as_error().expect("error variant");
        assert!(err.status_code.is_none());
        assert!(err.transport_message.is_some());
        assert!(err.error_code.is_none());
    }

    #[tokio::test]
    async fn every_dispatch_emits_one_diagnostic_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-request-id", "rt-7f3a")
                    .set_body_json(serde_json::json!({"status": "success"})),
            )
            .mount(&server)
            .await;

        let (dispatcher, sink) = dispatcher_for(&server);
        let intent = RequestIntent::get("/api/v1/product/list").query("status", "all");
        assert!(dispatcher.dispatch(intent).await.is_success());

        let records = sink.records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.method, "GET");
        assert_eq!(record.path, "/api/v1/product/list?status=all");
        assert_eq!(record.status, Some(200));
        assert_eq!(record.upstream_request_id.as_deref(), Some("rt-7f3a"));
        assert!(!record.correlation_id.is_empty());
        // Preview only, never the 64-char digest.
        assert!(record.signature_preview.len() < 64);
    }

    #[tokio::test]
    async fn application_level_failure_with_200_stays_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "error",
                "error_code": "E2002",
                "error_msg": "quota exceeded"
            })))
            .mount(&server)
            .await;

        let (dispatcher, _) = dispatcher_for(&server);
        let result = dispatcher.dispatch(RequestIntent::get("/api/v1/product/list")).await;

        // Body is handed through unchanged; the caller sees the upstream code.
        match result {
            ApiResult::Success { body, .. } => assert_eq!(body["error_code"], "E2002"),
            ApiResult::Error(err) => panic!("expected pass-through success, got {err:?}"),
        }
    }

    #[tokio::test]
    async fn concurrent_dispatches_pair_intents_with_results() {
        let server = MockServer::start().await;
        for id in 0..8 {
            Mock::given(method("GET"))
                .and(path(format!("/api/v1/product/item/item-{id}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "status": "success",
                    "data": {"item_id": format!("item-{id}")}
                })))
                .mount(&server)
                .await;
        }

        let (dispatcher, sink) = dispatcher_for(&server);
        let calls = (0..8).map(|id| {
            let dispatcher = dispatcher.clone();
            async move {
                let result = dispatcher
                    .dispatch(RequestIntent::get(format!("/api/v1/product/item/item-{id}")))
                    .await;
                (id, result)
            }
        });

        for (id, result) in futures::future::join_all(calls).await {
            match result {
                ApiResult::Success { body, .. } => {
                    assert_eq!(body["data"]["item_id"], format!("item-{id}"));
                }
                ApiResult::Error(err) => panic!("call {id} failed: {err:?}"),
            }
        }

        // One record per call, each with a distinct correlation id.
        let records = sink.records();
        assert_eq!(records.len(), 8);
        let mut ids: Vec<_> = records.iter().map(|r| r.correlation_id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }
}
