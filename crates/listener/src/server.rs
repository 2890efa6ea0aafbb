//! Axum router receiving GitHub webhook deliveries.
//!
//! Requests are verified, decoded and filtered on the request path. The check
//! itself runs on a background task owned by [`WebhookState`], so a client
//! closing its connection never cancels a half-finished unpublish.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, info_span, Instrument, Span};

use articles::{BranchName, PushHandler};

use crate::payload::PushPayload;
use crate::signature::verify_request;
use crate::WebhookRejection;

/// Header naming the webhook event, e.g. `push` or `ping`.
pub const EVENT_HEADER: &str = "x-github-event";
/// Unique id GitHub assigns to each delivery.
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// Shared state for the webhook routes.
#[derive(Clone)]
pub struct WebhookState {
    secret: Arc<[u8]>,
    main_branch: BranchName,
    handler: Arc<dyn PushHandler>,
    checks: Arc<Mutex<JoinSet<()>>>,
}

impl WebhookState {
    /// `main_branch` is the only branch whose pushes are dispatched to
    /// `handler`.
    pub fn new(
        secret: impl AsRef<[u8]>,
        main_branch: BranchName,
        handler: Arc<dyn PushHandler>,
    ) -> Self {
        Self {
            secret: Arc::from(secret.as_ref()),
            main_branch,
            handler,
            checks: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    fn checks(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.checks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_check(&self, future: impl std::future::Future<Output = ()> + Send + 'static) {
        let mut checks = self.checks();
        while let Some(finished) = checks.try_join_next() {
            log_join_error(finished);
        }
        checks.spawn(future);
    }

    /// Waits for every check started so far to finish.
    pub async fn drain(&self) {
        let mut checks = std::mem::take(&mut *self.checks());
        if !checks.is_empty() {
            info!(pending = checks.len(), "Waiting for running checks");
        }
        while let Some(finished) = checks.join_next().await {
            log_join_error(finished);
        }
    }
}

fn log_join_error(result: Result<(), JoinError>) {
    if let Err(e) = result {
        error!(error = %e, "Push check task did not complete");
    }
}

/// Builds the router: `POST /event_handler` and `GET /health`.
pub fn webhook_router(state: WebhookState) -> Router {
    Router::new()
        .route("/event_handler", post(receive_event))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn receive_event(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, WebhookRejection> {
    let event = header(&headers, EVENT_HEADER).to_string();
    let delivery = header(&headers, DELIVERY_HEADER).to_string();
    let span = info_span!("webhook_delivery", %event, %delivery);

    async move {
        verify_request(&state.secret, &headers, &body)?;

        let payload: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|e| WebhookRejection::MalformedPayload(e.to_string()))?;

        if event != "push" {
            debug!("Ignoring non-push event");
            return Ok(StatusCode::OK);
        }

        let payload = serde_json::from_value::<PushPayload>(payload)
            .map_err(|e| WebhookRejection::MalformedPayload(e.to_string()))?;
        if payload.git_ref != state.main_branch.to_ref() {
            debug!(git_ref = %payload.git_ref, "Push is not to the main branch, ignoring");
            return Ok(StatusCode::OK);
        }

        let push = payload
            .into_event()
            .map_err(WebhookRejection::MalformedPayload)?;
        info!(repository = %push.repository, git_ref = %push.git_ref, "Received push");

        let handler = Arc::clone(&state.handler);
        state.spawn_check(
            async move {
                if let Err(e) = handler.handle_push(push).await {
                    error!(error = %e, "Push check failed");
                }
            }
            .instrument(Span::current()),
        );
        Ok(StatusCode::ACCEPTED)
    }
    .instrument(span)
    .await
}

/// Serves the webhook routes on `addr` until Ctrl-C, then waits for running
/// checks to finish.
pub async fn serve(addr: SocketAddr, state: WebhookState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening for webhook deliveries");
    axum::serve(listener, webhook_router(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    state.drain().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use articles::{HostError, PushEvent};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use tokio::io::AsyncWriteExt;
    use tokio::sync::Notify;
    use tower::ServiceExt;

    use super::*;
    use crate::signature::{sign_sha256, SIGNATURE_256_HEADER};

    const SECRET: &str = "webhook-secret";

    #[derive(Default)]
    struct RecordingHandler {
        events: Mutex<Vec<PushEvent>>,
        fail: bool,
    }

    #[async_trait]
    impl PushHandler for RecordingHandler {
        async fn handle_push(&self, event: PushEvent) -> Result<(), HostError> {
            self.events.lock().unwrap().push(event);
            if self.fail {
                return Err(HostError::Unauthorized {
                    message: "token exchange failed".into(),
                });
            }
            Ok(())
        }
    }

    /// Records each step of a multi-request unpublish with a pause between
    /// them.
    #[derive(Default)]
    struct SlowHandler {
        steps: Mutex<Vec<&'static str>>,
        done: Notify,
    }

    #[async_trait]
    impl PushHandler for SlowHandler {
        async fn handle_push(&self, _event: PushEvent) -> Result<(), HostError> {
            self.steps.lock().unwrap().push("branch created");
            tokio::time::sleep(Duration::from_millis(500)).await;
            self.steps.lock().unwrap().push("file committed");
            self.done.notify_one();
            Ok(())
        }
    }

    fn state(handler: Arc<dyn PushHandler>) -> WebhookState {
        WebhookState::new(SECRET, BranchName::new("master").unwrap(), handler)
    }

    fn push_body() -> Vec<u8> {
        serde_json::to_vec(&json!({
            "ref": "refs/heads/master",
            "repository": { "full_name": "ombulabs/blog" },
            "installation": { "id": 7 }
        }))
        .unwrap()
    }

    fn delivery(event: &str, body: Vec<u8>, signature: Option<String>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/event_handler")
            .header("content-type", "application/json")
            .header(EVENT_HEADER, event)
            .header(DELIVERY_HEADER, "72d3162e-cc78-11e3-81ab-4c9367dc0958");
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_256_HEADER, signature);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn signed(event: &str, body: Vec<u8>) -> Request<Body> {
        let signature = sign_sha256(SECRET.as_bytes(), &body);
        delivery(event, body, Some(signature))
    }

    #[tokio::test]
    async fn dispatches_signed_push() {
        let handler = Arc::new(RecordingHandler::default());
        let state = state(handler.clone());
        let resp = webhook_router(state.clone())
            .oneshot(signed("push", push_body()))
            .await
            .unwrap();
        state.drain().await;

        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        let events = handler.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].repository.as_str(), "ombulabs/blog");
        assert_eq!(events[0].installation.as_u64(), 7);
    }

    #[tokio::test]
    async fn rejects_unsigned_delivery_before_parsing() {
        let handler = Arc::new(RecordingHandler::default());
        let state = state(handler.clone());
        let resp = webhook_router(state.clone())
            .oneshot(delivery("push", b"not json".to_vec(), None))
            .await
            .unwrap();
        state.drain().await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(handler.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_signature_for_other_body() {
        let handler = Arc::new(RecordingHandler::default());
        let state = state(handler.clone());
        let signature = sign_sha256(SECRET.as_bytes(), b"{}");
        let resp = webhook_router(state.clone())
            .oneshot(delivery("push", push_body(), Some(signature)))
            .await
            .unwrap();
        state.drain().await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(handler.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let handler = Arc::new(RecordingHandler::default());
        let state = state(handler.clone());
        let resp = webhook_router(state.clone())
            .oneshot(signed("push", b"{\"ref\":".to_vec()))
            .await
            .unwrap();
        state.drain().await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(handler.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn ignores_other_events() {
        let handler = Arc::new(RecordingHandler::default());
        let state = state(handler.clone());
        let body = serde_json::to_vec(&json!({ "zen": "Keep it logically awesome." })).unwrap();
        let resp = webhook_router(state.clone())
            .oneshot(signed("ping", body))
            .await
            .unwrap();
        state.drain().await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(handler.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn ignores_pushes_to_other_branches_without_installation() {
        let handler = Arc::new(RecordingHandler::default());
        let state = state(handler.clone());
        let body = serde_json::to_vec(&json!({
            "ref": "refs/heads/feature",
            "repository": { "full_name": "ombulabs/blog" }
        }))
        .unwrap();
        let resp = webhook_router(state.clone())
            .oneshot(signed("push", body))
            .await
            .unwrap();
        state.drain().await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(handler.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn main_branch_push_without_installation_is_bad_request() {
        let handler = Arc::new(RecordingHandler::default());
        let state = state(handler.clone());
        let body = serde_json::to_vec(&json!({
            "ref": "refs/heads/master",
            "repository": { "full_name": "ombulabs/blog" }
        }))
        .unwrap();
        let resp = webhook_router(state.clone())
            .oneshot(signed("push", body))
            .await
            .unwrap();
        state.drain().await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(handler.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn handler_failure_is_logged_after_accepting() {
        let handler = Arc::new(RecordingHandler {
            fail: true,
            ..Default::default()
        });
        let state = state(handler.clone());
        let resp = webhook_router(state.clone())
            .oneshot(signed("push", push_body()))
            .await
            .unwrap();
        state.drain().await;

        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(handler.events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn check_survives_client_disconnect() {
        let handler = Arc::new(SlowHandler::default());
        let state = state(handler.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = webhook_router(state.clone());
        tokio::spawn(async move { axum::serve(listener, router).await });

        let body = push_body();
        let signature = sign_sha256(SECRET.as_bytes(), &body);
        let head = format!(
            "POST /event_handler HTTP/1.1\r\nhost: {addr}\r\ncontent-type: application/json\r\n\
             {EVENT_HEADER}: push\r\n{SIGNATURE_256_HEADER}: {signature}\r\n\
             content-length: {}\r\n\r\n",
            body.len()
        );
        let mut client = tokio::net::TcpStream::connect(addr).await.unwrap();
        client.write_all(head.as_bytes()).await.unwrap();
        client.write_all(&body).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(client);

        tokio::time::timeout(Duration::from_secs(2), handler.done.notified())
            .await
            .expect("check did not finish");
        assert_eq!(
            *handler.steps.lock().unwrap(),
            ["branch created", "file committed"]
        );
    }

    #[tokio::test]
    async fn drain_waits_for_running_checks() {
        let handler = Arc::new(SlowHandler::default());
        let state = state(handler.clone());
        let resp = webhook_router(state.clone())
            .oneshot(signed("push", push_body()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        state.drain().await;
        assert_eq!(handler.steps.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn health_check() {
        let resp = webhook_router(state(Arc::new(RecordingHandler::default())))
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
    }
}
