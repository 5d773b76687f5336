//! HTTP route handlers for the relay bot.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{error, info, warn};

use crate::platform::events::WebhookPayload;
use crate::platform::signature;

use super::state::AppState;

/// Signature header set by the platform on every delivery.
pub const SIGNATURE_HEADER: &str = "X-Line-Signature";

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/callback", post(callback))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "relay-bot",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Webhook callback: verify the delivery, answer text messages, always
/// acknowledge with `OK` once the signature check has passed.
async fn callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let header_signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if !signature::verify(&state.channel_secret, &body, header_signature) {
        warn!("webhook signature verification failed");
        return (StatusCode::BAD_REQUEST, "invalid signature");
    }

    let payload: WebhookPayload = match serde_json::from_str(&body) {
        Ok(payload) => payload,
        Err(err) => {
            // A signed but unparseable delivery is acknowledged so the
            // platform does not redeliver it forever.
            warn!(error = %err, "discarding malformed webhook payload");
            return (StatusCode::OK, "OK");
        }
    };

    for event in &payload.events {
        if !event.is_text_message() {
            continue;
        }
        let Some(reply_token) = event.reply_token.as_deref() else {
            warn!("text message event without reply token");
            continue;
        };
        let Some(question) = event
            .message
            .as_ref()
            .and_then(|message| message.text.as_deref())
        else {
            continue;
        };

        let conversation = event.conversation_id();
        match state.orchestrator.process(&conversation, question).await {
            Ok(answer) => {
                info!(conversation = %conversation, "answered text message");
                if let Err(err) = state.reply_client.reply(reply_token, &answer).await {
                    error!(conversation = %conversation, error = %err, "reply delivery failed");
                }
            }
            Err(err) => {
                error!(conversation = %conversation, error = %err, "dialogue processing failed");
            }
        }
    }

    (StatusCode::OK, "OK")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::config::{StorageConfig, WindowConfig};
    use crate::dialogue::record::ChatMessage;
    use crate::dialogue::store::SqliteDialogueStore;
    use crate::llm::chat::{CompletionBackend, CompletionFuture};
    use crate::platform::client::{ReplyClient, ReplyFuture};
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct FixedBackend(&'static str);

    impl CompletionBackend for FixedBackend {
        fn complete(&self, _messages: &[ChatMessage]) -> CompletionFuture<'_> {
            let answer = self.0.to_string();
            Box::pin(async move { Ok(answer) })
        }
    }

    #[derive(Default)]
    struct RecordingReplyClient {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl ReplyClient for RecordingReplyClient {
        fn reply(&self, reply_token: &str, text: &str) -> ReplyFuture<'_> {
            let entry = (reply_token.to_string(), text.to_string());
            Box::pin(async move {
                self.sent.lock().unwrap().push(entry);
                Ok(())
            })
        }
    }

    async fn make_state(
        secret: &str,
        reply_client: Arc<RecordingReplyClient>,
    ) -> Arc<AppState> {
        let store = SqliteDialogueStore::in_memory(&StorageConfig::default(), WindowConfig::default())
            .await
            .unwrap();
        AppState::new(
            secret,
            Arc::new(store),
            Arc::new(FixedBackend("four")),
            reply_client,
        )
    }

    fn signed_request(secret: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/callback")
            .header(SIGNATURE_HEADER, signature::sign(secret, body))
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    const TEXT_DELIVERY: &str = r#"{
        "events": [{
            "type": "message",
            "replyToken": "tok-1",
            "source": {"type": "user", "userId": "U123"},
            "message": {"type": "text", "id": "1", "text": "What is 2+2?"}
        }]
    }"#;

    #[tokio::test]
    async fn test_missing_signature_rejected() {
        let replies = Arc::new(RecordingReplyClient::default());
        let app = create_router(make_state("secret", replies).await);

        let request = Request::builder()
            .method("POST")
            .uri("/callback")
            .body(Body::from(TEXT_DELIVERY))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bad_signature_rejected() {
        let replies = Arc::new(RecordingReplyClient::default());
        let app = create_router(make_state("secret", replies.clone()).await);

        let request = Request::builder()
            .method("POST")
            .uri("/callback")
            .header(SIGNATURE_HEADER, signature::sign("wrong secret", TEXT_DELIVERY))
            .body(Body::from(TEXT_DELIVERY))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(replies.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_text_message_answered_and_acknowledged() {
        let replies = Arc::new(RecordingReplyClient::default());
        let app = create_router(make_state("secret", replies.clone()).await);

        let response = app
            .oneshot(signed_request("secret", TEXT_DELIVERY))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"OK");

        let sent = replies.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], ("tok-1".to_string(), "four".to_string()));
    }

    #[tokio::test]
    async fn test_non_text_events_ignored() {
        let replies = Arc::new(RecordingReplyClient::default());
        let app = create_router(make_state("secret", replies.clone()).await);

        let body = r#"{"events":[{"type":"follow","source":{"type":"user","userId":"U1"}}]}"#;
        let response = app.oneshot(signed_request("secret", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(replies.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_still_acknowledged() {
        let replies = Arc::new(RecordingReplyClient::default());
        let app = create_router(make_state("secret", replies.clone()).await);

        let response = app
            .oneshot(signed_request("secret", "not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(replies.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_health_reports_ok() {
        let replies = Arc::new(RecordingReplyClient::default());
        let app = create_router(make_state("secret", replies).await);

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
