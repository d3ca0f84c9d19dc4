use std::sync::Arc;

use axum::{body::Bytes, extract::State, routing::get, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use meesaya_agent::ConversationOrchestrator;
use meesaya_core::domain::conversation::ConversationId;

pub const SERVICE_STATUS: &str = "MeeSaya power-backup advisor active";

/// A chat message worth answering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat: ConversationId,
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct TelegramUpdate {
    #[serde(default)]
    message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
struct TelegramMessage {
    #[serde(default)]
    chat: Option<TelegramChat>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramChat {
    id: i64,
}

/// Pulls chat id and text out of an update; edits, stickers and the like yield `None`.
pub fn inbound_from_update(update: &Value) -> Option<InboundMessage> {
    let update: TelegramUpdate = serde_json::from_value(update.clone()).ok()?;
    let message = update.message?;
    let chat = message.chat?;
    let text = message.text.filter(|text| !text.trim().is_empty())?;
    Some(InboundMessage { chat: ConversationId(chat.id.to_string()), text })
}

#[derive(Clone)]
pub struct WebhookState {
    inbound: mpsc::UnboundedSender<InboundMessage>,
}

pub fn router(inbound: mpsc::UnboundedSender<InboundMessage>) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/webhook", post(receive_update))
        .with_state(WebhookState { inbound })
}

pub async fn status() -> Json<Value> {
    Json(json!({ "status": SERVICE_STATUS }))
}

/// Acknowledges immediately; answering happens off the request path.
pub async fn receive_update(State(state): State<WebhookState>, body: Bytes) -> Json<Value> {
    let update: Value = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(error) => {
            warn!(event_name = "webhook.invalid_body", error = %error, "rejected webhook body");
            return Json(json!({ "status": "error" }));
        }
    };

    match inbound_from_update(&update) {
        Some(message) => {
            if state.inbound.send(message).is_err() {
                warn!(event_name = "webhook.worker_gone", "message worker is not running");
            }
        }
        None => debug!(event_name = "webhook.ignored", "update carried no text message"),
    }
    Json(json!({ "status": "ok" }))
}

/// Answers each queued message on its own task.
pub fn spawn_worker(
    orchestrator: Arc<ConversationOrchestrator>,
    mut inbound: mpsc::UnboundedReceiver<InboundMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = inbound.recv().await {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move {
                let outcome = orchestrator.handle_message(&message.chat, &message.text).await;
                info!(
                    event_name = "webhook.message_answered",
                    correlation_id = %outcome.correlation_id,
                    chat_id = %message.chat,
                    steps = outcome.trace.len(),
                    "inbound message answered"
                );
            });
        }
        debug!(event_name = "webhook.worker_stopped", "inbound channel closed");
    })
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    use meesaya_core::domain::conversation::ConversationId;

    use super::{inbound_from_update, router, InboundMessage, SERVICE_STATUS};

    async fn post_webhook(body: &'static str) -> (StatusCode, Value, Vec<InboundMessage>) {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .expect("request");

        let response = router(sender).oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.expect("body");
        let payload: Value = serde_json::from_slice(&bytes).expect("json body");

        let mut queued = Vec::new();
        while let Ok(message) = receiver.try_recv() {
            queued.push(message);
        }
        (status, payload, queued)
    }

    #[test]
    fn text_messages_become_inbound_messages() {
        let update = json!({
            "update_id": 1,
            "message": {"message_id": 5, "chat": {"id": 123456, "type": "private"}, "text": "2000W 4h"}
        });

        assert_eq!(
            inbound_from_update(&update),
            Some(InboundMessage {
                chat: ConversationId("123456".to_string()),
                text: "2000W 4h".to_string()
            })
        );
    }

    #[test]
    fn updates_without_chat_or_text_are_ignored() {
        assert_eq!(inbound_from_update(&json!({"update_id": 1})), None);
        assert_eq!(inbound_from_update(&json!({"message": {"text": "hi"}})), None);
        assert_eq!(inbound_from_update(&json!({"message": {"chat": {"id": 1}}})), None);
        assert_eq!(inbound_from_update(&json!({"message": {"chat": {"id": 1}, "text": "  "}})), None);
        assert_eq!(
            inbound_from_update(&json!({"message": {"chat": {"id": 1}, "sticker": {}}})),
            None
        );
    }

    #[tokio::test]
    async fn webhook_acknowledges_and_queues_text_messages() {
        let (status, payload, queued) =
            post_webhook(r#"{"message": {"chat": {"id": -100}, "text": "Growatt price?"}}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload, json!({"status": "ok"}));
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].chat, ConversationId("-100".to_string()));
    }

    #[tokio::test]
    async fn webhook_acknowledges_non_text_updates_without_queueing() {
        let (status, payload, queued) = post_webhook(r#"{"edited_message": {}}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload, json!({"status": "ok"}));
        assert!(queued.is_empty());
    }

    #[tokio::test]
    async fn webhook_reports_error_for_unparsable_body() {
        let (status, payload, queued) = post_webhook("not json").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload, json!({"status": "error"}));
        assert!(queued.is_empty());
    }

    #[tokio::test]
    async fn root_reports_service_status() {
        let (sender, _receiver) = mpsc::unbounded_channel();
        let request = Request::builder().uri("/").body(Body::empty()).expect("request");

        let response = router(sender).oneshot(request).await.expect("response");
        let bytes = to_bytes(response.into_body(), 1024).await.expect("body");
        let payload: Value = serde_json::from_slice(&bytes).expect("json body");

        assert_eq!(payload["status"], SERVICE_STATUS);
    }
}
