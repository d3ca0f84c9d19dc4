use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use meesaya_agent::messenger::{MessengerError, OutboundMessenger};
use meesaya_core::config::TelegramConfig;
use meesaya_core::domain::conversation::ConversationId;

/// Bot API client used for replies, typing indicators and webhook registration.
pub struct TelegramMessenger {
    client: Client,
    api_base_url: String,
    bot_token: SecretString,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramMessenger {
    pub fn from_config(config: &TelegramConfig) -> Self {
        Self {
            client: Client::new(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base_url, self.bot_token.expose_secret())
    }

    async fn call(&self, method: &str, payload: Value) -> Result<(), MessengerError> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&payload)
            .send()
            .await
            // reqwest errors can echo the URL, which carries the bot token.
            .map_err(|error| MessengerError::Transport(error.without_url().to_string()))?;

        let status = response.status();
        let body: Option<ApiResponse> = response.json().await.ok();
        match body {
            Some(ApiResponse { ok: true, .. }) if status.is_success() => {
                debug!(event_name = "telegram.call", method, "telegram call succeeded");
                Ok(())
            }
            other => Err(MessengerError::Rejected {
                status: status.as_u16(),
                description: other
                    .and_then(|api| api.description)
                    .unwrap_or_else(|| "telegram call failed".to_string()),
            }),
        }
    }

    /// Points the bot's webhook at `{public_url}/webhook`.
    pub async fn set_webhook(&self, public_url: &str) -> Result<String, MessengerError> {
        let webhook_url = webhook_url(public_url);
        self.call("setWebhook", json!({ "url": webhook_url })).await?;
        Ok(webhook_url)
    }
}

pub fn webhook_url(public_url: &str) -> String {
    format!("{}/webhook", public_url.trim_end_matches('/'))
}

/// Telegram's legacy Markdown only understands single-asterisk bold.
pub fn markdown_safe(text: &str) -> String {
    text.replace("**", "*")
}

pub fn message_payload(chat: &ConversationId, text: &str) -> Value {
    json!({ "chat_id": chat.0, "text": markdown_safe(text), "parse_mode": "Markdown" })
}

pub fn typing_payload(chat: &ConversationId) -> Value {
    json!({ "chat_id": chat.0, "action": "typing" })
}

#[async_trait]
impl OutboundMessenger for TelegramMessenger {
    async fn send_typing(&self, chat: &ConversationId) -> Result<(), MessengerError> {
        self.call("sendChatAction", typing_payload(chat)).await
    }

    async fn send_message(&self, chat: &ConversationId, text: &str) -> Result<(), MessengerError> {
        self.call("sendMessage", message_payload(chat, text)).await
    }
}
