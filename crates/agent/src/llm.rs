use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use meesaya_core::config::LlmConfig;
use meesaya_core::domain::conversation::ConversationTurn;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm api key is not configured")]
    MissingApiKey,
    #[error("llm request timed out")]
    Timeout,
    #[error("llm transport failure: {0}")]
    Transport(String),
    #[error("llm endpoint returned status {status}")]
    Status { status: u16, body: String },
    #[error("llm response was malformed: {0}")]
    Malformed(String),
    #[error("llm response carried no content")]
    Empty,
}

/// Text generation over an ordered chat transcript.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(
        &self,
        turns: &[ConversationTurn],
        temperature: f32,
    ) -> Result<String, LlmError>;
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ConversationTurn],
    temperature: f32,
}

/// OpenAI-compatible `chat/completions` client (OpenRouter by default).
pub struct OpenRouterClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: SecretString,
}

impl OpenRouterClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key.clone().ok_or(LlmError::MissingApiKey)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| LlmError::Transport(error.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn transport_error(error: reqwest::Error) -> LlmError {
    if error.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Transport(error.to_string())
    }
}

/// Pulls `choices[0].message.content` out of a completion payload.
pub fn completion_text(payload: &Value) -> Result<String, LlmError> {
    let choices = payload
        .get("choices")
        .and_then(Value::as_array)
        .ok_or_else(|| LlmError::Malformed("missing `choices` array".to_string()))?;
    let content = choices
        .first()
        .and_then(|choice| choice.pointer("/message/content"))
        .and_then(Value::as_str)
        .ok_or_else(|| LlmError::Malformed("missing `choices[0].message.content`".to_string()))?;

    if content.trim().is_empty() {
        return Err(LlmError::Empty);
    }
    Ok(content.to_string())
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    async fn generate(
        &self,
        turns: &[ConversationTurn],
        temperature: f32,
    ) -> Result<String, LlmError> {
        let request = ChatCompletionRequest { model: &self.model, messages: turns, temperature };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                event_name = "llm.status",
                status = status.as_u16(),
                model = %self.model,
                "llm endpoint rejected completion request"
            );
            return Err(LlmError::Status { status: status.as_u16(), body });
        }

        let payload: Value = response.json().await.map_err(|error| {
            if error.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::Malformed(error.to_string())
            }
        })?;
        completion_text(&payload)
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use serde_json::json;

    use meesaya_core::config::AppConfig;
    use meesaya_core::domain::conversation::ConversationTurn;

    use super::{completion_text, ChatCompletionRequest, LlmError, OpenRouterClient};

    #[test]
    fn completion_text_reads_first_choice() {
        let payload = json!({
            "choices": [
                {"message": {"role": "assistant", "content": "မင်္ဂလာပါ"}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ]
        });

        assert_eq!(completion_text(&payload).expect("content"), "မင်္ဂလာပါ");
    }

    #[test]
    fn completion_text_rejects_missing_or_blank_content() {
        assert!(matches!(
            completion_text(&json!({"error": {"message": "rate limited"}})),
            Err(LlmError::Malformed(_))
        ));
        assert!(matches!(completion_text(&json!({"choices": []})), Err(LlmError::Malformed(_))));
        assert!(matches!(
            completion_text(&json!({"choices": [{"message": {"content": "  "}}]})),
            Err(LlmError::Empty)
        ));
    }

    #[test]
    fn request_payload_uses_openai_message_shape() {
        let turns = vec![ConversationTurn::system("persona"), ConversationTurn::user("hi")];
        let request = ChatCompletionRequest { model: "m", messages: &turns, temperature: 0.3 };

        let json = serde_json::to_value(&request).expect("serialize request");

        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert!((json["temperature"].as_f64().expect("temperature") - 0.3).abs() < 1e-6);
    }

    #[test]
    fn client_requires_api_key() {
        let mut config = AppConfig::default().llm;
        config.api_key = None;
        assert!(matches!(OpenRouterClient::from_config(&config), Err(LlmError::MissingApiKey)));

        config.api_key = Some(SecretString::from("sk-test".to_string()));
        config.base_url = "https://llm.example/api/v1/".to_string();
        let client = OpenRouterClient::from_config(&config).expect("client");
        assert_eq!(client.endpoint, "https://llm.example/api/v1/chat/completions");
        assert_eq!(client.model(), config.model);
    }
}
