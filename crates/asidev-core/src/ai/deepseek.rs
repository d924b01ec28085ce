use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::reveal::{reveal, CancelToken, ProgressFn, PRIMARY_STEP};
use crate::state::ChatMessage;

/// Fixed system instruction prepended to every request.
const SYSTEM_PROMPT: &str = "You are Asidev, an expert development assistant. \
You help programmers solve code problems, understand technical concepts, and \
improve their development skills.";

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Clone)]
pub struct DeepSeekClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl DeepSeekClient {
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Request one full completion for `history`.
    ///
    /// The remote service's native streaming mode is never used; the whole
    /// answer arrives in one round trip. When `on_progress` is supplied the
    /// text is then replayed through the reveal simulator before this
    /// returns, so the caller observes the complete typing animation (or,
    /// if `cancel` fires mid-replay, keeps the last prefix it was given).
    pub async fn complete(
        &self,
        history: &[ChatMessage],
        cancel: &CancelToken,
        mut on_progress: Option<ProgressFn>,
    ) -> Result<String, ApiError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: wire_messages(history),
            stream: false,
        };
        let url = format!("{}/v1/chat/completions", self.base_url);

        tracing::debug!(model = %self.model, turns = history.len(), "requesting completion");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response(status, &body));
        }

        let completion: CompletionResponse = response.json().await?;
        let text = completion
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .unwrap_or_default();

        if let Some(on_tick) = on_progress.as_mut() {
            reveal(&text, PRIMARY_STEP, cancel, |prefix| on_tick(prefix)).await;
        }

        Ok(text)
    }
}

/// The fixed system instruction followed by the conversation so far.
fn wire_messages(history: &[ChatMessage]) -> Vec<WireMessage<'_>> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(WireMessage {
        role: "system",
        content: SYSTEM_PROMPT,
    });
    messages.extend(history.iter().map(|m| WireMessage {
        role: m.role.as_str(),
        content: &m.content,
    }));
    messages
}

/// Map a non-success response to an `ApiError`, preferring the structured
/// `{"error":{"message":…}}` body over the transport's status text.
fn error_from_response(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Auth {
            status: status.as_u16(),
            message,
        },
        _ => ApiError::Protocol {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ChatRole;

    #[test]
    fn wire_history_is_prefixed_by_one_system_instruction() {
        let history = vec![
            ChatMessage::assistant("Hello!"),
            ChatMessage::user("How do I write a custom React hook?"),
        ];
        let messages = wire_messages(&history);

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, ChatRole::Assistant.as_str());
        assert_eq!(messages[2].role, "user");
        assert_eq!(messages[2].content, "How do I write a custom React hook?");
    }

    #[test]
    fn request_body_disables_streaming() {
        let history = vec![ChatMessage::user("hi")];
        let request = CompletionRequest {
            model: "deepseek-chat",
            messages: wire_messages(&history),
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["stream"], serde_json::Value::Bool(false));
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["model"], "deepseek-chat");
    }

    #[test]
    fn structured_error_body_message_is_surfaced() {
        let err = error_from_response(
            StatusCode::PAYMENT_REQUIRED,
            r#"{"error":{"message":"Insufficient Balance"}}"#,
        );
        match err {
            ApiError::Protocol { status, message } => {
                assert_eq!(status, 402);
                assert!(message.contains("Insufficient Balance"));
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_body_falls_back_to_the_status_text() {
        let err = error_from_response(StatusCode::NOT_FOUND, "<html>gateway</html>");
        match err {
            ApiError::Protocol { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn credential_rejections_map_to_auth_errors() {
        let err = error_from_response(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"invalid api key"}}"#,
        );
        match err {
            ApiError::Auth { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid api key");
            }
            other => panic!("expected auth error, got {other:?}"),
        }
    }
}
