//! HTTP client for the chat completions endpoint

use thiserror::Error;

use crate::conversation::Message;

use super::types::{ChatRequest, ChatResponse};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("API key not set (build with OPENAI_API_KEY or export it)")]
    MissingKey,
    #[error("chat API error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Resolve the API credential: baked in at build time, env var as fallback.
pub fn api_key() -> Result<String, ChatError> {
    if let Some(key) = option_env!("OPENAI_API_KEY") {
        return Ok(key.to_string());
    }
    std::env::var("OPENAI_API_KEY").map_err(|_| ChatError::MissingKey)
}

/// Client for one chat completions endpoint. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl ChatClient {
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }

    /// Send the full message sequence and return the assistant's reply.
    ///
    /// One request per call; no retry, no explicit timeout. Any non-2xx
    /// status or unparseable body comes back as a single error.
    pub async fn complete(&self, model: &str, messages: &[Message]) -> Result<String, ChatError> {
        let request = ChatRequest { model, messages };

        tracing::debug!(model, turns = messages.len(), "sending chat request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        parse_response(status, body)
    }
}

/// Route a response down the reply path or the single error path.
///
/// A non-2xx status always wins, whatever the body contains.
fn parse_response(status: reqwest::StatusCode, body: String) -> Result<String, ChatError> {
    if !status.is_success() {
        return Err(ChatError::Http {
            status: status.as_u16(),
            body,
        });
    }

    extract_reply(&body)
}

/// Pull `choices[0].message.content` out of a response body, trimmed.
fn extract_reply(body: &str) -> Result<String, ChatError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| ChatError::Malformed(e.to_string()))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ChatError::Malformed("response has no choices".to_string()))?;

    Ok(choice.message.content.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_non_2xx_never_yields_a_reply() {
        // Even a well-formed success body must not reach the reply path
        let body = r#"{"choices":[{"message":{"content":"X"}}]}"#.to_string();
        let err = parse_response(StatusCode::INTERNAL_SERVER_ERROR, body).unwrap_err();
        match err {
            ChatError::Http { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("choices"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_2xx_carries_body_through() {
        let err = parse_response(StatusCode::UNAUTHORIZED, "bad key".to_string()).unwrap_err();
        assert!(matches!(err, ChatError::Http { status: 401, .. }));
    }

    #[test]
    fn test_2xx_goes_through_extraction() {
        let body = r#"{"choices":[{"message":{"content":" X "}}]}"#.to_string();
        assert_eq!(parse_response(StatusCode::OK, body).unwrap(), "X");
    }

    #[test]
    fn test_extract_reply_trims_whitespace() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  X \n"}}]}"#;
        assert_eq!(extract_reply(body).unwrap(), "X");
    }

    #[test]
    fn test_extract_reply_takes_first_choice() {
        let body = r#"{"choices":[
            {"message":{"content":"first"}},
            {"message":{"content":"second"}}
        ]}"#;
        assert_eq!(extract_reply(body).unwrap(), "first");
    }

    #[test]
    fn test_extract_reply_ignores_extra_fields() {
        let body = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "hi"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 2}
        }"#;
        assert_eq!(extract_reply(body).unwrap(), "hi");
    }

    #[test]
    fn test_extract_reply_empty_choices() {
        let err = extract_reply(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, ChatError::Malformed(_)));
    }

    #[test]
    fn test_extract_reply_malformed_json() {
        let err = extract_reply("not json").unwrap_err();
        assert!(matches!(err, ChatError::Malformed(_)));
    }
}
