//! Language model client

use std::time::Instant;

use crate::config::{LlmConfig, LlmEngine};
use crate::{Error, Result};

/// Chat model used for responses
const CHAT_MODEL: &str = "gpt-3.5-turbo";

/// Maximum tokens in a generated reply
const MAX_TOKENS: u32 = 2048;

/// A generated reply with its latency measurements
#[derive(Debug, Clone, PartialEq)]
pub struct LlmReply {
    /// The generated text, whitespace-trimmed
    pub text: String,
    /// Latency to the first token; always 0.0 in non-streaming mode
    pub first_token_secs: f64,
    /// Latency for the complete response
    pub complete_secs: f64,
}

/// Generates a reply to a transcript via a remote language model
#[async_trait::async_trait]
pub trait Responder: Send + Sync {
    /// Send the transcript (behind the fixed system instruction) and return
    /// the reply with its timings
    ///
    /// # Errors
    ///
    /// Returns error if the remote call fails or the response shape is
    /// unexpected
    async fn query(&self, text: &str) -> Result<LlmReply>;
}

/// Build the responder selected by the config
///
/// # Errors
///
/// Returns error if the API key is missing
pub fn build_responder(config: &LlmConfig) -> Result<Box<dyn Responder>> {
    match config.engine {
        LlmEngine::OpenAi => Ok(Box::new(OpenAiResponder::new(config)?)),
    }
}

#[derive(serde::Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(serde::Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

/// Chat completion request with the fixed sampling parameters
#[derive(serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
    top_p: f64,
    frequency_penalty: f64,
    presence_penalty: f64,
    response_format: ResponseFormat<'a>,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// OpenAI chat-completions responder
pub struct OpenAiResponder {
    client: reqwest::Client,
    api_key: String,
    system_prompt: String,
}

impl OpenAiResponder {
    /// Create a new OpenAI responder
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(config: &LlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for chat".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            system_prompt: config.system_prompt.clone(),
        })
    }
}

#[async_trait::async_trait]
impl Responder for OpenAiResponder {
    async fn query(&self, text: &str) -> Result<LlmReply> {
        tracing::debug!(chars = text.len(), "querying language model");
        let start = Instant::now();

        let request = ChatRequest {
            model: CHAT_MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 1.0,
            max_tokens: MAX_TOKENS,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            response_format: ResponseFormat { kind: "text" },
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "chat request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "chat API error");
            return Err(Error::Llm(format!("OpenAI chat error {status}: {body}")));
        }

        let result: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse chat response");
            e
        })?;

        let reply = extract_reply(&result)?;
        let complete_secs = start.elapsed().as_secs_f64();

        tracing::info!(chars = reply.len(), complete_secs, "response generated");

        Ok(LlmReply {
            text: reply,
            // Non-streaming call: there is no first-token timestamp to report
            first_token_secs: 0.0,
            complete_secs,
        })
    }
}

/// Pull the top choice's message content out of the response
fn extract_reply(response: &ChatResponse) -> Result<String> {
    response
        .choices
        .first()
        .and_then(|c| c.message.content.as_deref())
        .map(|text| text.trim().to_string())
        .ok_or_else(|| Error::Llm("chat response has no message content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_carries_fixed_sampling_parameters() {
        let request = ChatRequest {
            model: CHAT_MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "be brief",
                },
                ChatMessage {
                    role: "user",
                    content: "hello",
                },
            ],
            temperature: 1.0,
            max_tokens: MAX_TOKENS,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            response_format: ResponseFormat { kind: "text" },
        };

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&request).unwrap()).unwrap();

        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["temperature"], 1.0);
        assert_eq!(json["max_tokens"], 2048);
        assert_eq!(json["top_p"], 1.0);
        assert_eq!(json["frequency_penalty"], 0.0);
        assert_eq!(json["presence_penalty"], 0.0);
        assert_eq!(json["response_format"]["type"], "text");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "hello");
    }

    #[test]
    fn test_extract_reply_trims() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"  hi there \n"}}]}"#,
        )
        .unwrap();

        assert_eq!(extract_reply(&response).unwrap(), "hi there");
    }

    #[test]
    fn test_extract_reply_no_choices_is_error() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(extract_reply(&response), Err(Error::Llm(_))));
    }

    #[test]
    fn test_extract_reply_null_content_is_error() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(matches!(extract_reply(&response), Err(Error::Llm(_))));
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let config = LlmConfig {
            engine: LlmEngine::OpenAi,
            api_key: String::new(),
            system_prompt: "x".to_string(),
        };

        assert!(matches!(
            OpenAiResponder::new(&config),
            Err(Error::Config(_))
        ));
    }
}
