//! OpenAI-compatible chat completion backend
//!
//! Together and Groq both expose `/chat/completions` with bearer auth, so a
//! single implementation serves every provider preset.

use std::time::{Duration, Instant};

use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{CompletionError, CompletionModel, CompletionRequest, CompletionResponse, Usage};
use crate::config::ProviderSettings;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completion client for one provider
#[derive(Debug, Clone)]
pub struct ChatCompletionModel {
    client: ReqwestClient,
    settings: ProviderSettings,
}

impl ChatCompletionModel {
    /// Create a client with the given request timeout
    pub fn new(settings: ProviderSettings, timeout: Duration) -> Result<Self, CompletionError> {
        let client = ReqwestClient::builder().timeout(timeout).build()?;
        Ok(Self { client, settings })
    }

    /// Provider settings in use
    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }
}

impl CompletionModel for ChatCompletionModel {
    #[instrument(skip(self, request), fields(provider = %self.settings.provider, max_tokens = request.max_tokens))]
    async fn completion(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let start = Instant::now();
        let body = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.preamble,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            error!("API Error: {} - {}", status.as_u16(), response_text);
            return Err(CompletionError::Api {
                status_code: status.as_u16(),
                message: response_text,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&response_text).map_err(|e| {
            CompletionError::UnexpectedResponse(format!("Failed to parse response: {}", e))
        })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::UnexpectedResponse("no choices returned".into()))?;

        debug!(
            model = %self.settings.model,
            duration_ms = start.elapsed().as_millis() as u64,
            "Chat completion finished"
        );

        Ok(CompletionResponse {
            text: text.trim().to_string(),
            usage: parsed.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Provider;
    use mockito::{Matcher, Server};

    fn request() -> CompletionRequest {
        CompletionRequest {
            preamble: "system".to_string(),
            prompt: "user".to_string(),
            temperature: 0.1,
            max_tokens: 4096,
            json_mode: true,
        }
    }

    fn model_for(server: &Server) -> ChatCompletionModel {
        let settings = ProviderSettings::new(Provider::Together, "test-key")
            .with_endpoint(format!("{}/v1/chat/completions", server.url()));
        ChatCompletionModel::new(settings, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_completion_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo",
                "temperature": 0.1,
                "max_tokens": 4096,
                "response_format": {"type": "json_object"},
                "messages": [
                    {"role": "system", "content": "system"},
                    {"role": "user", "content": "user"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":"  {\"listings\":[]}\n"}}],
                    "usage":{"prompt_tokens":12,"completion_tokens":5}}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let response = model_for(&server).completion(request()).await.unwrap();
        assert_eq!(response.text, r#"{"listings":[]}"#);
        assert_eq!(response.usage.unwrap().prompt_tokens, 12);

        mock.assert_async().await;
    }

    #[test]
    fn test_json_mode_off_omits_response_format() {
        let body = ChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.1,
            max_tokens: 10,
            response_format: None,
        };

        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("response_format").is_none());
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[tokio::test]
    async fn test_server_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let err = model_for(&server).completion(request()).await.unwrap_err();
        match err {
            CompletionError::Api {
                status_code,
                message,
            } => {
                assert_eq!(status_code, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("expected API error, got {:?}", other),
        }

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_choices() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let err = model_for(&server).completion(request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::UnexpectedResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let settings = ProviderSettings::new(Provider::Groq, "k")
            .with_endpoint("http://127.0.0.1:1/v1/chat/completions");
        let model = ChatCompletionModel::new(settings, Duration::from_secs(2)).unwrap();

        let err = model.completion(request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::Http(_)));
    }
}
