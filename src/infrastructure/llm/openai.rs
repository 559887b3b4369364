use crate::domain::errors::ForecastError;
use crate::domain::forecast::ParsedIntent;
use crate::domain::ports::IntentParser;
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, join_url};
use crate::infrastructure::llm::prompt::{system_prompt, user_prompt};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const TEMPERATURE: f64 = 0.1;
const MAX_TOKENS: u32 = 500;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Intent parser backed by an OpenAI-compatible chat completions endpoint
pub struct OpenAiIntentParser {
    client: ClientWithMiddleware,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiIntentParser {
    pub fn new(api_key: String, model: String, base_url: String, timeout: Duration) -> Self {
        Self {
            client: HttpClientFactory::create_client_with_timeout(timeout),
            api_key,
            model,
            base_url,
        }
    }

    fn build_request<'a>(&'a self, query: &str, context: &str) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt(context),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(query),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        }
    }
}

#[async_trait]
impl IntentParser for OpenAiIntentParser {
    async fn parse(&self, query: &str, context: &str) -> Result<ParsedIntent, ForecastError> {
        let url = join_url(&self.base_url, "chat/completions");
        let body = serde_json::to_string(&self.build_request(query, context))
            .map_err(|e| ForecastError::upstream(format!("failed to encode request: {}", e)))?;

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| ForecastError::upstream(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ForecastError::upstream(format!(
                "{} returned {}: {}",
                self.model, status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ForecastError::upstream(format!("invalid completion body: {}", e)))?;
        let content = first_content(completion)?;
        debug!("{} raw intent: {}", self.model, content);

        ParsedIntent::from_json(&content)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

fn first_content(completion: ChatCompletionResponse) -> Result<String, ForecastError> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| ForecastError::upstream("completion has no content"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forecast::ForecastIntent;

    fn parser() -> OpenAiIntentParser {
        OpenAiIntentParser::new(
            "sk-test".to_string(),
            "gpt-4-turbo-preview".to_string(),
            "https://api.openai.com/v1".to_string(),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_request_shape() {
        let p = parser();
        let json = serde_json::to_value(p.build_request("revenue next year", "ctx")).unwrap();

        assert_eq!(json["model"], "gpt-4-turbo-preview");
        assert_eq!(json["temperature"], 0.1);
        assert_eq!(json["max_tokens"], 500);
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert!(
            json["messages"][1]["content"]
                .as_str()
                .unwrap()
                .contains("revenue next year")
        );
    }

    #[test]
    fn test_completion_content_is_decoded() {
        let completion: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "{\"intent\": \"forecast_smb_revenue\", \"timeframe_months\": 6, \"assumption_overrides\": {}}"}}]}"#,
        )
        .unwrap();

        let content = first_content(completion).unwrap();
        let parsed = ParsedIntent::from_json(&content).unwrap();
        assert_eq!(parsed.intent, ForecastIntent::ForecastSmbRevenue);
    }

    #[test]
    fn test_empty_completion_is_upstream_failure() {
        let completion: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            first_content(completion),
            Err(ForecastError::UpstreamParseFailure { .. })
        ));

        let completion: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(first_content(completion).is_err());
    }
}
