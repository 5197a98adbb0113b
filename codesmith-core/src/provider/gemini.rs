//! Google Gemini provider implementation
//!
//! Talks to the Gemini REST API: `generateContent` for blocking completions
//! and `streamGenerateContent?alt=sse` for streamed ones. The API key goes in
//! the `x-goog-api-key` header.

use super::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Google Gemini provider
pub struct GeminiProvider {
    client: Client,
    config: ProviderConfig,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(
                config.timeout_secs.unwrap_or(120),
            ))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or("https://generativelanguage.googleapis.com/v1beta")
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ProviderError::AuthenticationFailed)
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        self.config
            .default_model
            .as_deref()
            .unwrap_or("gemini-2.0-flash")
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model().to_string());
        let api_key = self.api_key()?;
        let api_request = GeminiRequest::from_completion(&request);

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url(),
                model
            ))
            .header("x-goog-api-key", api_key)
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();

            if status == 429 {
                return Err(ProviderError::RateLimited { retry_after: None });
            } else if status == 401 || status == 403 {
                return Err(ProviderError::AuthenticationFailed);
            }

            return Err(ProviderError::Api {
                status,
                message: text,
            });
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(api_response.into_completion(model))
    }

    async fn stream(&self, request: CompletionRequest) -> Result<StreamReceiver, ProviderError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model().to_string());
        let api_key = self.api_key()?;
        let api_request = GeminiRequest::from_completion(&request);

        let response = self
            .client
            .post(format!(
                "{}/models/{}:streamGenerateContent",
                self.base_url(),
                model
            ))
            .query(&[("alt", "sse")])
            .header("x-goog-api-key", api_key)
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();

            if status == 429 {
                return Err(ProviderError::RateLimited { retry_after: None });
            } else if status == 401 || status == 403 {
                return Err(ProviderError::AuthenticationFailed);
            }

            return Err(ProviderError::Api {
                status,
                message: text,
            });
        }

        // Create async stream from SSE response
        let stream = async_stream::stream! {
            use futures_util::StreamExt;

            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();
            let mut finished = false;

            while let Some(chunk_result) = byte_stream.next().await {
                match chunk_result {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));

                        // Process complete SSE events
                        while let Some(pos) = buffer.find("\n\n") {
                            let event = buffer[..pos].to_string();
                            buffer = buffer[pos + 2..].to_string();

                            for line in event.lines() {
                                if let Some(data) = line.strip_prefix("data: ") {
                                    if let Ok(chunk) =
                                        serde_json::from_str::<GenerateContentResponse>(data)
                                    {
                                        let GenerateContentResponse {
                                            candidates,
                                            usage_metadata,
                                        } = chunk;

                                        if let Some(candidate) = candidates.into_iter().next() {
                                            if let Some(content) = candidate.content {
                                                for part in content.parts {
                                                    if !part.text.is_empty() {
                                                        yield StreamChunk::Text(part.text);
                                                    }
                                                }
                                            }

                                            if let Some(reason) =
                                                candidate.finish_reason.as_deref()
                                            {
                                                finished = true;
                                                yield StreamChunk::Done {
                                                    finish_reason: map_finish_reason(Some(reason)),
                                                    usage: usage_metadata
                                                        .map(UsageMetadata::into_usage),
                                                };
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                    Err(e) => {
                        yield StreamChunk::Error(e.to_string());
                        return;
                    }
                }
            }

            if !finished {
                yield StreamChunk::Done {
                    finish_reason: FinishReason::Unknown,
                    usage: None,
                };
            }
        };

        Ok(StreamReceiver::new(stream))
    }
}

fn map_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("STOP") => FinishReason::Stop,
        Some("MAX_TOKENS") => FinishReason::Length,
        Some("SAFETY") | Some("RECITATION") | Some("PROHIBITED_CONTENT") => FinishReason::Safety,
        _ => FinishReason::Unknown,
    }
}

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GeminiRequest {
    fn from_completion(request: &CompletionRequest) -> Self {
        let mut system_instruction = None;
        let mut contents = Vec::new();

        for msg in &request.messages {
            match msg.role {
                // Gemini carries the system prompt out-of-band, not as a turn
                Role::System => {
                    system_instruction = Some(GeminiContent {
                        role: None,
                        parts: vec![GeminiPart {
                            text: msg.content.clone(),
                        }],
                    });
                }
                Role::User => contents.push(GeminiContent {
                    role: Some("user".into()),
                    parts: vec![GeminiPart {
                        text: msg.content.clone(),
                    }],
                }),
                Role::Model => contents.push(GeminiContent {
                    role: Some("model".into()),
                    parts: vec![GeminiPart {
                        text: msg.content.clone(),
                    }],
                }),
            }
        }

        let generation_config = if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            })
        } else {
            None
        };

        Self {
            contents,
            system_instruction,
            generation_config,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

impl GenerateContentResponse {
    fn into_completion(self, model: String) -> CompletionResponse {
        let GenerateContentResponse {
            candidates,
            usage_metadata,
        } = self;

        let mut content = String::new();
        let mut finish_reason = FinishReason::Unknown;

        if let Some(candidate) = candidates.into_iter().next() {
            finish_reason = map_finish_reason(candidate.finish_reason.as_deref());
            if let Some(c) = candidate.content {
                for part in c.parts {
                    content.push_str(&part.text);
                }
            }
        }

        let usage = usage_metadata
            .map(UsageMetadata::into_usage)
            .unwrap_or_default();

        CompletionResponse {
            model,
            content: if content.is_empty() {
                None
            } else {
                Some(content)
            },
            finish_reason,
            usage,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
    #[serde(default)]
    total_token_count: usize,
}

impl UsageMetadata {
    fn into_usage(self) -> Usage {
        Usage {
            prompt_tokens: self.prompt_token_count,
            completion_tokens: self.candidates_token_count,
            total_tokens: self.total_token_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_provider_defaults() {
        let provider = GeminiProvider::new(ProviderConfig::gemini("test-key"));
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.default_model(), "gemini-2.0-flash");
        assert!(provider.base_url().contains("generativelanguage"));
    }

    #[test]
    fn test_missing_api_key_is_auth_failure() {
        let mut config = ProviderConfig::gemini("");
        config.api_key = None;
        let provider = GeminiProvider::new(config);
        assert!(matches!(
            provider.api_key(),
            Err(ProviderError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_request_serialization() {
        let request = CompletionRequest::new(vec![
            ChatMessage::system("You generate code"),
            ChatMessage::user("Write a function"),
            ChatMessage::model("```python\npass\n```"),
            ChatMessage::user("Make it faster"),
        ])
        .with_temperature(0.2)
        .with_max_tokens(256);

        let api_request = GeminiRequest::from_completion(&request);
        let value = serde_json::to_value(&api_request).unwrap();

        // System prompt is lifted out of the turn list
        assert_eq!(
            value["systemInstruction"]["parts"][0]["text"],
            "You generate code"
        );
        assert_eq!(value["contents"].as_array().unwrap().len(), 3);
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][1]["role"], "model");
        assert_eq!(value["contents"][2]["parts"][0]["text"], "Make it faster");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 256);
    }

    #[test]
    fn test_request_omits_empty_generation_config() {
        let request = CompletionRequest::new(vec![ChatMessage::user("hi")]);
        let value = serde_json::to_value(GeminiRequest::from_completion(&request)).unwrap();
        assert!(value.get("generationConfig").is_none());
        assert!(value.get("systemInstruction").is_none());
    }

    #[test]
    fn test_response_deserialization() {
        let body = r#"{
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "Here is the code:\n"}, {"text": "```python\nprint('ok')\n```"}]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 12,
                "candidatesTokenCount": 34,
                "totalTokenCount": 46
            }
        }"#;

        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        let completion = response.into_completion("gemini-2.0-flash".into());

        assert_eq!(completion.finish_reason, FinishReason::Stop);
        assert!(completion.content.as_deref().unwrap().contains("print('ok')"));
        assert_eq!(completion.usage.prompt_tokens, 12);
        assert_eq!(completion.usage.completion_tokens, 34);
        assert_eq!(completion.usage.total_tokens, 46);
    }

    #[test]
    fn test_empty_candidates_yield_no_content() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        let completion = response.into_completion("gemini-2.0-flash".into());
        assert!(completion.content.is_none());
        assert_eq!(completion.finish_reason, FinishReason::Unknown);
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(map_finish_reason(Some("STOP")), FinishReason::Stop);
        assert_eq!(map_finish_reason(Some("MAX_TOKENS")), FinishReason::Length);
        assert_eq!(map_finish_reason(Some("SAFETY")), FinishReason::Safety);
        assert_eq!(map_finish_reason(Some("FOO")), FinishReason::Unknown);
        assert_eq!(map_finish_reason(None), FinishReason::Unknown);
    }
}
