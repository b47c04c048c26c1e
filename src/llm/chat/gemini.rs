use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;
use log::info;

use super::{ ChatClient, CompletionResponse };
use crate::llm::LlmConfig;

const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
}

#[derive(Deserialize)]
struct GoogleCandidate {
    content: Option<GeminiContent>,
}

/// Talks to the Gemini REST `generateContent` endpoint directly so the
/// system instruction travels in its dedicated field.
pub struct GeminiChatClient {
    http: HttpClient,
    api_key: String,
    model: String,
    base_url: String,
    system_instruction: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl GeminiChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        system_instruction: Option<String>,
        max_tokens: Option<u32>,
        temperature: Option<f32>
    ) -> Self {
        Self {
            http: HttpClient::new(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            system_instruction,
            max_tokens,
            temperature,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config.api_key
            .clone()
            .ok_or_else(|| "Google API key is required for GeminiChatClient".to_string())?;

        Ok(
            Self::new(
                api_key,
                config.completion_model.clone(),
                config.base_url.clone(),
                config.system_instruction.clone(),
                config.max_tokens,
                config.temperature
            )
        )
    }

    fn build_request(&self, prompt: &str) -> GenerateContentRequest {
        let generation_config = if self.max_tokens.is_some() || self.temperature.is_some() {
            Some(GenerationConfig {
                max_output_tokens: self.max_tokens,
                temperature: self.temperature,
            })
        } else {
            None
        };

        GenerateContentRequest {
            system_instruction: self.system_instruction.as_ref().map(|text| GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: text.clone() }],
            }),
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart { text: prompt.to_string() }],
            }],
            generation_config,
        }
    }
}

fn response_text(resp: GenerateContentResponse) -> Option<String> {
    let content = resp.candidates.into_iter().next()?.content?;
    let text: String = content.parts
        .into_iter()
        .map(|p| p.text)
        .collect();
    Some(text)
}

#[async_trait]
impl ChatClient for GeminiChatClient {
    async fn complete(
        &self,
        prompt: &str
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            self.api_key
        );
        info!("GeminiChatClient::complete() → model={} base_url={}", self.model, self.base_url);

        let resp = self.http
            .post(&url)
            .json(&self.build_request(prompt))
            .send().await?
            .error_for_status()?;
        let data = resp.json::<GenerateContentResponse>().await?;
        let text = response_text(data).ok_or("Gemini returned no candidates")?;
        Ok(CompletionResponse { response: text })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_system_instruction() {
        let client = GeminiChatClient::new(
            "key".into(),
            None,
            None,
            Some("Analiz et".into()),
            None,
            Some(0.2)
        );
        let body = serde_json::to_value(client.build_request("Bugün yorgunum")).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Analiz et");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Bugün yorgunum");
        assert!(body["generationConfig"]["temperature"].is_number());
        assert!(body["generationConfig"].get("maxOutputTokens").is_none());
        assert_eq!(client.get_model(), DEFAULT_MODEL);
    }

    #[test]
    fn joins_candidate_parts() {
        let resp: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"{\"Duygu\":"},{"text":"\"iyi\"}"}]}}]}"#
        ).unwrap();
        assert_eq!(response_text(resp).as_deref(), Some("{\"Duygu\":\"iyi\"}"));

        let empty: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response_text(empty), None);
    }
}
