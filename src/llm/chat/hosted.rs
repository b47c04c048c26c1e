use async_trait::async_trait;
use std::error::Error as StdError;
use log::info;

use super::{ ChatClient, CompletionResponse };
use crate::llm::{ LlmConfig, LlmType };
use rllm::chat::{ ChatMessage, ChatRole, MessageType };
use rllm::builder::{ LLMBackend, LLMBuilder };
use rllm::LLMProvider;

/// OpenAI, Anthropic, DeepSeek, Groq and xAI, all driven through `rllm`.
pub struct HostedChatClient {
    llm: Box<dyn LLMProvider + Send + Sync>,
    llm_type: LlmType,
    model: String,
}

fn backend_for(llm_type: LlmType) -> Result<(LLMBackend, &'static str), Box<dyn StdError + Send + Sync>> {
    match llm_type {
        LlmType::OpenAI => Ok((LLMBackend::OpenAI, "gpt-4o-mini")),
        LlmType::Anthropic => Ok((LLMBackend::Anthropic, "claude-3-5-haiku-latest")),
        LlmType::DeepSeek => Ok((LLMBackend::DeepSeek, "deepseek-chat")),
        LlmType::Groq => Ok((LLMBackend::Groq, "llama-3.1-8b-instant")),
        LlmType::XAI => Ok((LLMBackend::XAI, "grok-2-latest")),
        other => Err(format!("{} is not served by HostedChatClient", other).into()),
    }
}

impl HostedChatClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let (backend, default_model) = backend_for(config.llm_type)?;
        let api_key = config.api_key
            .clone()
            .ok_or_else(|| format!("An API key is required for the {} provider", config.llm_type))?;
        let model = config.completion_model.clone().unwrap_or_else(|| default_model.to_string());

        let mut builder = LLMBuilder::new()
            .backend(backend)
            .api_key(api_key)
            .model(&model)
            .stream(false);

        if let Some(url) = &config.base_url {
            builder = builder.base_url(url);
        }
        if let Some(system) = &config.system_instruction {
            builder = builder.system(system);
        }
        if let Some(tokens) = config.max_tokens {
            builder = builder.max_tokens(tokens);
        }
        if let Some(temp) = config.temperature {
            builder = builder.temperature(temp);
        }

        let llm = builder.build()?;
        Ok(Self { llm, llm_type: config.llm_type, model })
    }
}

#[async_trait]
impl ChatClient for HostedChatClient {
    async fn complete(
        &self,
        prompt: &str
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        let messages = vec![ChatMessage {
            role: ChatRole::User,
            content: prompt.to_string(),
            message_type: MessageType::Text,
        }];
        info!("HostedChatClient::complete() → provider={} model={}", self.llm_type, self.model);
        let resp = self.llm.chat(&messages).await?;
        let text = resp
            .text()
            .map(|s| s.to_string())
            .unwrap_or_else(|| resp.to_string());
        Ok(CompletionResponse { response: text })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }
}
