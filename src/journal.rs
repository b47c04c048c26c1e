use chrono::Utc;
use log::{ error, info, warn };
use serde::Serialize;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::{ Mutex, RwLock };

use crate::analysis::{ MoodAnalysis, ResponseNormalizer };
use crate::cli::Args;
use crate::config::prompt::{ self, PromptConfig };
use crate::config::session::SessionConfig;
use crate::display::{ display_offset, history_entries, HistoryEntry };
use crate::error::JournalError;
use crate::history::MessageLog;
use crate::llm::chat::{ new_client as new_chat_client, ChatClient };
use crate::llm::{ LlmConfig, LlmType };
use crate::models::Message;
use crate::storage::{ initialize_storage, Storage };

/// One analysed journal entry: the user's message, annotated with the
/// detected mood, and the assistant's reply.
#[derive(Debug, Clone, Serialize)]
pub struct Exchange {
    pub user: Message,
    pub ai: Message,
    pub analysis: MoodAnalysis,
}

pub struct JournalAgent {
    chat_client: Arc<dyn ChatClient>,
    normalizer: ResponseNormalizer,
    log: MessageLog,
    storage: Storage,
    prompts: PromptConfig,
    session: RwLock<SessionConfig>,
    in_flight: Mutex<()>,
}

impl JournalAgent {
    pub fn new(
        chat_client: Arc<dyn ChatClient>,
        storage: Storage,
        prompts: PromptConfig,
        session: SessionConfig
    ) -> Self {
        Self {
            chat_client,
            normalizer: ResponseNormalizer::default(),
            log: MessageLog::new(storage.clone()),
            storage,
            prompts,
            session: RwLock::new(session),
            in_flight: Mutex::new(()),
        }
    }

    /// Wires the agent from command-line configuration: prompts, store,
    /// session flags and the chat client.
    pub async fn from_args(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let prompts = prompt::resolve_prompts(args.prompts_path.as_deref())?;
        let storage = initialize_storage(args)?;
        let session = SessionConfig::load(&storage).await;
        info!("Onboarding completed: {}", session.onboarding_completed);

        let llm_type: LlmType = args.chat_llm_type.parse()?;
        let chat_config = LlmConfig {
            llm_type,
            api_key: Some(args.chat_api_key.clone()).filter(|k| !k.is_empty()),
            completion_model: args.chat_model.clone(),
            base_url: args.chat_base_url.clone(),
            system_instruction: Some(prompts.system_instruction.clone()),
            max_tokens: args.chat_max_tokens,
            temperature: args.chat_temperature,
        };
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Type={}, Model={}, BaseURL={:?}",
            llm_type,
            chat_client.get_model(),
            chat_config.base_url.as_deref().unwrap_or("adapter default")
        );

        Ok(Self::new(chat_client, storage, prompts, session))
    }

    /// Analyses one journal entry and persists both sides of the exchange.
    ///
    /// Only one send may be outstanding at a time; a second call while the
    /// first is waiting on the generation API fails with [`JournalError::Busy`]
    /// instead of racing it into the log. Nothing is persisted when the
    /// generation call fails.
    pub async fn send(&self, text: &str) -> Result<Exchange, JournalError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(JournalError::EmptyInput);
        }
        let _in_flight = self.in_flight.try_lock().map_err(|_| {
            warn!("Rejected send while another request is in flight");
            JournalError::Busy
        })?;

        let mut user = Message::from_user(text, Utc::now());

        let reply = self.chat_client
            .complete(text).await
            .map_err(|e| {
                error!("Generation request failed: {}", e);
                JournalError::Generation(e)
            })?;

        let analysis = self.normalizer.normalize(&reply.response);
        info!("Detected mood '{}' (raw '{}', color {})", analysis.mood, analysis.raw_mood, analysis.color);

        user.apply_analysis(&analysis);
        let ai = Message::from_analysis(&analysis, &reply.response, Utc::now());
        if !self.log.append(&[user.clone(), ai.clone()]).await {
            warn!("Exchange for message {} was not persisted", user.id);
        }

        Ok(Exchange { user, ai, analysis })
    }

    pub async fn conversation(&self) -> Vec<Message> {
        self.log.load().await
    }

    /// User entries, newest first, with clock times at the given offset
    /// (minutes east of UTC) or at server time.
    pub async fn history(&self, utc_offset_minutes: Option<i32>) -> Vec<HistoryEntry> {
        history_entries(self.log.history().await, Utc::now(), display_offset(utc_offset_minutes))
    }

    pub async fn delete(&self, id: &str) -> bool {
        self.log.delete(id).await
    }

    /// Erases all journal data, the onboarding flag included.
    pub async fn clear(&self) -> SessionConfig {
        let mut session = self.session.write().await;
        self.log.wipe_store().await;
        *session = SessionConfig::default();
        info!("All journal data cleared");
        *session
    }

    pub async fn session(&self) -> SessionConfig {
        *self.session.read().await
    }

    pub async fn complete_onboarding(&self) -> SessionConfig {
        let mut session = self.session.write().await;
        if !session.onboarding_completed {
            session.complete_onboarding(&self.storage).await;
            info!("Onboarding marked as completed");
        }
        *session
    }

    pub fn greeting(&self) -> &str {
        &self.prompts.greeting
    }
}
