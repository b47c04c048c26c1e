use async_trait::async_trait;
use mood_journal::config::prompt::PromptConfig;
use mood_journal::config::session::SessionConfig;
use mood_journal::journal::JournalAgent;
use mood_journal::llm::chat::{ ChatClient, CompletionResponse };
use mood_journal::storage::{ MemoryStore, Storage };
use std::collections::VecDeque;
use std::error::Error as StdError;
use std::sync::{ Arc, Mutex };
use tokio::sync::Notify;

/// Replies with pre-scripted responses in order. `Err` entries simulate a
/// failing generation API.
pub struct ScriptedChatClient {
    replies: Mutex<VecDeque<Result<String, String>>>,
    pub prompts: Mutex<Vec<String>>,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl ScriptedChatClient {
    pub fn new(replies: Vec<Result<&str, &str>>) -> Self {
        Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect()
            ),
            prompts: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Each call notifies `entered` and then waits for `release`.
    pub fn gated(replies: Vec<Result<&str, &str>>, entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        Self { gate: Some((entered, release)), ..Self::new(replies) }
    }
}

#[async_trait]
impl ChatClient for ScriptedChatClient {
    async fn complete(
        &self,
        prompt: &str
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(CompletionResponse { response: text }),
            Some(Err(e)) => Err(e.into()),
            None => Err("no scripted reply left".into()),
        }
    }

    fn get_model(&self) -> String {
        "scripted".to_string()
    }
}

pub fn memory_storage() -> Storage {
    Storage::new(Arc::new(MemoryStore::new()))
}

pub fn agent_with(client: ScriptedChatClient, storage: Storage) -> JournalAgent {
    JournalAgent::new(Arc::new(client), storage, PromptConfig::default(), SessionConfig::default())
}
