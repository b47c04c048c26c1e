use serde::{ Serialize, Deserialize };

use super::Message;
use crate::display::HistoryEntry;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Send {
        text: String,
    },
    Conversation,
    History {
        #[serde(default)]
        utc_offset_minutes: Option<i32>,
    },
    Delete {
        id: String,
    },
    CompleteOnboarding,
    Clear,
}

#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Session {
        onboarding_completed: bool,
        greeting: String,
    },
    Processing,
    Exchange {
        user: Message,
        ai: Message,
    },
    Conversation {
        messages: Vec<Message>,
    },
    History {
        entries: Vec<HistoryEntry>,
    },
    Deleted {
        id: String,
        removed: bool,
    },
    Error {
        message: String,
    },
}
