use log::{ error, info, warn };
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::models::Message;
use crate::storage::Storage;

pub const MESSAGES_KEY: &str = "messages";

/// The persisted conversation, stored as one JSON array under [`MESSAGES_KEY`].
///
/// Appends and deletes are read-modify-write cycles on the whole array; they
/// are serialized here so two connections of the same process cannot drop
/// each other's writes. Writes work on the raw records: a record that no
/// longer decodes is hidden from readers but kept on disk, and a log that
/// cannot be read at all is never written over.
pub struct MessageLog {
    storage: Storage,
    write_lock: Mutex<()>,
}

impl MessageLog {
    pub fn new(storage: Storage) -> Self {
        Self { storage, write_lock: Mutex::new(()) }
    }

    async fn load_raw(&self) -> Result<Vec<Value>, StoreError> {
        Ok(self.storage.try_get(MESSAGES_KEY).await?.unwrap_or_default())
    }

    /// Every decodable message in insertion order.
    pub async fn load(&self) -> Vec<Message> {
        match self.load_raw().await {
            Ok(raw) => decode_records(raw),
            Err(e) => {
                error!("Failed to read message log: {}", e);
                Vec::new()
            }
        }
    }

    /// Returns whether the messages were written.
    pub async fn append(&self, messages: &[Message]) -> bool {
        let _guard = self.write_lock.lock().await;
        let mut log = match self.load_raw().await {
            Ok(log) => log,
            Err(e) => {
                error!("Skipping append of {} messages, log unreadable: {}", messages.len(), e);
                return false;
            }
        };
        for message in messages {
            match serde_json::to_value(message) {
                Ok(value) => log.push(value),
                Err(e) => error!("Failed to encode message {}: {}", message.id, e),
            }
        }
        self.storage.set(MESSAGES_KEY, &log).await;
        true
    }

    /// User-authored entries only, newest first.
    pub async fn history(&self) -> Vec<Message> {
        user_history(self.load().await)
    }

    /// Returns whether a message was removed. An unknown id or an unreadable
    /// log leaves the stored data untouched.
    pub async fn delete(&self, id: &str) -> bool {
        let _guard = self.write_lock.lock().await;
        let log = match self.load_raw().await {
            Ok(log) => log,
            Err(e) => {
                error!("Skipping delete of {}, log unreadable: {}", id, e);
                return false;
            }
        };
        let before = log.len();
        let remaining = remove_message(log, id);
        if remaining.len() == before {
            return false;
        }
        self.storage.set(MESSAGES_KEY, &remaining).await;
        info!("Deleted message {} ({} remaining)", id, remaining.len());
        true
    }

    /// Erases every key of the underlying store, not only the log.
    pub async fn wipe_store(&self) {
        let _guard = self.write_lock.lock().await;
        self.storage.clear_all().await;
    }
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

fn decode_records(raw: Vec<Value>) -> Vec<Message> {
    raw.into_iter()
        .filter_map(|record| {
            let id = record_id(&record).unwrap_or("<no id>").to_string();
            match serde_json::from_value(record) {
                Ok(message) => Some(message),
                Err(e) => {
                    warn!("Skipping undecodable message {}: {}", id, e);
                    None
                }
            }
        })
        .collect()
}

/// Drops the stored record with the given id, decodable or not.
pub fn remove_message(log: Vec<Value>, id: &str) -> Vec<Value> {
    log.into_iter().filter(|record| record_id(record) != Some(id)).collect()
}

pub fn user_history(log: Vec<Message>) -> Vec<Message> {
    let mut history: Vec<Message> = log.into_iter().filter(|m| m.from_user).collect();
    history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{ Duration, Utc };

    fn sample_log() -> Vec<Message> {
        let now = Utc::now();
        (0..4)
            .map(|i| {
                let mut msg = Message::from_user(&format!("entry {i}"), now + Duration::minutes(i));
                msg.from_user = i % 2 == 0;
                msg
            })
            .collect()
    }

    fn raw(log: &[Message]) -> Vec<Value> {
        log.iter().map(|m| serde_json::to_value(m).unwrap()).collect()
    }

    #[test]
    fn removing_an_existing_id_drops_exactly_one() {
        let log = sample_log();
        let id = log[1].id.clone();
        let remaining = decode_records(remove_message(raw(&log), &id));
        assert_eq!(remaining.len(), log.len() - 1);
        assert!(remaining.iter().all(|m| m.id != id));
    }

    #[test]
    fn removing_an_unknown_id_is_a_no_op() {
        let log = raw(&sample_log());
        assert_eq!(remove_message(log.clone(), "missing"), log);
    }

    #[test]
    fn undecodable_records_are_skipped_individually() {
        let good = sample_log();
        let mut log = raw(&good);
        log.insert(1, serde_json::json!({ "id": "broken", "text": "renk yok" }));
        assert_eq!(decode_records(log.clone()), good);
        assert_eq!(remove_message(log, "broken").len(), good.len());
    }

    #[test]
    fn history_is_user_only_newest_first() {
        let history = user_history(sample_log());
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].text, "entry 2");
        assert_eq!(history[1].text, "entry 0");
    }
}
