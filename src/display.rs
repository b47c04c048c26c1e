//! Turkish-locale time labels and the history entry view sent to clients.
//!
//! Clock times and dates are rendered at the client's UTC offset when it
//! sends one, otherwise at the server's.

use chrono::{ DateTime, Datelike, FixedOffset, Local, Utc };
use log::warn;
use serde::Serialize;

use crate::models::Message;

/// "Az önce", "N dakika önce", "N saat önce" or "N gün önce".
pub fn format_relative(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - timestamp).num_minutes().max(0);
    if minutes < 1 {
        "Az önce".to_string()
    } else if minutes < 60 {
        format!("{} dakika önce", minutes)
    } else if minutes < 24 * 60 {
        format!("{} saat önce", minutes / 60)
    } else {
        format!("{} gün önce", minutes / (24 * 60))
    }
}

/// Offset east of UTC in minutes, as sent by clients. Missing or out of
/// range values fall back to the server's current offset.
pub fn display_offset(utc_offset_minutes: Option<i32>) -> FixedOffset {
    let server = *Local::now().offset();
    match utc_offset_minutes {
        None => server,
        Some(minutes) =>
            minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .unwrap_or_else(|| {
                    warn!("Ignoring out of range UTC offset {} min", minutes);
                    server
                }),
    }
}

pub fn format_time(timestamp: DateTime<Utc>, offset: FixedOffset) -> String {
    timestamp.with_timezone(&offset).format("%H:%M").to_string()
}

pub fn format_date(timestamp: DateTime<Utc>, offset: FixedOffset) -> String {
    timestamp.with_timezone(&offset).format("%d.%m.%Y").to_string()
}

pub fn is_same_day(a: DateTime<Utc>, b: DateTime<Utc>, offset: FixedOffset) -> bool {
    let (a, b) = (a.with_timezone(&offset), b.with_timezone(&offset));
    a.year() == b.year() && a.ordinal() == b.ordinal()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub message: Message,
    pub mood_label: &'static str,
    pub relative_time: String,
    pub time: String,
    pub date: String,
    pub today: bool,
}

impl HistoryEntry {
    pub fn new(message: Message, now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            mood_label: message.mood.label(),
            relative_time: format_relative(message.timestamp, now),
            time: format_time(message.timestamp, offset),
            date: format_date(message.timestamp, offset),
            today: is_same_day(message.timestamp, now, offset),
            message,
        }
    }
}

pub fn history_entries(
    messages: Vec<Message>,
    now: DateTime<Utc>,
    offset: FixedOffset
) -> Vec<HistoryEntry> {
    messages.into_iter().map(|m| HistoryEntry::new(m, now, offset)).collect()
}
