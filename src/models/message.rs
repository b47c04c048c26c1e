use chrono::{ DateTime, Utc };
use serde::{ Deserialize, Serialize };
use uuid::Uuid;

use super::mood::Mood;
use crate::analysis::MoodAnalysis;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    pub mood: Mood,
    pub color: String,
    pub timestamp: DateTime<Utc>,
    pub from_user: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl Message {
    /// A freshly typed entry. Mood stays neutral until the reply is analysed.
    pub fn from_user(text: &str, timestamp: DateTime<Utc>) -> Self {
        let mood = Mood::default();
        Self {
            id: new_message_id(timestamp),
            text: text.to_string(),
            mood,
            color: mood.default_color().to_string(),
            timestamp,
            from_user: true,
            summary: None,
            recommendation: None,
        }
    }

    /// Builds the assistant message for an analysed reply. Falls back to the
    /// raw reply text when no summary could be extracted.
    pub fn from_analysis(analysis: &MoodAnalysis, raw_reply: &str, timestamp: DateTime<Utc>) -> Self {
        let text = if analysis.summary.is_empty() {
            raw_reply.trim().to_string()
        } else {
            analysis.summary.clone()
        };
        Self {
            id: new_message_id(timestamp),
            text,
            mood: analysis.mood,
            color: analysis.color.clone(),
            timestamp,
            from_user: false,
            summary: Some(analysis.summary.clone()).filter(|s| !s.is_empty()),
            recommendation: Some(analysis.recommendation.clone()).filter(|s| !s.is_empty()),
        }
    }

    pub fn apply_analysis(&mut self, analysis: &MoodAnalysis) {
        self.mood = analysis.mood;
        self.color = analysis.color.clone();
    }
}

/// `<unix-millis>-<8 hex>`: sorts by creation time, unique within a millisecond.
pub fn new_message_id(timestamp: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{:013}-{}", timestamp.timestamp_millis(), &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn analysis(summary: &str) -> MoodAnalysis {
        MoodAnalysis {
            mood: Mood::Negative,
            raw_mood: "negatif".to_string(),
            color: "#F44336".to_string(),
            summary: summary.to_string(),
            recommendation: String::new(),
        }
    }

    #[test]
    fn ids_are_time_ordered_and_distinct() {
        let earlier = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 1).unwrap();
        let a = new_message_id(earlier);
        let b = new_message_id(earlier);
        let c = new_message_id(later);
        assert_ne!(a, b);
        assert!(a < c && b < c);
    }

    #[test]
    fn assistant_text_falls_back_to_raw_reply() {
        let now = Utc::now();
        let msg = Message::from_analysis(&analysis(""), "  Bugün zor geçmiş.  ", now);
        assert_eq!(msg.text, "Bugün zor geçmiş.");
        assert_eq!(msg.summary, None);
        assert_eq!(msg.recommendation, None);
        assert!(!msg.from_user);
    }

    #[test]
    fn user_message_takes_detected_mood() {
        let mut msg = Message::from_user("Kötü bir gün", Utc::now());
        assert_eq!(msg.mood, Mood::Neutral);
        msg.apply_analysis(&analysis("Zor bir gün."));
        assert_eq!(msg.mood, Mood::Negative);
        assert_eq!(msg.color, "#F44336");
    }

    #[test]
    fn serializes_with_camel_case_and_skips_empty_optionals() {
        let msg = Message::from_user("merhaba", Utc::now());
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["fromUser"], true);
        assert_eq!(json["mood"], "neutral");
        assert!(json.get("summary").is_none());
    }
}
