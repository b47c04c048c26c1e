//! Turns the generation API's free-form reply into a [`MoodAnalysis`].
//!
//! The reply is *asked* to be a JSON object with `Duygu`, `Renk`, `Özet` and
//! `Öneri` keys but models regularly answer with fenced JSON, `label: value`
//! lines or plain prose. Each [`ExtractionStrategy`] pulls whatever fields it
//! can recognise; partial results are merged in order (the first strategy to
//! supply a field wins) and defaults fill the rest.

mod labels;
mod structured;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::Serialize;

use crate::models::Mood;

pub use labels::LabelExtraction;
pub use structured::StructuredExtraction;

lazy_static! {
    static ref HEX_COLOR: Regex = Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap();
}

/// Localized and English spellings for each field, in that order.
pub(crate) const MOOD_KEYS: [&str; 2] = ["Duygu", "mood"];
pub(crate) const COLOR_KEYS: [&str; 2] = ["Renk", "color"];
pub(crate) const SUMMARY_KEYS: [&str; 2] = ["Özet", "summary"];
pub(crate) const RECOMMENDATION_KEYS: [&str; 2] = ["Öneri", "recommendation"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoodAnalysis {
    pub mood: Mood,
    /// The mood token as the model wrote it, before classification.
    pub raw_mood: String,
    pub color: String,
    pub summary: String,
    pub recommendation: String,
}

impl Default for MoodAnalysis {
    fn default() -> Self {
        let mood = Mood::Neutral;
        Self {
            mood,
            raw_mood: String::new(),
            color: mood.default_color().to_string(),
            summary: String::new(),
            recommendation: String::new(),
        }
    }
}

/// Fields one strategy managed to find. `None` means "not found here".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialAnalysis {
    pub mood: Option<String>,
    pub color: Option<String>,
    pub summary: Option<String>,
    pub recommendation: Option<String>,
}

impl PartialAnalysis {
    pub fn is_empty(&self) -> bool {
        self.mood.is_none() && self.color.is_none() && self.summary.is_none() && self.recommendation.is_none()
    }

    /// Keeps fields already present, takes the rest from `other`.
    pub fn merge(self, other: PartialAnalysis) -> PartialAnalysis {
        PartialAnalysis {
            mood: self.mood.or(other.mood),
            color: self.color.or(other.color),
            summary: self.summary.or(other.summary),
            recommendation: self.recommendation.or(other.recommendation),
        }
    }

    pub fn finish(self) -> MoodAnalysis {
        let raw_mood = self.mood.unwrap_or_default();
        let mood = Mood::classify(&raw_mood);
        let color = self.color
            .map(|c| c.trim().to_string())
            .filter(|c| HEX_COLOR.is_match(c))
            .unwrap_or_else(|| mood.default_color().to_string());

        MoodAnalysis {
            mood,
            raw_mood: raw_mood.trim().to_string(),
            color,
            summary: self.summary.map(|s| s.trim().to_string()).unwrap_or_default(),
            recommendation: self.recommendation.map(|s| s.trim().to_string()).unwrap_or_default(),
        }
    }
}

pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, text: &str) -> Option<PartialAnalysis>;
}

pub struct ResponseNormalizer {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl Default for ResponseNormalizer {
    fn default() -> Self {
        Self::new(vec![Box::new(StructuredExtraction), Box::new(LabelExtraction)])
    }
}

impl ResponseNormalizer {
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn normalize(&self, text: &str) -> MoodAnalysis {
        let mut merged = PartialAnalysis::default();
        for strategy in &self.strategies {
            match strategy.extract(text) {
                Some(partial) => {
                    debug!("Extraction strategy '{}' matched: {:?}", strategy.name(), partial);
                    merged = merged.merge(partial);
                }
                None => debug!("Extraction strategy '{}' found nothing", strategy.name()),
            }
        }
        merged.finish()
    }
}

/// Normalizes a reply with the default strategy order: JSON object first,
/// then `label: value` scanning.
pub fn normalize_response(text: &str) -> MoodAnalysis {
    ResponseNormalizer::default().normalize(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_reply_is_taken_verbatim() {
        let analysis = normalize_response(
            r##"{"Duygu":"pozitif","Renk":"#4CAF50","Özet":"İyi bir gün.","Öneri":"Dinlenin."}"##
        );
        assert_eq!(analysis.raw_mood, "pozitif");
        assert_eq!(analysis.mood, Mood::Positive);
        assert_eq!(analysis.color, "#4CAF50");
        assert_eq!(analysis.summary, "İyi bir gün.");
        assert_eq!(analysis.recommendation, "Dinlenin.");
    }

    #[test]
    fn labelled_lines_without_braces() {
        let analysis = normalize_response(
            "Duygu: negatif\nRenk: #F44336\nÖzet: Zor bir gün geçirdim.\nÖneri: Erken yatın."
        );
        assert_eq!(analysis.raw_mood, "negatif");
        assert_eq!(analysis.mood, Mood::Negative);
        assert_eq!(analysis.color, "#F44336");
        assert_eq!(analysis.summary, "Zor bir gün geçirdim.");
        assert_eq!(analysis.recommendation, "Erken yatın.");
    }

    #[test]
    fn prose_without_fields_gets_defaults() {
        let analysis = normalize_response("Bugün harika geçti!");
        assert_eq!(analysis, MoodAnalysis::default());
        assert_eq!(analysis.color, "#FF9800");
    }

    #[test]
    fn empty_and_unbalanced_inputs_do_not_panic() {
        for text in ["", "{", "}", "}{", "{{{", "Duygu:", "Renk：", "{\"Duygu\": }"] {
            let analysis = normalize_response(text);
            assert_eq!(analysis.mood, Mood::Neutral, "{text:?}");
            assert_eq!(analysis.color, "#FF9800", "{text:?}");
        }
    }

    #[test]
    fn json_with_trailing_comma_falls_back_to_labels() {
        let reply = "Tabii:\n{\n \"Duygu\": \"negatif\",\n \"Renk\": \"#F44336\",\n \"Özet\": \"Zor bir gün.\",\n \"Öneri\": \"Erken yatın.\",\n}";
        let analysis = normalize_response(reply);
        assert_eq!(analysis.mood, Mood::Negative);
        assert_eq!(analysis.color, "#F44336");
        assert_eq!(analysis.summary, "Zor bir gün.");
        assert_eq!(analysis.recommendation, "Erken yatın.");
    }

    #[test]
    fn invalid_color_is_derived_from_mood() {
        let analysis = normalize_response(r#"{"mood":"happy","color":"green"}"#);
        assert_eq!(analysis.mood, Mood::Positive);
        assert_eq!(analysis.color, "#4CAF50");

        let analysis = normalize_response("Duygu: kötü\nRenk: F44336");
        assert_eq!(analysis.color, "#F44336");
    }

    #[test]
    fn fenced_json_with_english_keys() {
        let reply = "Here you go:\n```json\n{\n  \"Mood\": \"Sad\",\n  \"Color\": \"#123ABC\",\n  \"Summary\": \"Long day.\",\n  \"Recommendation\": \"Take a walk.\"\n}\n```";
        let analysis = normalize_response(reply);
        assert_eq!(analysis.mood, Mood::Negative);
        assert_eq!(analysis.color, "#123ABC");
        assert_eq!(analysis.summary, "Long day.");
        assert_eq!(analysis.recommendation, "Take a walk.");
    }

    #[test]
    fn json_fields_win_over_labelled_lines() {
        let reply = "Duygu: negatif\n{\"Duygu\":\"mutlu\",\"Özet\":\"Güzel.\"}\nÖneri: Su için.";
        let analysis = normalize_response(reply);
        assert_eq!(analysis.mood, Mood::Positive);
        assert_eq!(analysis.summary, "Güzel.");
        assert_eq!(analysis.recommendation, "Su için.");
    }

    #[test]
    fn merge_prefers_earlier_fields() {
        let first = PartialAnalysis { mood: Some("iyi".into()), ..Default::default() };
        let second = PartialAnalysis {
            mood: Some("kötü".into()),
            summary: Some("x".into()),
            ..Default::default()
        };
        let merged = first.merge(second);
        assert_eq!(merged.mood.as_deref(), Some("iyi"));
        assert_eq!(merged.summary.as_deref(), Some("x"));
    }
}
