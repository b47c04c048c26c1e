use serde::{ Deserialize, Serialize };
use std::fmt;

const POSITIVE_SYNONYMS: &[&str] = &["positive", "pozitif", "happy", "mutlu", "iyi", "good", "olumlu"];
const NEGATIVE_SYNONYMS: &[&str] = &["negative", "negatif", "sad", "üzgün", "kötü", "bad", "olumsuz"];

pub const POSITIVE_COLOR: &str = "#4CAF50";
pub const NEGATIVE_COLOR: &str = "#F44336";
pub const NEUTRAL_COLOR: &str = "#FF9800";

/// Canonical mood of a journal entry.
///
/// Serializes as the English token. Deserialization goes through
/// [`Mood::classify`], so any surface spelling stored by an older client
/// (`pozitif`, `happy`, `nötr`, ...) loads as one of the three variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Mood {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Mood {
    /// Maps a raw mood token onto a canonical mood. Unknown tokens are neutral.
    pub fn classify(raw: &str) -> Mood {
        let token = fold_token(raw);
        if POSITIVE_SYNONYMS.contains(&token.as_str()) {
            Mood::Positive
        } else if NEGATIVE_SYNONYMS.contains(&token.as_str()) {
            Mood::Negative
        } else {
            Mood::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Positive => "positive",
            Mood::Neutral => "neutral",
            Mood::Negative => "negative",
        }
    }

    /// Turkish display label used by the chat and history views.
    pub fn label(&self) -> &'static str {
        match self {
            Mood::Positive => "pozitif",
            Mood::Neutral => "nötr",
            Mood::Negative => "negatif",
        }
    }

    pub fn default_color(&self) -> &'static str {
        match self {
            Mood::Positive => POSITIVE_COLOR,
            Mood::Neutral => NEUTRAL_COLOR,
            Mood::Negative => NEGATIVE_COLOR,
        }
    }
}

impl From<String> for Mood {
    fn from(raw: String) -> Self {
        Mood::classify(&raw)
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// 'İ' lowercases to "i\u{307}"; the combining dot is dropped so "İYİ" folds to "iyi".
fn fold_token(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '.' | ',' | '!' | '*' | '`'))
        .to_lowercase()
        .chars()
        .filter(|c| *c != '\u{307}')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_synonyms_in_any_case() {
        for raw in ["positive", "POZITIF", "Happy", " mutlu ", "İYİ", "good\n", "Olumlu"] {
            assert_eq!(Mood::classify(raw), Mood::Positive, "{raw:?}");
        }
    }

    #[test]
    fn negative_synonyms_in_any_case() {
        for raw in ["negative", "Negatif", "SAD", "üzgün", "ÜZGÜN", " kötü", "Bad", "olumsuz"] {
            assert_eq!(Mood::classify(raw), Mood::Negative, "{raw:?}");
        }
    }

    #[test]
    fn anything_else_is_neutral() {
        for raw in ["", "nötr", "neutral", "meh", "positively", "sad-ish", "{}"] {
            assert_eq!(Mood::classify(raw), Mood::Neutral, "{raw:?}");
        }
    }

    #[test]
    fn surrounding_quotes_and_punctuation_are_ignored() {
        assert_eq!(Mood::classify("\"pozitif\","), Mood::Positive);
        assert_eq!(Mood::classify("**negatif**"), Mood::Negative);
    }

    #[test]
    fn classifying_a_canonical_token_is_a_no_op() {
        for mood in [Mood::Positive, Mood::Neutral, Mood::Negative] {
            assert_eq!(Mood::classify(mood.as_str()), mood);
            assert_eq!(Mood::classify(mood.label()), mood);
        }
    }

    #[test]
    fn legacy_spellings_deserialize() {
        let moods: Vec<Mood> = serde_json::from_str(r#"["pozitif","sad","nötr","positive"]"#).unwrap();
        assert_eq!(moods, vec![Mood::Positive, Mood::Negative, Mood::Neutral, Mood::Positive]);
        assert_eq!(serde_json::to_string(&Mood::Negative).unwrap(), "\"negative\"");
    }
}
