use log::debug;
use serde_json::{ Map, Value as JsonValue };

use super::{
    ExtractionStrategy,
    PartialAnalysis,
    COLOR_KEYS,
    MOOD_KEYS,
    RECOMMENDATION_KEYS,
    SUMMARY_KEYS,
};

/// Parses the span between the first `{` and the last `}` as a JSON object.
pub struct StructuredExtraction;

impl ExtractionStrategy for StructuredExtraction {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn extract(&self, text: &str) -> Option<PartialAnalysis> {
        let start = text.find('{')?;
        let end = text.rfind('}')?;
        if end < start {
            return None;
        }

        let object = match serde_json::from_str::<JsonValue>(&text[start..=end]) {
            Ok(JsonValue::Object(map)) => map,
            Ok(_) => return None,
            Err(e) => {
                debug!("Reply braces did not hold a JSON object: {}", e);
                return None;
            }
        };

        Some(PartialAnalysis {
            mood: lookup(&object, &MOOD_KEYS),
            color: lookup(&object, &COLOR_KEYS),
            summary: lookup(&object, &SUMMARY_KEYS),
            recommendation: lookup(&object, &RECOMMENDATION_KEYS),
        })
    }
}

// Keys are compared case-insensitively; the first spelling that is present wins.
fn lookup(object: &Map<String, JsonValue>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|wanted| {
        let wanted = wanted.to_lowercase();
        object
            .iter()
            .find(|(key, _)| key.trim().to_lowercase() == wanted)
            .and_then(|(_, value)| as_text(value))
    })
}

fn as_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_stay_empty() {
        let partial = StructuredExtraction.extract(r#"{"Duygu": "nötr"}"#).unwrap();
        assert_eq!(partial.mood.as_deref(), Some("nötr"));
        assert_eq!(partial.summary, None);
    }

    #[test]
    fn only_a_parseable_object_counts() {
        assert_eq!(StructuredExtraction.extract("[{}]x"), Some(PartialAnalysis::default()));
        assert_eq!(StructuredExtraction.extract("{not json}"), None);
        assert_eq!(StructuredExtraction.extract("} before {"), None);
    }

    #[test]
    fn null_values_count_as_missing() {
        let partial = StructuredExtraction.extract(r#"{"Renk": null, "Öneri": 3}"#).unwrap();
        assert_eq!(partial.color, None);
        assert_eq!(partial.recommendation.as_deref(), Some("3"));
    }
}
