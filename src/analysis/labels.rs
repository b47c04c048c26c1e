use lazy_static::lazy_static;
use regex::Regex;

use super::{ ExtractionStrategy, PartialAnalysis, COLOR_KEYS, MOOD_KEYS, RECOMMENDATION_KEYS, SUMMARY_KEYS };

lazy_static! {
    // `Label:`, `Label :`, `Label：`, `**Label**:` and quoted `"Label":` in any case.
    static ref FIELD_LABEL: Regex = Regex::new(
        r#"(?i)["']?\b(duygu|mood|renk|color|özet|summary|öneri|recommendation)\b["']?\**[ \t]*[:：]"#
    ).unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Mood,
    Color,
    Summary,
    Recommendation,
}

impl Field {
    fn from_label(label: &str) -> Option<Field> {
        let label = label.to_lowercase();
        let is = |keys: &[&str; 2]| keys.iter().any(|k| k.to_lowercase() == label);
        if is(&MOOD_KEYS) {
            Some(Field::Mood)
        } else if is(&COLOR_KEYS) {
            Some(Field::Color)
        } else if is(&SUMMARY_KEYS) {
            Some(Field::Summary)
        } else if is(&RECOMMENDATION_KEYS) {
            Some(Field::Recommendation)
        } else {
            None
        }
    }

    /// Short fields stop at the first whitespace, free text runs to the next label.
    fn is_short(&self) -> bool {
        matches!(self, Field::Mood | Field::Color)
    }
}

/// Scans `label: value` pairs line-style, for replies that ignored the JSON
/// instruction.
pub struct LabelExtraction;

impl ExtractionStrategy for LabelExtraction {
    fn name(&self) -> &'static str {
        "labels"
    }

    fn extract(&self, text: &str) -> Option<PartialAnalysis> {
        let hits: Vec<(Option<Field>, usize, usize)> = FIELD_LABEL
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let label = caps.get(1)?;
                Some((Field::from_label(label.as_str()), whole.start(), whole.end()))
            })
            .collect();

        let mut partial = PartialAnalysis::default();
        for (i, (field, _, value_start)) in hits.iter().enumerate() {
            let Some(field) = field else { continue };
            let value_end = hits.get(i + 1).map(|(_, start, _)| *start).unwrap_or(text.len());
            let Some(value) = clean_value(&text[*value_start..value_end], *field) else { continue };

            let slot = match field {
                Field::Mood => &mut partial.mood,
                Field::Color => &mut partial.color,
                Field::Summary => &mut partial.summary,
                Field::Recommendation => &mut partial.recommendation,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }

        if partial.is_empty() { None } else { Some(partial) }
    }
}

fn clean_value(raw: &str, field: Field) -> Option<String> {
    // Also drops the `",` and closing brace left over from almost-JSON replies.
    let trim = |s: &str| {
        s.trim_matches(|c: char| {
            c.is_whitespace() || matches!(c, '*' | '"' | '\'' | '`' | ',' | '{' | '}')
        }).to_string()
    };
    let value = if field.is_short() {
        let token = trim(raw).split_whitespace().next().unwrap_or("").to_string();
        token.trim_end_matches(|c: char| matches!(c, ',' | ';' | '.' | '"' | '\'')).to_string()
    } else {
        trim(raw)
    };

    if value.is_empty() { None } else { Some(value) }
}
