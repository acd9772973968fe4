//! The haiku itself: prompt contract, wire shape and the 5-7-5 check.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::constants::HAIKU_LINE_LENGTHS;

/// A validated haiku. `ja` is 5-7-5 characters, `en` translates it line by line.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct HaikuResult {
    /// Japanese lines, top to bottom
    pub ja: [String; 3],
    /// English translation, same line order
    pub en: [String; 3],
}

/// Untrusted payload as the model produced it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawHaiku {
    /// Japanese lines, if the model supplied any
    #[serde(default)]
    pub ja: Vec<String>,
    /// English lines, if the model supplied any
    #[serde(default)]
    pub en: Vec<String>,
}

/// Why a payload isn't a haiku.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ShapeViolation {
    /// `ja` didn't hold three lines
    JapaneseLineCount(usize),
    /// A Japanese line had the wrong number of characters
    JapaneseLineLength {
        /// zero-based line index
        line: usize,
        /// required characters
        expected: usize,
        /// characters found
        actual: usize,
    },
    /// `en` didn't hold three lines
    EnglishLineCount(usize),
}

impl std::fmt::Display for ShapeViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::JapaneseLineCount(count) => write!(f, "expected 3 Japanese lines, got {count}"),
            Self::JapaneseLineLength {
                line,
                expected,
                actual,
            } => write!(
                f,
                "Japanese line {} has {actual} characters, expected {expected}",
                line + 1
            ),
            Self::EnglishLineCount(count) => write!(f, "expected 3 English lines, got {count}"),
        }
    }
}

impl RawHaiku {
    /// Parses the model's text payload.
    pub fn from_payload(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload.trim())
    }

    /// Checks the 5-7-5 contract and returns the haiku when it holds.
    pub fn validate(self) -> Result<HaikuResult, ShapeViolation> {
        let ja: [String; 3] = self
            .ja
            .try_into()
            .map_err(|lines: Vec<String>| ShapeViolation::JapaneseLineCount(lines.len()))?;
        for (line, (text, expected)) in ja.iter().zip(HAIKU_LINE_LENGTHS).enumerate() {
            let actual = char_count(text);
            if actual != expected {
                return Err(ShapeViolation::JapaneseLineLength {
                    line,
                    expected,
                    actual,
                });
            }
        }
        let en: [String; 3] = self
            .en
            .try_into()
            .map_err(|lines: Vec<String>| ShapeViolation::EnglishLineCount(lines.len()))?;
        Ok(HaikuResult { ja, en })
    }
}

/// Counts Unicode scalar values, which is what "characters" means for the Japanese lines.
pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// Cuts `text` down to at most `max` characters without splitting one.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// System instruction fixing the output contract.
pub fn system_instructions() -> String {
    let [first, second, third] = HAIKU_LINE_LENGTHS;
    [
        "You transform English input into a Japanese haiku.".to_string(),
        "Return strict JSON with keys 'ja' and 'en'.".to_string(),
        "'ja' must be an array of exactly three Japanese strings.".to_string(),
        format!(
            "Line one must contain exactly {first} characters, line two {second} characters, and line three {third} characters, counting literal characters, not syllables."
        ),
        "Do not include punctuation, spaces, or ruby/furigana in the Japanese lines.".to_string(),
        "'en' must be an array of natural English translations, one per line in the same order."
            .to_string(),
    ]
    .join(" ")
}

/// User message carrying the input text.
pub fn user_message(text: &str) -> String {
    format!("Text: {text}")
}

/// JSON schema handed to the structured-output request.
pub fn haiku_schema() -> Value {
    let ja_items = HAIKU_LINE_LENGTHS
        .iter()
        .map(|len| json!({"type": "string", "minLength": len, "maxLength": len}))
        .collect::<Vec<_>>();
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["ja", "en"],
        "properties": {
            "ja": {
                "type": "array",
                "minItems": 3,
                "maxItems": 3,
                "items": ja_items,
                "additionalItems": false
            },
            "en": {
                "type": "array",
                "minItems": 3,
                "maxItems": 3,
                "items": {"type": "string"}
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn counts_scalars_not_bytes() {
        assert_eq!(char_count("ふるいけや"), 5);
        assert_eq!(char_count("かわずとびこむ"), 7);
        assert_eq!("ふるいけや".len(), 15);
    }

    #[test]
    fn accepts_five_seven_five() {
        let raw = RawHaiku {
            ja: lines(&["ふるいけや", "かわずとびこむ", "みずのおと"]),
            en: lines(&["An old pond", "a frog jumps in", "the sound of water"]),
        };
        let haiku = raw.validate().expect("valid haiku");
        assert_eq!(haiku.ja[1], "かわずとびこむ");
        assert_eq!(haiku.en[2], "the sound of water");
    }

    #[test]
    fn rejects_wrong_lengths() {
        let raw = RawHaiku {
            ja: lines(&["朝の霜", "とても冷たい風吹く", "春が来る"]),
            en: lines(&["a", "b", "c"]),
        };
        assert_eq!(
            raw.validate(),
            Err(ShapeViolation::JapaneseLineLength {
                line: 0,
                expected: 5,
                actual: 3
            })
        );
    }

    #[test]
    fn rejects_wrong_line_counts() {
        let raw = RawHaiku {
            ja: lines(&["ふるいけや", "かわずとびこむ"]),
            en: lines(&["a", "b", "c"]),
        };
        assert_eq!(raw.validate(), Err(ShapeViolation::JapaneseLineCount(2)));

        let raw = RawHaiku {
            ja: lines(&["ふるいけや", "かわずとびこむ", "みずのおと"]),
            en: vec![],
        };
        assert_eq!(raw.validate(), Err(ShapeViolation::EnglishLineCount(0)));
    }

    #[test]
    fn payload_missing_keys_is_empty_not_an_error() {
        let raw = RawHaiku::from_payload("{}").expect("parse");
        assert!(raw.ja.is_empty());
        assert!(RawHaiku::from_payload("not json").is_err());
    }

    #[test]
    fn truncation_respects_character_boundaries() {
        assert_eq!(truncate_chars("ふるいけや", 3), "ふるい");
        assert_eq!(truncate_chars("pond", 200), "pond");
        let long = "a".repeat(250);
        assert_eq!(truncate_chars(&long, 200).len(), 200);
    }

    #[test]
    fn schema_pins_line_lengths() {
        let schema = haiku_schema();
        assert_eq!(schema["properties"]["ja"]["items"][1]["minLength"], 7);
        assert_eq!(schema["properties"]["en"]["maxItems"], 3);
        assert!(system_instructions().contains("exactly 5 characters, line two 7"));
    }
}
