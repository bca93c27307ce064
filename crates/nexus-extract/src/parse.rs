use nexus_core::Profile;
use serde_json::{Map, Value};

use crate::{ExtractError, Extraction, ExtractionMethod};

const NOTE_MIN_LEN: usize = 10;
const UNCAPTURED_SLACK: usize = 20;
const MAX_DESCRIPTION_LEN: usize = 50;

/// What the model returned, after lenient coercion.
#[derive(Debug, Default)]
pub(crate) struct ParsedContact {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile: Profile,
    pub what_they_are_working_on: Option<String>,
    pub note: Option<String>,
    /// Whether the reply carried a `note` key at all (even null)
    pub had_note: bool,
}

/// Extract the JSON object substring from raw LLM output (fences, prose around it).
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Strings are trimmed, numbers and booleans stringified, blanks dropped.
fn coerce(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Returns None when the reply holds no parseable JSON object.
pub(crate) fn parse_contact_reply(raw: &str) -> Option<ParsedContact> {
    let json = extract_json_object(raw)?;
    let map: Map<String, Value> = serde_json::from_str(json).ok()?;

    let mut parsed = ParsedContact {
        had_note: map.contains_key("note"),
        ..ParsedContact::default()
    };
    for (key, value) in &map {
        let value = coerce(value);
        match key.as_str() {
            "first_name" => parsed.first_name = value,
            "last_name" => parsed.last_name = value,
            "what_they_are_working_on" => parsed.what_they_are_working_on = value,
            "note" => parsed.note = value,
            other => {
                parsed.profile.set(other, value);
            }
        }
    }
    Some(parsed)
}

/// Fallback when no model is available: first two words are the name.
pub(crate) fn basic_extraction(text: &str) -> Result<Extraction, ExtractError> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < 2 {
        return Err(ExtractError::MissingName(
            "At least first and last name are required.",
        ));
    }
    let note = if words.len() > 2 {
        text.trim().to_string()
    } else {
        String::new()
    };
    Ok(Extraction {
        first_name: words[0].to_string(),
        last_name: words[1].to_string(),
        profile: Profile::default(),
        what_they_are_working_on: None,
        note,
        method: ExtractionMethod::Basic,
        message: "Basic processing only (language model unavailable).".to_string(),
    })
}

fn structured_values(parsed: &ParsedContact) -> Vec<&str> {
    let mut values: Vec<&str> = parsed.profile.values().map(|(_, v)| v).collect();
    values.extend(parsed.first_name.as_deref());
    values.extend(parsed.last_name.as_deref());
    values.extend(parsed.what_they_are_working_on.as_deref());
    values
}

/// Words of the input that appear in no structured value.
fn leftover_words(text: &str, structured: &[&str]) -> String {
    let lowered: Vec<String> = structured.iter().map(|v| v.to_lowercase()).collect();
    text.to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c| matches!(c, '.' | ',' | ';' | ':')))
        .filter(|w| !w.is_empty() && lowered.iter().all(|v| !v.contains(w)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turn a parsed reply into an extraction, making sure nothing from `text` is lost.
pub(crate) fn finish_extraction(text: &str, parsed: ParsedContact) -> Result<Extraction, ExtractError> {
    let structured = structured_values(&parsed);
    let mut note = match (&parsed.note, parsed.had_note) {
        (Some(note), _) => note.clone(),
        (None, true) => String::new(),
        (None, false) => leftover_words(text, &structured),
    };

    let captured: usize = structured.iter().map(|v| v.chars().count()).sum();
    let text_len = text.trim().chars().count();
    if note.trim().chars().count() < NOTE_MIN_LEN && text_len > captured + UNCAPTURED_SLACK {
        note = format!("Additional information: {}", text.trim());
    }

    let (Some(first_name), Some(last_name)) = (parsed.first_name, parsed.last_name) else {
        return Err(ExtractError::MissingName(
            "Could not extract first and last name from the text. Please provide clearer information.",
        ));
    };

    Ok(Extraction {
        first_name,
        last_name,
        profile: parsed.profile,
        what_they_are_working_on: parsed.what_they_are_working_on,
        note,
        method: ExtractionMethod::Llm,
        message: "Successfully extracted user information.".to_string(),
    })
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Clean a model-proposed relationship description. None when nothing usable is left.
pub(crate) fn sanitize_description(raw: &str) -> Option<String> {
    let trimmed = raw
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '.' | ',' | ';' | ':'));
    let capped: String = trimmed.chars().take(MAX_DESCRIPTION_LEN).collect();
    let words: Vec<&str> = capped.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }
    let all_capitalized = words
        .iter()
        .all(|w| w.chars().next().is_some_and(char::is_uppercase));
    if all_capitalized {
        Some(words.join(" "))
    } else {
        Some(words.iter().map(|w| capitalize(w)).collect::<Vec<_>>().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reply_inside_code_fence_is_found() {
        let raw = "Here you go:\n```json\n{\"first_name\": \"Dana\", \"last_name\": \"Kim\"}\n```";
        let parsed = parse_contact_reply(raw).unwrap();
        assert_eq!(parsed.first_name.as_deref(), Some("Dana"));
        assert_eq!(parsed.last_name.as_deref(), Some("Kim"));
        assert!(!parsed.had_note);
    }

    #[test]
    fn values_are_coerced() {
        let raw = r#"{"first_name": " Dana ", "last_name": "Kim", "phone_number": 5551234,
                     "email": "", "gender": null, "favourite_color": "red", "note": null}"#;
        let parsed = parse_contact_reply(raw).unwrap();
        assert_eq!(parsed.first_name.as_deref(), Some("Dana"));
        assert_eq!(parsed.profile.phone_number.as_deref(), Some("5551234"));
        assert_eq!(parsed.profile.email, None);
        assert_eq!(parsed.profile.gender, None);
        assert!(parsed.had_note);
        assert_eq!(parsed.note, None);
    }

    #[test]
    fn garbage_reply_is_none() {
        assert!(parse_contact_reply("I cannot help with that").is_none());
        assert!(parse_contact_reply("} nope {").is_none());
        assert!(parse_contact_reply("{not json}").is_none());
    }

    #[test]
    fn basic_extraction_keeps_whole_text_as_note() {
        let e = basic_extraction("Dana Kim met at the climbing gym").unwrap();
        assert_eq!(e.first_name, "Dana");
        assert_eq!(e.last_name, "Kim");
        assert_eq!(e.note, "Dana Kim met at the climbing gym");
        assert_eq!(e.method, ExtractionMethod::Basic);

        assert_eq!(basic_extraction("Dana Kim").unwrap().note, "");
        assert!(matches!(basic_extraction("Dana"), Err(ExtractError::MissingName(_))));
    }

    #[test]
    fn missing_note_is_rebuilt_from_uncaptured_words() {
        let text = "Dana Kim, CMU. Loves bouldering";
        let parsed = parse_contact_reply(
            r#"{"first_name": "Dana", "last_name": "Kim", "university": "CMU"}"#,
        )
        .unwrap();
        let e = finish_extraction(text, parsed).unwrap();
        assert_eq!(e.note, "loves bouldering");
        assert_eq!(e.method, ExtractionMethod::Llm);
    }

    #[test]
    fn thin_note_falls_back_to_full_text() {
        let text = "Dana Kim who I met through my sister at the lake house last summer";
        let parsed =
            parse_contact_reply(r#"{"first_name": "Dana", "last_name": "Kim", "note": "sister"}"#)
                .unwrap();
        let e = finish_extraction(text, parsed).unwrap();
        assert_eq!(e.note, format!("Additional information: {text}"));
    }

    #[test]
    fn rich_note_is_kept() {
        let text = "Dana Kim who I met through my sister";
        let parsed = parse_contact_reply(
            r#"{"first_name": "Dana", "last_name": "Kim", "note": "Met through my sister"}"#,
        )
        .unwrap();
        assert_eq!(finish_extraction(text, parsed).unwrap().note, "Met through my sister");
    }

    #[test]
    fn reply_without_name_is_an_error() {
        let parsed = parse_contact_reply(r#"{"first_name": "Dana", "university": "CMU"}"#).unwrap();
        assert!(matches!(
            finish_extraction("Dana from CMU", parsed),
            Err(ExtractError::MissingName(_))
        ));
    }

    #[test]
    fn descriptions_are_sanitized() {
        assert_eq!(sanitize_description("  \"college friend.\" ").as_deref(), Some("College Friend"));
        assert_eq!(sanitize_description("Work Colleague").as_deref(), Some("Work Colleague"));
        assert_eq!(sanitize_description("iNDUSTRY peer").as_deref(), Some("Industry Peer"));
        assert_eq!(sanitize_description(" '.' "), None);
        let long = sanitize_description(&"Very ".repeat(20)).unwrap();
        assert!(long.chars().count() <= 50);
    }
}
