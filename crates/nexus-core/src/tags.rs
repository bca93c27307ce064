//! Tag rules shared by connections and each person's recent-tag list.
//!
//! Tags are stored as one comma-separated column. Anything that accepts tags
//! from a client goes through [`TagsInput::normalize`] so that what is stored
//! splits back into exactly the same list.

use serde::{Deserialize, Serialize};

pub const DEFAULT_TAGS: [&str; 5] = ["friend", "work", "family", "school", "important"];

pub const MAX_RECENT_TAGS: usize = 20;

pub fn default_tags() -> Vec<String> {
    DEFAULT_TAGS.iter().map(|t| t.to_string()).collect()
}

/// Clients send tags either as an array or as a single comma-separated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Text(String),
}

impl TagsInput {
    /// Split on commas, trim, drop empties and duplicates (first occurrence wins).
    pub fn normalize(&self) -> Vec<String> {
        match self {
            TagsInput::List(items) => clean(items.iter().flat_map(|item| item.split(','))),
            TagsInput::Text(text) => clean(text.split(',')),
        }
    }
}

fn clean<'a>(parts: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in parts {
        let tag = part.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Column value for a tag list. Empty lists are stored as NULL.
pub fn join_tags(tags: &[String]) -> Option<String> {
    if tags.is_empty() {
        None
    } else {
        Some(tags.join(","))
    }
}

pub fn split_tags(column: Option<&str>) -> Vec<String> {
    column.map(|c| clean(c.split(','))).unwrap_or_default()
}

/// Tags not yet in `current` go to the front in the given order. Tags already
/// in `current` keep their place. Capped at `max`.
pub fn merge_recent(new: &[String], current: &[String], max: usize) -> Vec<String> {
    let current = clean(current.iter().map(String::as_str));
    let fresh = new.iter().map(String::as_str).filter(|t| !current.iter().any(|c| c == t.trim()));
    let mut merged = clean(fresh.chain(current.iter().map(String::as_str)));
    merged.truncate(max);
    merged
}

/// A list written as a whole: normalized and capped at `max`.
pub fn cap_recent(tags: &TagsInput, max: usize) -> Vec<String> {
    let mut list = tags.normalize();
    list.truncate(max);
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalize_accepts_list_or_string() {
        let from_list: TagsInput = serde_json::from_str(r#"["work", " mentor ", "", "work"]"#).unwrap();
        assert_eq!(from_list.normalize(), tags(&["work", "mentor"]));

        let from_text: TagsInput = serde_json::from_str(r#""friend, ,climbing,friend""#).unwrap();
        assert_eq!(from_text.normalize(), tags(&["friend", "climbing"]));
    }

    #[test]
    fn list_items_containing_commas_are_split() {
        let input = TagsInput::List(tags(&["a,b", "c"]));
        assert_eq!(input.normalize(), tags(&["a", "b", "c"]));
    }

    #[test]
    fn join_and_split_round_trip() {
        assert_eq!(join_tags(&[]), None);
        let list = tags(&["x", "y z"]);
        let column = join_tags(&list);
        assert_eq!(column.as_deref(), Some("x,y z"));
        assert_eq!(split_tags(column.as_deref()), list);
        assert!(split_tags(None).is_empty());
    }

    #[test]
    fn merge_recent_puts_only_unseen_tags_in_front() {
        let current = tags(&["friend", "work", "family"]);
        let merged = merge_recent(&tags(&["climbing", "work", " climbing"]), &current, MAX_RECENT_TAGS);
        assert_eq!(merged, tags(&["climbing", "friend", "work", "family"]));
    }

    #[test]
    fn cap_recent_normalizes_and_truncates() {
        let input = TagsInput::Text("a,a, b ,c,d".into());
        assert_eq!(cap_recent(&input, 3), tags(&["a", "b", "c"]));
        let long = TagsInput::List((0..30).map(|i| format!("t{i}")).collect());
        assert_eq!(cap_recent(&long, MAX_RECENT_TAGS).len(), MAX_RECENT_TAGS);
    }

    #[test]
    fn merge_recent_caps_length() {
        let current: Vec<String> = (0..MAX_RECENT_TAGS).map(|i| format!("t{i}")).collect();
        let merged = merge_recent(&tags(&["fresh"]), &current, MAX_RECENT_TAGS);
        assert_eq!(merged.len(), MAX_RECENT_TAGS);
        assert_eq!(merged[0], "fresh");
        assert_eq!(merged.last().map(String::as_str), Some("t18"));
    }
}
