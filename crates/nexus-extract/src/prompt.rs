use nexus_core::{Person, Profile, PROFILE_FIELDS};
use serde::Deserialize;

/// Shape the model is asked to reply with. Only used to render the schema.
#[derive(Deserialize, schemars::JsonSchema)]
#[allow(dead_code)]
struct ContactReply {
    first_name: Option<String>,
    last_name: Option<String>,
    #[serde(flatten)]
    profile: Profile,
    /// Current projects or work the person is busy with
    what_they_are_working_on: Option<String>,
    /// Everything from the input that no other field captured
    note: Option<String>,
}

fn reply_schema() -> String {
    let schema = schemars::schema_for!(ContactReply);
    serde_json::to_string(&schema).unwrap_or_default()
}

pub fn extraction_system_prompt() -> String {
    let mut fields = vec!["first_name", "last_name"];
    fields.extend(PROFILE_FIELDS);
    fields.push("what_they_are_working_on");

    format!(
        "You turn a short description of a person into a contact record.\n\
\n\
Fields: {fields}, plus note.\n\
\n\
Rules:\n\
1. Input may be a full paragraph or terse shorthand such as \
\"Dana Kim CMU into real estate and climbing asian female\".\n\
2. Recognise schools and abbreviations (\"CMU\" may stay \"CMU\"). Several institutions \
go in university as a comma-separated list, e.g. \"Stanford, MIT\".\n\
3. Unlabelled interests count: \"interested in X and Y\" gives field_of_interest \"X and Y\".\n\
4. Record gender and ethnicity only when stated.\n\
5. Write birthday as YYYY-MM-DD when a date is given.\n\
6. Use null for anything not present. Never invent values.\n\
7. Fill first_name and last_name only when they are clearly identifiable.\n\
8. note must keep every detail that did not land in a field: how they met, \
shared friends, hobbies, personality, anything else. Nothing from the input may be lost. \
If note would be empty, re-read the input before answering.\n\
\n\
Reply with one JSON object and nothing else. JSON schema:\n{schema}",
        fields = fields.join(", "),
        schema = reply_schema(),
    )
}

/// Compact "key: value" lines describing the current user, skipping empty fields.
pub fn user_profile_text(user: &Person) -> String {
    let name = user.full_name();
    let p = &user.profile;
    let lines = [
        ("name", Some(name.as_str())),
        ("location", p.location.as_deref()),
        ("high_school", p.high_school.as_deref()),
        ("university", p.university.as_deref()),
        ("uni_major", p.uni_major.as_deref()),
        ("job_title", p.job_title.as_deref()),
        ("current_company", p.current_company.as_deref()),
        ("field_of_interest", p.field_of_interest.as_deref()),
    ];
    lines
        .iter()
        .filter_map(|(key, value)| {
            value
                .filter(|v| !v.trim().is_empty())
                .map(|v| format!("{key}: {v}"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn relationship_system_prompt(profile_text: &str, contact_text: &str, tags: &[String]) -> String {
    let mut out = String::with_capacity(512);
    out.push_str("Name the relationship between two people in 1-5 words.\n\n");
    out.push_str("The current user:\n");
    out.push_str(profile_text);
    out.push_str("\n\nThe contact they are adding:\n");
    out.push_str(contact_text.trim());
    out.push('\n');
    if !tags.is_empty() {
        out.push_str("\nTags on this relationship: ");
        out.push_str(&tags.join(", "));
        out.push('\n');
    }
    out.push_str(
        "\nExamples: \"College Friend\", \"Work Colleague\", \"Networking Contact\", \
\"Industry Peer\", \"Former Classmate\".\n\
Capitalize every word. Reply with the description only.",
    );
    out
}

pub const RELATIONSHIP_USER_MESSAGE: &str = "Describe the relationship.";

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn person() -> Person {
        Person {
            id: 1,
            username: "annlee".into(),
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            profile: Profile {
                university: Some("CMU".into()),
                job_title: Some("  ".into()),
                email: Some("ann@example.com".into()),
                ..Profile::default()
            },
            recent_tags: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn profile_text_skips_blank_and_private_fields() {
        let text = user_profile_text(&person());
        assert_eq!(text, "name: Ann Lee\nuniversity: CMU");
    }

    #[test]
    fn extraction_prompt_lists_every_field() {
        let prompt = extraction_system_prompt();
        for field in PROFILE_FIELDS {
            assert!(prompt.contains(field), "missing {field}");
        }
        assert!(prompt.contains("what_they_are_working_on"));
        assert!(prompt.contains("\"note\""));
    }

    #[test]
    fn relationship_prompt_mentions_tags_only_when_present() {
        let with = relationship_system_prompt("name: Ann", "Bob from work", &["work".into()]);
        assert!(with.contains("Tags on this relationship: work"));
        let without = relationship_system_prompt("name: Ann", "Bob from work", &[]);
        assert!(!without.contains("Tags on this relationship"));
    }
}
