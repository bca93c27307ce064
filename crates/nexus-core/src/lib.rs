pub mod settings;
pub mod tags;
pub mod username;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub use settings::{ai_configured, AiSettings, Settings};
pub use tags::TagsInput;

/// Longest first name, last name or username the store accepts.
pub const MAX_NAME_LEN: usize = 50;

/// Profile columns in schema order. `first_name` and `last_name` are handled separately.
pub const PROFILE_FIELDS: [&str; 14] = [
    "email",
    "phone_number",
    "gender",
    "ethnicity",
    "birthday",
    "location",
    "high_school",
    "university",
    "uni_major",
    "job_title",
    "current_company",
    "field_of_interest",
    "profile_image_url",
    "linkedin_url",
];

// --- Types ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Profile {
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub ethnicity: Option<String>,
    /// Free text; extraction normalizes to YYYY-MM-DD when it can
    pub birthday: Option<String>,
    pub location: Option<String>,
    pub high_school: Option<String>,
    /// Comma-separated when several institutions are known
    pub university: Option<String>,
    pub uni_major: Option<String>,
    pub job_title: Option<String>,
    pub current_company: Option<String>,
    pub field_of_interest: Option<String>,
    pub profile_image_url: Option<String>,
    pub linkedin_url: Option<String>,
}

impl Profile {
    fn slot(&mut self, name: &str) -> Option<&mut Option<String>> {
        let slot = match name {
            "email" => &mut self.email,
            "phone_number" => &mut self.phone_number,
            "gender" => &mut self.gender,
            "ethnicity" => &mut self.ethnicity,
            "birthday" => &mut self.birthday,
            "location" => &mut self.location,
            "high_school" => &mut self.high_school,
            "university" => &mut self.university,
            "uni_major" => &mut self.uni_major,
            "job_title" => &mut self.job_title,
            "current_company" => &mut self.current_company,
            "field_of_interest" => &mut self.field_of_interest,
            "profile_image_url" => &mut self.profile_image_url,
            "linkedin_url" => &mut self.linkedin_url,
            _ => return None,
        };
        Some(slot)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        let value = match name {
            "email" => &self.email,
            "phone_number" => &self.phone_number,
            "gender" => &self.gender,
            "ethnicity" => &self.ethnicity,
            "birthday" => &self.birthday,
            "location" => &self.location,
            "high_school" => &self.high_school,
            "university" => &self.university,
            "uni_major" => &self.uni_major,
            "job_title" => &self.job_title,
            "current_company" => &self.current_company,
            "field_of_interest" => &self.field_of_interest,
            "profile_image_url" => &self.profile_image_url,
            "linkedin_url" => &self.linkedin_url,
            _ => return None,
        };
        value.as_deref()
    }

    /// Set a field by column name. Returns false for names that are not profile fields.
    pub fn set(&mut self, name: &str, value: Option<String>) -> bool {
        match self.slot(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Populated fields as (name, value), in schema order.
    pub fn values(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        PROFILE_FIELDS
            .iter()
            .filter_map(move |name| self.get(name).map(|v| (*name, v)))
    }
}

/// A row in the people table. Account holders and contacts share this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(default)]
    pub recent_tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewPerson {
    #[serde(default)]
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(default)]
    pub recent_tags: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    Missing(&'static str),
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("No fields to update")]
    NoChanges,
    #[error("Cannot connect a user to themselves")]
    SelfConnection,
}

fn check_name(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Missing(field));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong { field, max: MAX_NAME_LEN });
    }
    Ok(())
}

impl NewPerson {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(username) = &self.username {
            check_name("username", username)?;
        }
        check_name("first_name", &self.first_name)?;
        check_name("last_name", &self.last_name)
    }
}

/// Deserialize a present field (including an explicit `null`) as `Some`.
/// Paired with `#[serde(default)]`, absent fields stay `None`.
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Partial update of a person. For nullable columns the outer `Option` is
/// "field present", the inner one is the new value (`None` clears it).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PersonPatch {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub phone_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub gender: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub ethnicity: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub birthday: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub high_school: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub university: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub uni_major: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub job_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub current_company: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub field_of_interest: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub profile_image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub linkedin_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub recent_tags: Option<Option<TagsInput>>,
}

impl PersonPatch {
    /// Nullable profile columns that are present in the patch, as (column, value).
    pub fn profile_changes(&self) -> Vec<(&'static str, Option<&str>)> {
        let columns = [
            ("email", &self.email),
            ("phone_number", &self.phone_number),
            ("gender", &self.gender),
            ("ethnicity", &self.ethnicity),
            ("birthday", &self.birthday),
            ("location", &self.location),
            ("high_school", &self.high_school),
            ("university", &self.university),
            ("uni_major", &self.uni_major),
            ("job_title", &self.job_title),
            ("current_company", &self.current_company),
            ("field_of_interest", &self.field_of_interest),
            ("profile_image_url", &self.profile_image_url),
            ("linkedin_url", &self.linkedin_url),
        ];
        columns
            .into_iter()
            .filter_map(|(column, value)| value.as_ref().map(|v| (column, v.as_deref())))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.recent_tags.is_none()
            && self.profile_changes().is_empty()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("username", &self.username),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
        ] {
            if let Some(v) = value {
                check_name(field, v)?;
            }
        }
        Ok(())
    }
}

/// One outgoing relationship, joined with the contact it points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(flatten)]
    pub contact: Person,
    pub relationship_description: Option<String>,
    pub note: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub what_they_are_working_on: Option<String>,
    pub last_viewed: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewConnection {
    pub user_id: i64,
    pub contact_id: i64,
    /// Shared by both directions
    pub relationship_description: Option<String>,
    pub note: Option<String>,
    pub tags: Vec<String>,
    pub what_they_are_working_on: Option<String>,
}

/// Partial update of a connection. Only the description is mirrored onto the
/// reverse row; everything else belongs to the `user_id -> contact_id` direction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionPatch {
    pub relationship_description: Option<Option<String>>,
    pub note: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub what_they_are_working_on: Option<Option<String>>,
}

impl ConnectionPatch {
    pub fn is_empty(&self) -> bool {
        self.relationship_description.is_none()
            && self.note.is_none()
            && self.tags.is_none()
            && self.what_they_are_working_on.is_none()
    }
}
