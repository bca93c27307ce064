use chrono::{DateTime, Utc};
use nexus_core::tags::split_tags;
use nexus_core::{Connection, Person, Profile};
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub(crate) struct PersonRow {
    id: i64,
    username: String,
    first_name: String,
    last_name: String,
    email: Option<String>,
    phone_number: Option<String>,
    gender: Option<String>,
    ethnicity: Option<String>,
    birthday: Option<String>,
    location: Option<String>,
    high_school: Option<String>,
    university: Option<String>,
    uni_major: Option<String>,
    job_title: Option<String>,
    current_company: Option<String>,
    field_of_interest: Option<String>,
    profile_image_url: Option<String>,
    linkedin_url: Option<String>,
    recent_tags: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<PersonRow> for Person {
    fn from(row: PersonRow) -> Self {
        Person {
            id: row.id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            profile: Profile {
                email: row.email,
                phone_number: row.phone_number,
                gender: row.gender,
                ethnicity: row.ethnicity,
                birthday: row.birthday,
                location: row.location,
                high_school: row.high_school,
                university: row.university,
                uni_major: row.uni_major,
                job_title: row.job_title,
                current_company: row.current_company,
                field_of_interest: row.field_of_interest,
                profile_image_url: row.profile_image_url,
                linkedin_url: row.linkedin_url,
            },
            recent_tags: split_tags(row.recent_tags.as_deref()),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ConnectionRow {
    #[sqlx(flatten)]
    person: PersonRow,
    relationship_description: Option<String>,
    notes: Option<String>,
    tags: Option<String>,
    what_they_are_working_on: Option<String>,
    last_viewed: Option<DateTime<Utc>>,
}

impl From<ConnectionRow> for Connection {
    fn from(row: ConnectionRow) -> Self {
        Connection {
            contact: row.person.into(),
            relationship_description: row.relationship_description,
            note: row.notes,
            tags: split_tags(row.tags.as_deref()),
            what_they_are_working_on: row.what_they_are_working_on,
            last_viewed: row.last_viewed,
        }
    }
}
