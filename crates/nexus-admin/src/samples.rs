//! Demo people and relationships loaded by `nexus-admin setup`.

use anyhow::Context;
use nexus_core::tags::default_tags;
use nexus_core::{NewConnection, NewPerson, Profile};
use nexus_db::{Store, StoreError};

struct SamplePerson {
    username: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    email: &'static str,
    phone_number: &'static str,
    location: &'static str,
    university: &'static str,
    field_of_interest: &'static str,
    high_school: &'static str,
    gender: &'static str,
    ethnicity: &'static str,
    uni_major: &'static str,
    job_title: &'static str,
    current_company: &'static str,
    profile_image_url: &'static str,
    linkedin_url: &'static str,
}

impl SamplePerson {
    fn to_new(&self) -> NewPerson {
        let s = |v: &str| Some(v.to_string());
        NewPerson {
            username: s(self.username),
            first_name: self.first_name.to_string(),
            last_name: self.last_name.to_string(),
            profile: Profile {
                email: s(self.email),
                phone_number: s(self.phone_number),
                location: s(self.location),
                university: s(self.university),
                field_of_interest: s(self.field_of_interest),
                high_school: s(self.high_school),
                gender: s(self.gender),
                ethnicity: s(self.ethnicity),
                uni_major: s(self.uni_major),
                job_title: s(self.job_title),
                current_company: s(self.current_company),
                profile_image_url: s(self.profile_image_url),
                linkedin_url: s(self.linkedin_url),
                birthday: None,
            },
            recent_tags: Some(default_tags()),
        }
    }
}

const PEOPLE: [SamplePerson; 5] = [
    SamplePerson {
        username: "johndoe",
        first_name: "John",
        last_name: "Doe",
        email: "john.doe@example.com",
        phone_number: "555-123-4567",
        location: "New York, NY",
        university: "Stanford University",
        field_of_interest: "Computer Science, Artificial Intelligence",
        high_school: "Brooklyn Tech High School",
        gender: "Male",
        ethnicity: "White",
        uni_major: "Computer Science",
        job_title: "Software Engineer",
        current_company: "Google",
        profile_image_url: "https://randomuser.me/api/portraits/men/1.jpg",
        linkedin_url: "https://linkedin.com/in/johndoe",
    },
    SamplePerson {
        username: "janedoe",
        first_name: "Jane",
        last_name: "Doe",
        email: "jane.doe@example.com",
        phone_number: "555-987-6543",
        location: "San Francisco, CA",
        university: "UC Berkeley",
        field_of_interest: "Data Science, Machine Learning",
        high_school: "Mission High School",
        gender: "Female",
        ethnicity: "Asian",
        uni_major: "Statistics",
        job_title: "Data Scientist",
        current_company: "Meta",
        profile_image_url: "https://randomuser.me/api/portraits/women/1.jpg",
        linkedin_url: "https://linkedin.com/in/janedoe",
    },
    SamplePerson {
        username: "msmith",
        first_name: "Michael",
        last_name: "Smith",
        email: "michael.smith@example.com",
        phone_number: "555-456-7890",
        location: "Chicago, IL",
        university: "University of Chicago",
        field_of_interest: "Finance, Economics",
        high_school: "Whitney M. Young Magnet High School",
        gender: "Male",
        ethnicity: "Black",
        uni_major: "Economics",
        job_title: "Financial Analyst",
        current_company: "Goldman Sachs",
        profile_image_url: "https://randomuser.me/api/portraits/men/2.jpg",
        linkedin_url: "https://linkedin.com/in/michaelsmith",
    },
    SamplePerson {
        username: "ejohnson",
        first_name: "Emily",
        last_name: "Johnson",
        email: "emily.johnson@example.com",
        phone_number: "555-789-0123",
        location: "Boston, MA",
        university: "Harvard University",
        field_of_interest: "Medicine, Research",
        high_school: "Boston Latin School",
        gender: "Female",
        ethnicity: "White",
        uni_major: "Biology",
        job_title: "Medical Researcher",
        current_company: "Massachusetts General Hospital",
        profile_image_url: "https://randomuser.me/api/portraits/women/2.jpg",
        linkedin_url: "https://linkedin.com/in/emilyjohnson",
    },
    SamplePerson {
        username: "dwilliams",
        first_name: "David",
        last_name: "Williams",
        email: "david.williams@example.com",
        phone_number: "555-234-5678",
        location: "Seattle, WA",
        university: "University of Washington",
        field_of_interest: "Engineering, Robotics",
        high_school: "Roosevelt High School",
        gender: "Male",
        ethnicity: "Hispanic",
        uni_major: "Mechanical Engineering",
        job_title: "Robotics Engineer",
        current_company: "Amazon",
        profile_image_url: "https://randomuser.me/api/portraits/men/3.jpg",
        linkedin_url: "https://linkedin.com/in/davidwilliams",
    },
];

/// (user index, contact index, description, note, tags)
const RELATIONSHIPS: [(usize, usize, &str, &str, &str); 6] = [
    (0, 1, "Friend", "Met at university. Interested in technology and entrepreneurship.", "friend,classmate,tech"),
    (0, 2, "Colleague", "Works in the same company. Expert in data science.", "work,data science,mentor"),
    (1, 3, "Business Contact", "Met at industry conference. Potential partnership opportunity.", "business,conference,opportunity"),
    (2, 4, "Networking", "Introduced by a mutual friend. Works in the finance sector.", "finance,networking,introduction"),
    (0, 4, "Friend", "Old college buddy. Keep in touch for social events.", "friend,social,alumni"),
    (3, 1, "Mentor", "Provides career advice and industry insights.", "mentor,career,guidance"),
];

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SampleReport {
    pub people: usize,
    pub relationships: usize,
    /// Pairs whose mirror row already existed
    pub skipped: usize,
}

pub async fn insert_samples(store: &Store) -> anyhow::Result<SampleReport> {
    let mut report = SampleReport::default();
    let mut ids = Vec::with_capacity(PEOPLE.len());
    for sample in &PEOPLE {
        let person = store
            .create_person(&sample.to_new(), None)
            .await
            .with_context(|| format!("inserting sample person {}", sample.username))?;
        tracing::debug!(id = person.id, username = %person.username, "sample person added");
        ids.push(person.id);
        report.people += 1;
    }

    for (user, contact, description, note, tags) in RELATIONSHIPS {
        let new = NewConnection {
            user_id: ids[user],
            contact_id: ids[contact],
            relationship_description: Some(description.to_string()),
            note: Some(note.to_string()),
            tags: tags.split(',').map(str::to_string).collect(),
            what_they_are_working_on: None,
        };
        match store.add_connection(&new).await {
            Ok(()) => report.relationships += 1,
            Err(StoreError::Conflict(_)) => {
                tracing::info!(user = new.user_id, contact = new.contact_id, "sample relationship already mirrored, skipping");
                report.skipped += 1;
            }
            Err(e) => return Err(e).context("inserting sample relationship"),
        }
    }
    Ok(report)
}
