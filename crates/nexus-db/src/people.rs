use chrono::Utc;
use nexus_core::tags::{cap_recent, default_tags, join_tags, merge_recent, split_tags, TagsInput};
use nexus_core::username::{next_available_username, username_base};
use nexus_core::{NewPerson, Person, PersonPatch, Profile, ValidationError};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::rows::PersonRow;
use crate::{conflict_or, escape_like, password, Result, Store, StoreError};

const INSERT_PERSON: &str = "INSERT INTO people (
        username, first_name, last_name,
        email, phone_number, gender, ethnicity, birthday, location,
        high_school, university, uni_major,
        job_title, current_company, field_of_interest,
        profile_image_url, linkedin_url,
        recent_tags, created_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

async fn insert_person(
    conn: &mut SqliteConnection,
    username: &str,
    first_name: &str,
    last_name: &str,
    profile: &Profile,
    tags: &[String],
) -> Result<i64> {
    let result = sqlx::query(INSERT_PERSON)
        .bind(username)
        .bind(first_name.trim())
        .bind(last_name.trim())
        .bind(&profile.email)
        .bind(&profile.phone_number)
        .bind(&profile.gender)
        .bind(&profile.ethnicity)
        .bind(&profile.birthday)
        .bind(&profile.location)
        .bind(&profile.high_school)
        .bind(&profile.university)
        .bind(&profile.uni_major)
        .bind(&profile.job_title)
        .bind(&profile.current_company)
        .bind(&profile.field_of_interest)
        .bind(&profile.profile_image_url)
        .bind(&profile.linkedin_url)
        .bind(join_tags(tags))
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .map_err(|e| conflict_or(e, || format!("Username '{username}' is already taken")))?;
    Ok(result.last_insert_rowid())
}

impl Store {
    pub async fn list_people(&self) -> Result<Vec<Person>> {
        let rows = sqlx::query_as::<_, PersonRow>(
            "SELECT * FROM people ORDER BY first_name, last_name, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Person::from).collect())
    }

    pub async fn get_person(&self, id: i64) -> Result<Option<Person>> {
        let row = sqlx::query_as::<_, PersonRow>("SELECT * FROM people WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Person::from))
    }

    pub async fn get_person_by_username(&self, username: &str) -> Result<Option<Person>> {
        let row = sqlx::query_as::<_, PersonRow>("SELECT * FROM people WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Person::from))
    }

    /// Case-insensitive substring search over names, location, interests and schools.
    pub async fn search_people(&self, term: &str) -> Result<Vec<Person>> {
        let pattern = format!("%{}%", escape_like(term.trim()));
        let rows = sqlx::query_as::<_, PersonRow>(
            r"SELECT * FROM people
              WHERE first_name LIKE ? ESCAPE '\'
                 OR last_name LIKE ? ESCAPE '\'
                 OR location LIKE ? ESCAPE '\'
                 OR field_of_interest LIKE ? ESCAPE '\'
                 OR university LIKE ? ESCAPE '\'
                 OR high_school LIKE ? ESCAPE '\'
              ORDER BY first_name, last_name, id",
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Person::from).collect())
    }

    /// Insert a person, plus a login under the same username when a password is given.
    pub async fn create_person(&self, new: &NewPerson, password: Option<&str>) -> Result<Person> {
        new.validate()?;
        let username = new
            .username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ValidationError::Missing("username"))?;
        let tags = match &new.recent_tags {
            Some(list) => cap_recent(&TagsInput::List(list.clone()), self.max_recent_tags),
            None => default_tags(),
        };

        let passkey = match password {
            Some(p) => Some(password::hash(p).await?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;
        let id = insert_person(
            &mut tx,
            username,
            &new.first_name,
            &new.last_name,
            &new.profile,
            &tags,
        )
        .await?;
        if let Some(passkey) = passkey {
            crate::logins::insert_login(&mut tx, id, username, &passkey).await?;
        }
        tx.commit().await?;

        tracing::info!(id, username, "person created");
        self.get_person(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Person with ID {id} not found")))
    }

    /// Insert a contact under a generated username such as `janedoe` or `janedoe3`.
    pub async fn create_contact(
        &self,
        first_name: &str,
        last_name: &str,
        profile: &Profile,
    ) -> Result<Person> {
        NewPerson {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            ..NewPerson::default()
        }
        .validate()?;

        let base = username_base(first_name, last_name);
        let mut tx = self.pool.begin().await?;
        let taken: Vec<String> = sqlx::query_scalar(
            r"SELECT username FROM people WHERE username LIKE ? ESCAPE '\'",
        )
        .bind(format!("{}%", escape_like(&base)))
        .fetch_all(&mut *tx)
        .await?;
        let username = next_available_username(&base, taken.iter().map(String::as_str));

        let id = insert_person(
            &mut tx,
            &username,
            first_name,
            last_name,
            profile,
            &default_tags(),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(id, username = %username, "contact created");
        self.get_person(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Contact with ID {id} not found")))
    }

    /// Apply the fields present in `patch`. `Ok(None)` when no such person exists.
    pub async fn update_person(&self, id: i64, patch: &PersonPatch) -> Result<Option<Person>> {
        patch.validate()?;
        if patch.is_empty() {
            return Err(ValidationError::NoChanges.into());
        }

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE people SET ");
        {
            let mut set = qb.separated(", ");
            for (column, value) in [
                ("username", &patch.username),
                ("first_name", &patch.first_name),
                ("last_name", &patch.last_name),
            ] {
                if let Some(v) = value {
                    set.push(format!("{column} = "));
                    set.push_bind_unseparated(v.trim().to_string());
                }
            }
            for (column, value) in patch.profile_changes() {
                set.push(format!("{column} = "));
                set.push_bind_unseparated(value.map(str::to_string));
            }
            if let Some(tags) = &patch.recent_tags {
                let joined = tags
                    .as_ref()
                    .and_then(|t| join_tags(&cap_recent(t, self.max_recent_tags)));
                set.push("recent_tags = ");
                set.push_bind_unseparated(joined);
            }
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);

        let result = qb.build().execute(&self.pool).await.map_err(|e| {
            conflict_or(e, || {
                format!(
                    "Username '{}' is already taken",
                    patch.username.as_deref().unwrap_or_default()
                )
            })
        })?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        tracing::debug!(id, "person updated");
        self.get_person(id).await
    }

    /// `None` when the person does not exist.
    pub async fn recent_tags(&self, id: i64) -> Result<Option<Vec<String>>> {
        let column: Option<Option<String>> =
            sqlx::query_scalar("SELECT recent_tags FROM people WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(column.map(|c| split_tags(c.as_deref())))
    }

    /// Put unseen `tags` at the front of the person's recent list. `false` for an unknown person.
    pub async fn remember_tags(&self, id: i64, tags: &[String]) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let column: Option<Option<String>> =
            sqlx::query_scalar("SELECT recent_tags FROM people WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(column) = column else {
            return Ok(false);
        };
        if tags.is_empty() {
            return Ok(true);
        }

        let merged = merge_recent(tags, &split_tags(column.as_deref()), self.max_recent_tags);
        sqlx::query("UPDATE people SET recent_tags = ? WHERE id = ?")
            .bind(join_tags(&merged))
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    pub(crate) async fn person_exists(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM people WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(found.is_some())
    }
}
