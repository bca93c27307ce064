use chrono::{DateTime, Utc};
use nexus_core::tags::join_tags;
use nexus_core::{Connection, ConnectionPatch, NewConnection, ValidationError};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::rows::ConnectionRow;
use crate::{conflict_or, Result, Store, StoreError};

/// The `user_id` -> `contact_id` row. A row that already exists is a `Conflict`.
async fn insert_relationship(
    conn: &mut SqliteConnection,
    new: &NewConnection,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO relationships (
            user_id, contact_id, relationship_description, notes, tags,
            what_they_are_working_on, last_viewed, created_at
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(new.user_id)
    .bind(new.contact_id)
    .bind(&new.relationship_description)
    .bind(&new.note)
    .bind(join_tags(&new.tags))
    .bind(&new.what_they_are_working_on)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| conflict_or(e, || "Connection already exists".to_string()))?;
    Ok(())
}

impl Store {
    /// Outgoing relationships of `user_id`, ordered by contact name.
    pub async fn list_connections(&self, user_id: i64) -> Result<Vec<Connection>> {
        let rows = sqlx::query_as::<_, ConnectionRow>(
            "SELECT p.*,
                    r.relationship_description, r.notes, r.tags,
                    r.what_they_are_working_on, r.last_viewed
             FROM relationships r
             JOIN people p ON p.id = r.contact_id
             WHERE r.user_id = ?
             ORDER BY p.first_name, p.last_name, p.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Connection::from).collect())
    }

    /// Insert `user -> contact` and make sure `contact -> user` exists with the
    /// same description. Both writes share one transaction.
    pub async fn add_connection(&self, new: &NewConnection) -> Result<()> {
        if new.user_id == new.contact_id {
            return Err(ValidationError::SelfConnection.into());
        }

        let mut tx = self.pool.begin().await?;
        if !Store::person_exists(&mut tx, new.user_id).await? {
            return Err(StoreError::NotFound(format!("User with ID {} not found", new.user_id)));
        }
        if !Store::person_exists(&mut tx, new.contact_id).await? {
            return Err(StoreError::NotFound(format!(
                "Contact with ID {} not found",
                new.contact_id
            )));
        }

        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM relationships WHERE user_id = ? AND contact_id = ?",
        )
        .bind(new.user_id)
        .bind(new.contact_id)
        .fetch_optional(&mut *tx)
        .await?;
        if existing.is_some() {
            return Err(StoreError::Conflict("Connection already exists".to_string()));
        }

        let now = Utc::now();
        insert_relationship(&mut tx, new, now).await?;

        sqlx::query(
            "INSERT INTO relationships (user_id, contact_id, relationship_description, created_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (user_id, contact_id) DO UPDATE
             SET relationship_description = excluded.relationship_description",
        )
        .bind(new.contact_id)
        .bind(new.user_id)
        .bind(&new.relationship_description)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(user_id = new.user_id, contact_id = new.contact_id, "connection added");
        Ok(())
    }

    /// `false` when `user_id -> contact_id` does not exist.
    pub async fn update_connection(
        &self,
        user_id: i64,
        contact_id: i64,
        patch: &ConnectionPatch,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE relationships SET ");
        {
            let mut set = qb.separated(", ");
            set.push("last_viewed = ");
            set.push_bind_unseparated(Utc::now());
            if let Some(note) = &patch.note {
                set.push("notes = ");
                set.push_bind_unseparated(note.clone());
            }
            if let Some(tags) = &patch.tags {
                set.push("tags = ");
                set.push_bind_unseparated(join_tags(tags));
            }
            if let Some(work) = &patch.what_they_are_working_on {
                set.push("what_they_are_working_on = ");
                set.push_bind_unseparated(work.clone());
            }
        }
        qb.push(" WHERE user_id = ");
        qb.push_bind(user_id);
        qb.push(" AND contact_id = ");
        qb.push_bind(contact_id);

        let updated = qb.build().execute(&mut *tx).await?;
        if updated.rows_affected() == 0 {
            return Ok(false);
        }

        if let Some(description) = &patch.relationship_description {
            sqlx::query(
                "UPDATE relationships SET relationship_description = ?
                 WHERE (user_id = ? AND contact_id = ?) OR (user_id = ? AND contact_id = ?)",
            )
            .bind(description)
            .bind(user_id)
            .bind(contact_id)
            .bind(contact_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    pub async fn touch_last_viewed(&self, user_id: i64, contact_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE relationships SET last_viewed = ? WHERE user_id = ? AND contact_id = ?",
        )
        .bind(Utc::now())
        .bind(user_id)
        .bind(contact_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete both directions. Returns the number of rows removed.
    pub async fn remove_connection(&self, user_id: i64, contact_id: i64) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM relationships
             WHERE (user_id = ? AND contact_id = ?) OR (user_id = ? AND contact_id = ?)",
        )
        .bind(user_id)
        .bind(contact_id)
        .bind(contact_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        tracing::info!(user_id, contact_id, removed = result.rows_affected(), "connection removed");
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::NewPerson;

    async fn person(store: &Store, username: &str) -> i64 {
        let new = NewPerson {
            username: Some(username.to_string()),
            first_name: username.to_string(),
            last_name: "Test".to_string(),
            ..NewPerson::default()
        };
        store.create_person(&new, None).await.unwrap().id
    }

    #[tokio::test]
    async fn duplicate_row_insert_is_a_conflict() {
        let store = Store::in_memory().await.unwrap();
        let new = NewConnection {
            user_id: person(&store, "ann").await,
            contact_id: person(&store, "bob").await,
            relationship_description: Some("Friend".into()),
            note: None,
            tags: Vec::new(),
            what_they_are_working_on: None,
        };

        let mut conn = store.pool().acquire().await.unwrap();
        insert_relationship(&mut conn, &new, Utc::now()).await.unwrap();
        let err = insert_relationship(&mut conn, &new, Utc::now()).await.unwrap_err();
        assert!(
            matches!(&err, StoreError::Conflict(m) if m == "Connection already exists"),
            "{err:?}"
        );
    }
}
