use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{conflict_or, password, Result, Store, StoreError};

pub(crate) async fn insert_login(
    conn: &mut SqliteConnection,
    person_id: i64,
    username: &str,
    passkey: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO logins (person_id, username, passkey, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(person_id)
    .bind(username)
    .bind(passkey)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await
    .map_err(|e| conflict_or(e, || format!("Login '{username}' already exists")))?;
    Ok(())
}

async fn upsert_login(
    conn: &mut SqliteConnection,
    person_id: i64,
    username: &str,
    passkey: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO logins (person_id, username, passkey, created_at) VALUES (?, ?, ?, ?)
         ON CONFLICT (person_id) DO UPDATE
         SET username = excluded.username, passkey = excluded.passkey",
    )
    .bind(person_id)
    .bind(username)
    .bind(passkey)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await
    .map_err(|e| conflict_or(e, || format!("Login '{username}' already exists")))?;
    Ok(())
}

impl Store {
    pub async fn add_login(&self, person_id: i64, username: &str, password: &str) -> Result<()> {
        let passkey = password::hash(password).await?;
        let mut conn = self.pool.acquire().await?;
        if !Store::person_exists(&mut conn, person_id).await? {
            return Err(StoreError::NotFound(format!("Person with ID {person_id} not found")));
        }
        insert_login(&mut conn, person_id, username.trim(), &passkey).await?;
        tracing::info!(person_id, "login added");
        Ok(())
    }

    /// Person id for a matching username and password. Records `last_login` on success.
    pub async fn verify_login(&self, username: &str, password: &str) -> Result<Option<i64>> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT person_id, passkey FROM logins WHERE username = ?")
                .bind(username.trim())
                .fetch_optional(&self.pool)
                .await?;
        let Some((person_id, passkey)) = row else {
            tracing::debug!(username, "login for unknown username");
            return Ok(None);
        };
        if !password::verify(password, &passkey).await {
            tracing::debug!(person_id, "password mismatch");
            return Ok(None);
        }
        self.touch_last_login(person_id).await?;
        Ok(Some(person_id))
    }

    /// `false` when the person has no login.
    pub async fn touch_last_login(&self, person_id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE logins SET last_login = ? WHERE person_id = ?")
            .bind(Utc::now())
            .bind(person_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Rename the person to `username` and create or replace their login.
    pub async fn ensure_login(&self, person_id: i64, username: &str, password: &str) -> Result<()> {
        let username = username.trim();
        let passkey = password::hash(password).await?;

        let mut tx = self.pool.begin().await?;
        let renamed = sqlx::query("UPDATE people SET username = ? WHERE id = ?")
            .bind(username)
            .bind(person_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| conflict_or(e, || format!("Username '{username}' is already taken")))?;
        if renamed.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Person with ID {person_id} not found")));
        }
        upsert_login(&mut tx, person_id, username, &passkey).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Give every person a login with `password` under their own username.
    pub async fn set_all_passwords(&self, password: &str) -> Result<u64> {
        let people: Vec<(i64, String)> =
            sqlx::query_as("SELECT id, username FROM people ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        let mut keyed = Vec::with_capacity(people.len());
        for (id, username) in people {
            keyed.push((id, username, password::hash(password).await?));
        }

        let mut tx = self.pool.begin().await?;
        for (id, username, passkey) in &keyed {
            upsert_login(&mut tx, *id, username, passkey).await?;
        }
        tx.commit().await?;

        tracing::info!(count = keyed.len(), "passwords reset");
        Ok(keyed.len() as u64)
    }
}
