use std::fmt;

use chrono::{DateTime, Utc};

use crate::{Result, Store};

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PersonLine {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// A login without its passkey.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LoginLine {
    pub person_id: i64,
    pub username: String,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RelationshipLine {
    pub user_id: i64,
    pub user_name: String,
    pub contact_id: i64,
    pub contact_name: String,
    pub relationship_description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabaseSummary {
    pub people: Vec<PersonLine>,
    pub logins: Vec<LoginLine>,
    pub relationships: Vec<RelationshipLine>,
}

impl fmt::Display for DatabaseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "People ({}):", self.people.len())?;
        for p in &self.people {
            writeln!(f, "  [{}] {} {} (@{})", p.id, p.first_name, p.last_name, p.username)?;
        }
        writeln!(f, "Logins ({}):", self.logins.len())?;
        for l in &self.logins {
            let last = l
                .last_login
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".to_string());
            writeln!(f, "  person {} as {} (last login: {last})", l.person_id, l.username)?;
        }
        writeln!(f, "Relationships ({}):", self.relationships.len())?;
        for r in &self.relationships {
            writeln!(
                f,
                "  {} -> {}: {}",
                r.user_name,
                r.contact_name,
                r.relationship_description.as_deref().unwrap_or("-")
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub relationships: u64,
    pub logins: u64,
    pub people: u64,
}

impl Store {
    pub async fn summary(&self) -> Result<DatabaseSummary> {
        let people = sqlx::query_as::<_, PersonLine>(
            "SELECT id, username, first_name, last_name FROM people ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        let logins = sqlx::query_as::<_, LoginLine>(
            "SELECT person_id, username, last_login FROM logins ORDER BY person_id",
        )
        .fetch_all(&self.pool)
        .await?;
        let relationships = sqlx::query_as::<_, RelationshipLine>(
            "SELECT r.user_id, u.first_name || ' ' || u.last_name AS user_name,
                    r.contact_id, c.first_name || ' ' || c.last_name AS contact_name,
                    r.relationship_description
             FROM relationships r
             JOIN people u ON u.id = r.user_id
             JOIN people c ON c.id = r.contact_id
             ORDER BY r.user_id, r.contact_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(DatabaseSummary {
            people,
            logins,
            relationships,
        })
    }

    /// Delete everyone with an id above `threshold`, along with their logins
    /// and every relationship touching them.
    pub async fn clean_test_data(&self, threshold: i64) -> Result<CleanReport> {
        let mut tx = self.pool.begin().await?;
        let relationships =
            sqlx::query("DELETE FROM relationships WHERE user_id > ? OR contact_id > ?")
                .bind(threshold)
                .bind(threshold)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        let logins = sqlx::query("DELETE FROM logins WHERE person_id > ?")
            .bind(threshold)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let people = sqlx::query("DELETE FROM people WHERE id > ?")
            .bind(threshold)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        let report = CleanReport {
            relationships,
            logins,
            people,
        };
        tracing::info!(threshold, ?report, "test data removed");
        Ok(report)
    }

    /// Delete every row and restart ids at 1.
    pub async fn wipe(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for statement in [
            "DELETE FROM relationships",
            "DELETE FROM logins",
            "DELETE FROM people",
            "DELETE FROM sqlite_sequence WHERE name IN ('relationships', 'logins', 'people')",
        ] {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        tracing::warn!("database wiped");
        Ok(())
    }
}
