use crate::error::RecordError;
use crate::phone;
use crate::records::{validate_credential, validate_twiml, Caller, Credential, Twiml};

use sqlx::PgPool;
use std::env;
use tracing::debug;

/// PostgreSQL-backed record store.
///
/// Uniqueness (one phone number per caller, one credential set per user) is
/// enforced by `UNIQUE` columns, so concurrent creates race in the database
/// and the loser gets [`RecordError::UniquenessViolation`]; no locking
/// happens on this side.  `credentials.user_id` refers to the host
/// application's user table and is deliberately not a foreign key.
pub struct PgStore {
    pool: PgPool,
}

/// Table definitions, applied idempotently at connect time.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS callers (
        id SERIAL PRIMARY KEY,
        phone_number VARCHAR(16) NOT NULL UNIQUE,
        blacklisted BOOLEAN NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS credentials (
        id SERIAL PRIMARY KEY,
        name VARCHAR(30) NOT NULL,
        account_sid VARCHAR(34) NOT NULL,
        auth_token VARCHAR(32) NOT NULL,
        user_id INTEGER NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS twimls (
        id SERIAL PRIMARY KEY,
        name VARCHAR(30) NOT NULL,
        twiml VARCHAR(200) NOT NULL,
        public BOOLEAN NOT NULL DEFAULT FALSE,
        url VARCHAR(30) NOT NULL
    )",
];

fn unique_violation(e: sqlx::Error, conflict: &'static str) -> RecordError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RecordError::UniquenessViolation(conflict)
        }
        _ => RecordError::Database(e),
    }
}

impl PgStore {
    /// Connect to the given database and ensure the three tables exist.
    pub async fn connect(url: &str) -> Result<Self, RecordError> {
        let pool = PgPool::connect(url).await?;
        for stmt in SCHEMA {
            sqlx::query(stmt).execute(&pool).await?;
        }
        debug!("connected and ensured schema");
        Ok(Self { pool })
    }

    /// Connect using `DATABASE_URL`, loading `.env` first if present.
    pub async fn from_env() -> Result<Self, RecordError> {
        dotenvy::dotenv().ok();
        let url = env::var("DATABASE_URL")
            .map_err(|_| sqlx::Error::Configuration("DATABASE_URL not set".into()))?;
        Self::connect(&url).await
    }

    // Caller operations

    pub async fn create_caller(
        &self,
        phone_number: &str,
        blacklisted: bool,
    ) -> Result<Caller, RecordError> {
        let phone_number = phone::normalize(phone_number)?;
        let caller = sqlx::query_as::<_, Caller>(
            "INSERT INTO callers (phone_number, blacklisted)
             VALUES ($1, $2)
             RETURNING id, phone_number, blacklisted",
        )
        .bind(&phone_number)
        .bind(blacklisted)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "phone number already registered"))?;
        debug!(id = caller.id, phone = %caller.phone_number, "created caller");
        Ok(caller)
    }

    pub async fn caller(&self, id: i32) -> Result<Caller, RecordError> {
        sqlx::query_as::<_, Caller>(
            "SELECT id, phone_number, blacklisted FROM callers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RecordError::NotFound)
    }

    pub async fn set_blacklisted(&self, id: i32, blacklisted: bool) -> Result<Caller, RecordError> {
        sqlx::query_as::<_, Caller>(
            "UPDATE callers SET blacklisted = $2 WHERE id = $1
             RETURNING id, phone_number, blacklisted",
        )
        .bind(id)
        .bind(blacklisted)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RecordError::NotFound)
    }

    pub async fn delete_caller(&self, id: i32) -> Result<(), RecordError> {
        let res = sqlx::query("DELETE FROM callers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(RecordError::NotFound);
        }
        debug!(id, "deleted caller");
        Ok(())
    }

    // Credential operations

    pub async fn create_credential(
        &self,
        name: &str,
        account_sid: &str,
        auth_token: &str,
        user_id: i32,
    ) -> Result<Credential, RecordError> {
        validate_credential(name, account_sid, auth_token)?;
        let credential = sqlx::query_as::<_, Credential>(
            "INSERT INTO credentials (name, account_sid, auth_token, user_id)
             VALUES ($1, $2, $3, $4)
             RETURNING id, name, account_sid, auth_token, user_id",
        )
        .bind(name)
        .bind(account_sid)
        .bind(auth_token)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "user already has a credential set"))?;
        debug!(id = credential.id, user_id, "created credential set");
        Ok(credential)
    }

    pub async fn credential(&self, id: i32) -> Result<Credential, RecordError> {
        sqlx::query_as::<_, Credential>(
            "SELECT id, name, account_sid, auth_token, user_id
             FROM credentials WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RecordError::NotFound)
    }

    pub async fn credential_for_user(&self, user_id: i32) -> Result<Credential, RecordError> {
        sqlx::query_as::<_, Credential>(
            "SELECT id, name, account_sid, auth_token, user_id
             FROM credentials WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RecordError::NotFound)
    }

    pub async fn delete_credential(&self, id: i32) -> Result<(), RecordError> {
        let res = sqlx::query("DELETE FROM credentials WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(RecordError::NotFound);
        }
        debug!(id, "deleted credential set");
        Ok(())
    }

    // Twiml operations

    pub async fn create_twiml(
        &self,
        name: &str,
        twiml: &str,
        url: &str,
        public: bool,
    ) -> Result<Twiml, RecordError> {
        validate_twiml(name, twiml, url)?;
        let record = sqlx::query_as::<_, Twiml>(
            "INSERT INTO twimls (name, twiml, public, url)
             VALUES ($1, $2, $3, $4)
             RETURNING id, name, twiml, public, url",
        )
        .bind(name)
        .bind(twiml)
        .bind(public)
        .bind(url)
        .fetch_one(&self.pool)
        .await?;
        debug!(id = record.id, url = %record.url, "created twiml document");
        Ok(record)
    }

    /// Lookup by numeric identifier, the `\d+` routing shape.
    pub async fn twiml(&self, id: i32) -> Result<Twiml, RecordError> {
        sqlx::query_as::<_, Twiml>("SELECT id, name, twiml, public, url FROM twimls WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RecordError::NotFound)
    }

    /// Lookup by slug, the `[\w-]+` routing shape.  Duplicate slugs are
    /// permitted; the match with the lowest id wins.
    pub async fn twiml_by_url(&self, url: &str) -> Result<Twiml, RecordError> {
        sqlx::query_as::<_, Twiml>(
            "SELECT id, name, twiml, public, url FROM twimls
             WHERE url = $1 ORDER BY id LIMIT 1",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RecordError::NotFound)
    }

    pub async fn delete_twiml(&self, id: i32) -> Result<(), RecordError> {
        let res = sqlx::query("DELETE FROM twimls WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(RecordError::NotFound);
        }
        debug!(id, "deleted twiml document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Needs a reachable Postgres at DATABASE_URL; run with `cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn test_caller_round_trip_against_live_database() {
        let store = PgStore::from_env().await.unwrap();
        let created = store.create_caller("+15556667777", true).await.unwrap();
        let reloaded = store.caller(created.id).await.unwrap();
        assert_eq!(reloaded, created);
        assert_eq!(reloaded.display_name(), "+15556667777 (blacklisted)");
        store.delete_caller(created.id).await.unwrap();
    }
}
