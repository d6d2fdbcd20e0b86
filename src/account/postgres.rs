//! Postgres-backed account store.
//!
//! Schema lives in `migrations/`. Email uniqueness is enforced by a unique
//! index; a violation surfaces as [`crate::Error::Conflict`] via the
//! `From<sqlx::Error>` conversion, which is what makes racing signups safe
//! without application-level locking.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::{Account, AccountStore};
use crate::error::{Error, Result};

const COLUMNS: &str = "id, full_name, email, password_hash, is_verified, \
     verification_code, verification_expires_at, two_factor_enabled, \
     two_factor_secret_enc, last_login, created_at, updated_at";

#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    /// Connect to the database named by `url` and run pending migrations.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(|e| Error::dependency(format!("failed to connect to database: {}", e)))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| Error::dependency(format!("migration failed: {}", e)))?;

        tracing::info!("connected to postgres");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn insert(&self, account: &Account) -> Result<()> {
        sqlx::query(
            "INSERT INTO accounts (id, full_name, email, password_hash, is_verified, \
             verification_code, verification_expires_at, two_factor_enabled, \
             two_factor_secret_enc, last_login, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(account.id)
        .bind(&account.full_name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.is_verified)
        .bind(&account.verification_code)
        .bind(account.verification_expires_at)
        .bind(account.two_factor_enabled)
        .bind(&account.two_factor_secret_enc)
        .bind(account.last_login)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, account: &Account) -> Result<()> {
        let result = sqlx::query(
            "UPDATE accounts SET full_name = $2, email = $3, password_hash = $4, \
             is_verified = $5, verification_code = $6, verification_expires_at = $7, \
             two_factor_enabled = $8, two_factor_secret_enc = $9, last_login = $10, \
             updated_at = $11 \
             WHERE id = $1",
        )
        .bind(account.id)
        .bind(&account.full_name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.is_verified)
        .bind(&account.verification_code)
        .bind(account.verification_expires_at)
        .bind(account.two_factor_enabled)
        .bind(&account.two_factor_secret_enc)
        .bind(account.last_login)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Account not found"));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE email = $1",
            COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_by_verification_code(&self, code: &str) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts \
             WHERE verification_code = $1 AND verification_expires_at > $2",
            COLUMNS
        ))
        .bind(code)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }
}
