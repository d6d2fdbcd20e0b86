use async_trait::async_trait;
use uuid::Uuid;

use super::Account;
use crate::error::Result;

/// Persistence contract for accounts.
///
/// All operations are async and free of application-level locking; the
/// store's unique constraint on `email` is the sole guard against concurrent
/// signups racing each other. Implementations maintain `updated_at`.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persist a new account.
    ///
    /// Fails with [`crate::Error::Conflict`] when the email is already
    /// registered.
    async fn insert(&self, account: &Account) -> Result<()>;

    /// Persist changes to an existing account.
    async fn update(&self, account: &Account) -> Result<()>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>>;

    /// Lookup by email; callers pass the address already lowercased.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Find the account whose stored verification code matches `code` and has
    /// not expired. Returns `None` for a wrong code and for an expired one
    /// alike; the two cases are indistinguishable by design.
    async fn find_by_verification_code(&self, code: &str) -> Result<Option<Account>>;
}
