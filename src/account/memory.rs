//! In-memory account store for development and tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Account, AccountStore};
use crate::error::{Error, Result};

/// A [`HashMap`]-backed store behind an async `RwLock`.
///
/// Enforces the same email uniqueness a database backend would, so the auth
/// flows behave identically against it.
#[derive(Clone, Default)]
pub struct MemoryAccountStore {
    accounts: Arc<RwLock<HashMap<Uuid, Account>>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn insert(&self, account: &Account) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email == account.email) {
            return Err(Error::conflict("Email is already in use"));
        }
        accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn update(&self, account: &Account) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        match accounts.get_mut(&account.id) {
            Some(existing) => {
                *existing = account.clone();
                existing.updated_at = Utc::now();
                Ok(())
            }
            None => Err(Error::not_found("Account not found")),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn find_by_verification_code(&self, code: &str) -> Result<Option<Account>> {
        let now = Utc::now();
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.verification_code_matches(code, now))
            .cloned())
    }
}
