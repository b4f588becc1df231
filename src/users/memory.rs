//! In-memory [`UserStore`] for tests and database-less local runs.
//!
//! Accounts are lost on restart.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::users::{
    repo::{StoreError, UserStore},
    repo_types::{Account, NewAccount},
};

#[derive(Clone, Default)]
pub struct MemoryUserStore {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_account(&self, account: NewAccount<'_>) -> Result<Uuid, StoreError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(account.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let id = Uuid::new_v4();
        accounts.insert(
            account.email.to_string(),
            Account {
                id,
                full_name: account.full_name.to_string(),
                email: account.email.to_string(),
                password: account.password_hash.to_string(),
                created_at: OffsetDateTime::now_utc(),
                last_login: None,
            },
        );
        Ok(id)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.read().await.get(email).cloned())
    }

    async fn record_login(&self, id: Uuid) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .values_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound(id))?;
        account.last_login = Some(OffsetDateTime::now_utc());
        Ok(())
    }
}
