//! Session storage.
//!
//! Sessions map a random token (stored in an HTTP-only cookie) to the identity
//! of the signed-in account. The in-memory store keeps them until logout or
//! process restart.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::users::Account;

/// Session token (UUID stored in the cookie).
pub type SessionToken = String;

/// What a session remembers about the signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub login_time: OffsetDateTime,
}

impl SessionData {
    pub fn for_account(account: &Account) -> Self {
        Self {
            user_id: account.id,
            name: account.full_name.clone(),
            email: account.email.clone(),
            login_time: OffsetDateTime::now_utc(),
        }
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, data: SessionData) -> SessionToken;
    async fn get(&self, token: &str) -> Option<SessionData>;
    async fn destroy(&self, token: &str);
    async fn count(&self) -> usize;
}

#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionToken, SessionData>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, data: SessionData) -> SessionToken {
        let token = Uuid::new_v4().to_string();
        self.sessions.write().await.insert(token.clone(), data);
        token
    }

    async fn get(&self, token: &str) -> Option<SessionData> {
        self.sessions.read().await.get(token).cloned()
    }

    async fn destroy(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }

    async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
