use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Row of the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,                     // argon2 PHC string, never plaintext
    pub created_at: OffsetDateTime,
    pub last_login: Option<OffsetDateTime>,   // NULL until the first sign-in
}

/// Input for [`super::UserStore::create_account`]. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}
