use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::RegisterForm,
        password::{burn_verification, hash_password, verify_password},
    },
    users::{Account, NewAccount, StoreError, UserStore},
};

pub const MIN_PASSWORD_LEN: usize = 6;
/// Width of the `full_name` and `email` columns.
pub const MAX_FIELD_LEN: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing or malformed input; the message is shown on the form.
    #[error("{0}")]
    Validation(&'static str),
    #[error("Email already registered. Please sign in.")]
    DuplicateEmail,
    /// Same message for unknown email and wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error(transparent)]
    Store(StoreError),
    #[error("password hashing failed: {0}")]
    Hash(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AuthError::DuplicateEmail,
            other => AuthError::Store(other),
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_registration(form: &RegisterForm) -> Result<(), AuthError> {
    if form.full_name.trim().is_empty()
        || form.email.trim().is_empty()
        || form.password.is_empty()
        || form.confirm_password.is_empty()
    {
        return Err(AuthError::Validation("All fields are required"));
    }
    if !is_valid_email(&normalize_email(&form.email)) {
        return Err(AuthError::Validation("Invalid email format"));
    }
    if form.full_name.trim().chars().count() > MAX_FIELD_LEN {
        return Err(AuthError::Validation("Full name must be at most 100 characters"));
    }
    if normalize_email(&form.email).chars().count() > MAX_FIELD_LEN {
        return Err(AuthError::Validation("Email must be at most 100 characters"));
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation("Password must be at least 6 characters"));
    }
    if form.password != form.confirm_password {
        return Err(AuthError::Validation("Passwords do not match"));
    }
    if form.agree_terms.is_none() {
        return Err(AuthError::Validation(
            "You must agree to the Terms of Service and Privacy Policy",
        ));
    }
    Ok(())
}

/// Validates the form, hashes the password and creates the account.
pub async fn register_account(store: &dyn UserStore, form: &RegisterForm) -> Result<Uuid, AuthError> {
    validate_registration(form)?;

    let email = normalize_email(&form.email);
    let hash = hash_password(&form.password)?;
    let id = store
        .create_account(NewAccount {
            full_name: form.full_name.trim(),
            email: &email,
            password_hash: &hash,
        })
        .await
        .map_err(|e| {
            if matches!(e, StoreError::DuplicateEmail) {
                warn!(email = %email, "email already registered");
            }
            AuthError::from(e)
        })?;

    info!(user_id = %id, email = %email, "user registered");
    Ok(id)
}

/// Checks credentials and records the sign-in.
pub async fn authenticate(
    store: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<Account, AuthError> {
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::Validation("Please enter both email and password"));
    }

    let Some(account) = store.find_by_email(&email).await? else {
        burn_verification(password);
        warn!(email = %email, "login unknown email");
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_password(password, &account.password)? {
        warn!(email = %email, user_id = %account.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    store.record_login(account.id).await?;
    info!(user_id = %account.id, email = %account.email, "user logged in");
    Ok(account)
}
