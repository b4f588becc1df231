use serde::Deserialize;

/// Body of `POST /login`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    /// Rendered for parity with the sign-in form; sessions already last until logout.
    pub remember: Option<String>,
}

/// Body of `POST /register`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    /// Present only when the checkbox is ticked.
    pub agree_terms: Option<String>,
}
