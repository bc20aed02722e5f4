use lazy_static::lazy_static;
use regex::Regex;

use super::dto::SignUpForm;
use crate::error::AuthError;

pub const MIN_PASSWORD_LEN: usize = 8;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]{3,20}$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// First unmet composition rule, if any.
pub fn password_rule_violation(password: &str) -> Option<&'static str> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Some("Password must be at least 8 characters.");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Some("Password must contain at least one uppercase letter.");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Some("Password must contain at least one lowercase letter.");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Some("Password must contain at least one number.");
    }
    if password.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Some("Password must contain at least one special character.");
    }
    None
}

/// A sign-up request that passed every input rule. The email is normalized.
#[derive(Debug)]
pub struct ValidSignUp {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Checks run in order: presence, email syntax, password rules, username
/// format. The first failure wins.
pub fn validate_sign_up(form: SignUpForm) -> Result<ValidSignUp, AuthError> {
    let username = form.username.trim().to_string();
    let email = normalize_email(&form.email);
    let password = form.password;

    if username.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AuthError::InvalidInput(
            "All fields (username, email, password) are required.".into(),
        ));
    }
    if !is_valid_email(&email) {
        return Err(AuthError::InvalidInput("Invalid email format.".into()));
    }
    if let Some(rule) = password_rule_violation(&password) {
        return Err(AuthError::InvalidInput(rule.into()));
    }
    if !USERNAME_RE.is_match(&username) {
        return Err(AuthError::InvalidInput(
            "Username must be 3-20 characters of letters, numbers, underscores and dashes.".into(),
        ));
    }
    Ok(ValidSignUp {
        username,
        email,
        password,
    })
}
