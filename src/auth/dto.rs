use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::Account;

/// Form body for registration. Missing fields deserialize as empty and are
/// rejected by validation.
#[derive(Debug, Default, Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Form body for credential sign-in.
#[derive(Debug, Default, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Returned after registration. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct RegisteredAccount {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Minimal verified identity handed to the session issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&Account> for Identity {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.display_name().to_string(),
            email: account.email.clone(),
        }
    }
}

/// Public part of the account returned by `/api/auth/me`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAccount {
    pub id: Uuid,
    pub username: Option<String>,
    pub email: String,
    pub profile_image: Option<String>,
    pub google_linked: bool,
}

impl From<Account> for PublicAccount {
    fn from(account: Account) -> Self {
        Self {
            google_linked: account.google_id.is_some(),
            id: account.id,
            username: account.username,
            email: account.email,
            profile_image: account.profile_image,
        }
    }
}

/// Query string Google sends back to the callback.
#[derive(Debug, Deserialize)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn public_account_omits_credentials() {
        let account = Account {
            id: Uuid::new_v4(),
            username: Some("alice".into()),
            email: "alice@x.com".into(),
            password_hash: Some("$argon2id$secret".into()),
            google_id: None,
            profile_image: None,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&PublicAccount::from(account.clone())).unwrap();
        assert!(json.contains("alice@x.com"));
        assert!(json.contains("profileImage"));
        assert!(!json.contains("argon2"));

        let raw = serde_json::to_string(&account).unwrap();
        assert!(!raw.contains("argon2"));
    }
}
