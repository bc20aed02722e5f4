use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Account record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub username: Option<String>, // OAuth-created accounts may have none
    pub email: String,            // stored lower-cased
    #[serde(skip_serializing)]
    pub password_hash: Option<String>, // Argon2 PHC string, absent for OAuth-only accounts
    pub google_id: Option<String>,
    pub profile_image: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Account {
    /// Name carried in the session: the username, or the email when the
    /// account was created without one.
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.email)
    }
}

/// Fields supplied when creating an account. `id` and timestamps are
/// assigned by the store.
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub username: Option<String>,
    pub email: String,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub profile_image: Option<String>,
}

impl NewAccount {
    /// An account needs a password hash or a linked Google identity.
    pub fn has_auth_method(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.password_hash) || present(&self.google_id)
    }
}
