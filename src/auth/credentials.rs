//! Registration and password sign-in.

use tracing::{error, info, warn};

use super::{
    dto::{Identity, RegisteredAccount, SignUpForm},
    password::{hash_password, verify_password},
    validation::{is_valid_email, normalize_email, validate_sign_up},
};
use crate::{
    accounts::{AccountStore, NewAccount, UniqueField},
    error::AuthError,
};

pub async fn register(
    store: &dyn AccountStore,
    form: SignUpForm,
) -> Result<RegisteredAccount, AuthError> {
    let input = validate_sign_up(form)?;

    // Fast path for a friendly error; the unique indexes still decide races.
    if let Some(existing) = store
        .find_by_email_or_username(&input.email, &input.username)
        .await?
    {
        warn!(existing_id = %existing.id, "sign-up rejected: account already exists");
        let field = if existing.email == input.email {
            UniqueField::Email
        } else {
            UniqueField::Username
        };
        return Err(AuthError::Conflict(field));
    }

    let hash = hash_password(&input.password).map_err(AuthError::Internal)?;
    let account = store
        .create(NewAccount {
            username: Some(input.username),
            email: input.email,
            password_hash: Some(hash),
            ..Default::default()
        })
        .await?;

    info!(user_id = %account.id, "account registered");
    Ok(RegisteredAccount {
        id: account.id,
        username: account.username.unwrap_or_default(),
        email: account.email,
    })
}

/// Unknown email, wrong password and password-less accounts all produce
/// the same `InvalidCredentials`.
pub async fn authenticate(
    store: &dyn AccountStore,
    email: &str,
    password: &str,
) -> Result<Identity, AuthError> {
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::InvalidInput("Missing credentials".into()));
    }
    if !is_valid_email(&email) {
        return Err(AuthError::InvalidCredentials);
    }

    let Some(account) = store.find_by_email(&email).await? else {
        warn!("sign-in failed: unknown email");
        return Err(AuthError::InvalidCredentials);
    };

    let Some(hash) = account.password_hash.as_deref().filter(|h| !h.is_empty()) else {
        warn!(user_id = %account.id, "sign-in failed: account has no password");
        return Err(AuthError::InvalidCredentials);
    };

    let verified = verify_password(password, hash).map_err(|e| {
        error!(user_id = %account.id, error = %e, "sign-in failed: stored hash rejected");
        AuthError::Internal(e)
    })?;
    if !verified {
        warn!(user_id = %account.id, "sign-in failed: password mismatch");
        return Err(AuthError::InvalidCredentials);
    }

    info!(user_id = %account.id, "credentials verified");
    Ok(Identity::from(&account))
}
