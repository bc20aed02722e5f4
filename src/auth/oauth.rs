//! Links third-party identities to local accounts by email.

use serde::Deserialize;
use tracing::{info, warn};

use super::{dto::Identity, validation::normalize_email};
use crate::{
    accounts::{AccountStore, NewAccount, StoreError, UniqueField},
    error::AuthError,
};

/// Identity providers that can sign users in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Google,
}

impl ProviderKind {
    /// Whether the provider's `email_verified` flag gates sign-in.
    pub fn requires_verified_email(self) -> bool {
        match self {
            ProviderKind::Google => true,
        }
    }
}

/// Subset of the provider's userinfo this service relies on.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderAssertion {
    pub sub: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolves the assertion to an account, creating one on first sign-in.
/// An existing account is reused untouched.
pub async fn link_identity(
    store: &dyn AccountStore,
    provider: ProviderKind,
    assertion: ProviderAssertion,
) -> Result<Identity, AuthError> {
    let email = non_empty(assertion.email).map(|e| normalize_email(&e));
    let Some(email) = email else {
        warn!(?provider, "provider sign-in denied: no email");
        return Err(AuthError::ProviderDenied);
    };
    if provider.requires_verified_email() && !assertion.email_verified {
        warn!(?provider, "provider sign-in denied: email not verified");
        return Err(AuthError::ProviderDenied);
    }

    if let Some(account) = store.find_by_email(&email).await? {
        info!(user_id = %account.id, ?provider, "provider identity matched existing account");
        return Ok(Identity::from(&account));
    }

    // Without a subject the new account would have no way to sign in.
    let Some(google_id) = non_empty(assertion.sub) else {
        warn!(?provider, "provider sign-in denied: no subject");
        return Err(AuthError::ProviderDenied);
    };

    let new_account = NewAccount {
        username: non_empty(assertion.name),
        email: email.clone(),
        password_hash: None,
        google_id: Some(google_id),
        profile_image: non_empty(assertion.picture),
    };

    let mut created = store.create(new_account.clone()).await;
    // Display names are not unique; keep the account and drop the name.
    if matches!(created, Err(StoreError::Conflict(UniqueField::Username))) {
        warn!(?provider, "provider name already taken as username; creating without one");
        created = store
            .create(NewAccount {
                username: None,
                ..new_account
            })
            .await;
    }

    let account = match created {
        Ok(account) => account,
        // A concurrent first sign-in won the race; use its row.
        Err(StoreError::Conflict(UniqueField::Email)) => {
            info!(?provider, "email taken by a concurrent sign-in; reusing that account");
            return store
                .find_by_email(&email)
                .await?
                .map(|account| Identity::from(&account))
                .ok_or(AuthError::StoreFailure(StoreError::Conflict(UniqueField::Email)));
        }
        Err(err) => return Err(AuthError::StoreFailure(err)),
    };

    info!(user_id = %account.id, ?provider, "account created from provider identity");
    Ok(Identity::from(&account))
}
