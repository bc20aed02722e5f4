use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use tracing::error;
use uuid::Uuid;

use super::repo_types::{Account, NewAccount};

/// Unique column a conflicting insert collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Username,
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniqueField::Email => f.write_str("email"),
            UniqueField::Username => f.write_str("username"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} already taken")]
    Conflict(UniqueField),
    #[error("account has no authentication method")]
    MissingAuthMethod,
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence boundary for accounts. Lookups return `Ok(None)` only when
/// the record is absent; any backend failure is an `Err`.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<Option<Account>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError>;
}

/// Wraps a store so no call can outlive `limit`.
pub struct TimedStore {
    inner: Arc<dyn AccountStore>,
    limit: Duration,
}

impl TimedStore {
    pub fn new(inner: Arc<dyn AccountStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>> + Send,
    {
        match tokio::time::timeout(self.limit, fut).await {
            Ok(res) => res,
            Err(_) => {
                error!(op, limit_ms = self.limit.as_millis() as u64, "store call timed out");
                Err(StoreError::Timeout(self.limit))
            }
        }
    }
}

#[async_trait]
impl AccountStore for TimedStore {
    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<Option<Account>, StoreError> {
        self.bounded(
            "find_by_email_or_username",
            self.inner.find_by_email_or_username(email, username),
        )
        .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        self.bounded("find_by_email", self.inner.find_by_email(email))
            .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        self.bounded("find_by_id", self.inner.find_by_id(id)).await
    }

    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        self.bounded("create", self.inner.create(account)).await
    }
}
