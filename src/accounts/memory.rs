use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    repo_types::{Account, NewAccount},
    store::{AccountStore, StoreError, UniqueField},
};

/// In-process store with the same unique constraints as the `accounts`
/// table. The uniqueness check and insert happen under one lock.
#[derive(Default)]
pub struct MemoryAccountStore {
    rows: Mutex<Vec<Account>>,
}

impl MemoryAccountStore {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<Option<Account>, StoreError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|a| a.email == email || a.username.as_deref() == Some(username))
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|a| a.id == id).cloned())
    }

    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        if !account.has_auth_method() {
            return Err(StoreError::MissingAuthMethod);
        }
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|a| a.email == account.email) {
            return Err(StoreError::Conflict(UniqueField::Email));
        }
        if account.username.is_some() && rows.iter().any(|a| a.username == account.username) {
            return Err(StoreError::Conflict(UniqueField::Username));
        }
        let now = OffsetDateTime::now_utc();
        let created = Account {
            id: Uuid::new_v4(),
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            google_id: account.google_id,
            profile_image: account.profile_image,
            created_at: now,
            updated_at: now,
        };
        rows.push(created.clone());
        Ok(created)
    }
}

/// Wraps a memory store and answers the first `hidden` email lookups with
/// `None`, so callers reach the insert and its unique check, as they would
/// when a concurrent request commits between lookup and insert.
pub struct HiddenLookups {
    inner: MemoryAccountStore,
    hidden: AtomicUsize,
}

impl HiddenLookups {
    pub fn new(inner: MemoryAccountStore, hidden: usize) -> Self {
        Self {
            inner,
            hidden: AtomicUsize::new(hidden),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    fn hide(&self) -> bool {
        self.hidden
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl AccountStore for HiddenLookups {
    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<Option<Account>, StoreError> {
        if self.hide() {
            return Ok(None);
        }
        self.inner.find_by_email_or_username(email, username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        if self.hide() {
            return Ok(None);
        }
        self.inner.find_by_email(email).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        self.inner.create(account).await
    }
}

/// Every call fails the way an exhausted pool does.
pub struct FailingStore;

#[async_trait]
impl AccountStore for FailingStore {
    async fn find_by_email_or_username(
        &self,
        _email: &str,
        _username: &str,
    ) -> Result<Option<Account>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<Account>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<Account>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn create(&self, _account: NewAccount) -> Result<Account, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }
}
