//! Durable account records and the store they live in.

#[cfg(test)]
pub(crate) mod memory;
mod repo;
mod repo_types;
mod store;

pub use repo::PgAccountStore;
pub use repo_types::{Account, NewAccount};
pub use store::{AccountStore, StoreError, TimedStore, UniqueField};
