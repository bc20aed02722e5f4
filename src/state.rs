use crate::accounts::{AccountStore, PgAccountStore, TimedStore};
use crate::auth::google::{GoogleProvider, IdentityProvider};
use crate::auth::session::SessionKeys;
use crate::config::AppConfig;
use anyhow::Context;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AccountStore>,
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionKeys>,
    pub google: Option<Arc<dyn IdentityProvider>>,
}

impl AppState {
    /// Connects the pool and builds every collaborator. Returns the pool so
    /// the caller can run migrations and close it on shutdown.
    pub async fn init() -> anyhow::Result<(Self, PgPool)> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.store_timeout())
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let store = Arc::new(TimedStore::new(
            Arc::new(PgAccountStore::new(db.clone())),
            config.store_timeout(),
        )) as Arc<dyn AccountStore>;

        let google = config
            .google
            .clone()
            .map(|cfg| Arc::new(GoogleProvider::new(cfg)) as Arc<dyn IdentityProvider>);
        if google.is_none() {
            tracing::warn!("GOOGLE_CLIENT_ID/SECRET/REDIRECT_URL not set; Google sign-in disabled");
        }

        Ok((Self::from_parts(store, config, google), db))
    }

    pub fn from_parts(
        store: Arc<dyn AccountStore>,
        config: Arc<AppConfig>,
        google: Option<Arc<dyn IdentityProvider>>,
    ) -> Self {
        let sessions = Arc::new(SessionKeys::from(&config.session));
        Self {
            store,
            config,
            sessions,
            google,
        }
    }

    #[cfg(test)]
    pub fn fake(store: Arc<crate::accounts::memory::MemoryAccountStore>) -> Self {
        let config = Arc::new(crate::config::test_config());
        let store = Arc::new(TimedStore::new(store, config.store_timeout())) as Arc<dyn AccountStore>;
        Self::from_parts(store, config, None)
    }
}
