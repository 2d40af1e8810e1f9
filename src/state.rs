use crate::account::AccountManager;
use crate::auth::{CredentialManager, Hasher};
use crate::config::{AppConfig, HashingConfig};
use crate::db;
use crate::storage::{Storage, StorageClient};
use crate::users::{PgUserStore, UserStore};
use axum::extract::FromRef;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub credentials: CredentialManager,
    pub accounts: AccountManager,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let pool = db::connect(&config).await?;
        db::run_migrations(&pool).await?;

        // S3/MinIO
        let storage = Arc::new(Storage::new(&config.storage).await?) as Arc<dyn StorageClient>;
        let store = Arc::new(PgUserStore::new(pool)) as Arc<dyn UserStore>;

        Self::from_parts(config.hashing, store, storage)
    }

    pub fn from_parts(
        hashing: HashingConfig,
        store: Arc<dyn UserStore>,
        storage: Arc<dyn StorageClient>,
    ) -> anyhow::Result<Self> {
        let hasher = Hasher::new(hashing)?;
        Ok(Self {
            credentials: CredentialManager::new(store.clone(), hasher.clone()),
            accounts: AccountManager::new(store, storage, hasher),
        })
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::storage::fake::FakeStorage;
        use crate::users::memory::MemoryUserStore;

        let hashing = HashingConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        };
        Self::from_parts(
            hashing,
            Arc::new(MemoryUserStore::default()),
            Arc::new(FakeStorage::default()),
        )
        .expect("fake state")
    }
}

impl FromRef<AppState> for CredentialManager {
    fn from_ref(state: &AppState) -> Self {
        state.credentials.clone()
    }
}

impl FromRef<AppState> for AccountManager {
    fn from_ref(state: &AppState) -> Self {
        state.accounts.clone()
    }
}
