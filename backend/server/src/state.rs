use std::{future::Future, sync::Arc};

use tokio::time::timeout;

use super::{
    config::Config,
    error::AppError,
    store::{NoteStore, StoreError, connect},
};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn NoteStore>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Arc<Self>, StoreError> {
        let store = connect(&config).await?;

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn NoteStore>) -> Arc<Self> {
        Arc::new(Self { config, store })
    }

    pub fn is_allowed_key(&self, key: &str) -> bool {
        self.config.secret_keys.iter().any(|allowed| allowed == key)
    }

    /// Bounds a store operation by the configured timeout.
    pub async fn run<T, F>(&self, operation: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        timeout(self.config.store_timeout, operation)
            .await
            .map_err(|_| AppError::StoreTimeout)?
            .map_err(AppError::from)
    }
}
