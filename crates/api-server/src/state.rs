//! Application state

use std::sync::Arc;

use fleet_core::store::{FileFleetStore, FleetRepository};

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::mail::Mailer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Arc<AppConfig>,
    store: Arc<dyn FleetRepository>,
    tokens: TokenService,
    mailer: Mailer,
}

impl AppState {
    /// Open the file store under the configured data directory
    pub async fn new(config: AppConfig) -> fleet_core::Result<Self> {
        let store = FileFleetStore::new(config.data_dir.join("fleet.json")).await?;
        Ok(Self::with_store(config, Arc::new(store)))
    }

    pub fn with_store(config: AppConfig, store: Arc<dyn FleetRepository>) -> Self {
        let tokens = TokenService::new(&config.jwt_secret);
        let mailer = Mailer::new(config.mail.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config: Arc::new(config),
                store,
                tokens,
                mailer,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &dyn FleetRepository {
        self.inner.store.as_ref()
    }

    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    pub fn mailer(&self) -> &Mailer {
        &self.inner.mailer
    }
}
