//! App Context

use std::sync::Arc;

use battant::{
    cart::CartStore,
    changes::{ChangesQueue, Resource},
    storage::{FileStorage, StorageError},
};
use reqwest::Client;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{
    applier::BatchApplier,
    config::AppConfig,
    resources::{HttpResourceService, ResourceService},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to open data directory")]
    Storage(#[source] StorageError),

    #[error("failed to build http client")]
    HttpClient(#[source] reqwest::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub storage: Arc<FileStorage>,
    pub articles: Arc<dyn ResourceService>,
    pub events: Arc<dyn ResourceService>,
}

impl AppContext {
    /// Build application context from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the data directory cannot be created or the
    /// HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppInitError> {
        let storage = FileStorage::open(&config.data_dir).map_err(AppInitError::Storage)?;

        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(AppInitError::HttpClient)?;

        let service = |resource| -> Arc<dyn ResourceService> {
            Arc::new(HttpResourceService::new(
                http.clone(),
                config.api_url.clone(),
                resource,
            ))
        };

        Ok(Self {
            storage: Arc::new(storage),
            articles: service(Resource::Article),
            events: service(Resource::Event),
        })
    }

    /// Service for `resource`.
    pub fn service(&self, resource: Resource) -> Arc<dyn ResourceService> {
        match resource {
            Resource::Article => Arc::clone(&self.articles),
            Resource::Event => Arc::clone(&self.events),
        }
    }

    /// The persisted cart.
    pub fn cart(&self) -> CartStore<Arc<FileStorage>> {
        CartStore::load(Arc::clone(&self.storage))
    }

    /// The persisted pending changes.
    pub fn changes(&self) -> ChangesQueue<Arc<FileStorage>> {
        ChangesQueue::load(Arc::clone(&self.storage))
    }

    /// Applier wired to every resource service.
    pub fn applier(&self) -> BatchApplier {
        let services: FxHashMap<Resource, Arc<dyn ResourceService>> = Resource::ALL
            .into_iter()
            .map(|resource| (resource, self.service(resource)))
            .collect();

        BatchApplier::new(services)
    }
}
