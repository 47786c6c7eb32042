//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::Store;
use crate::services::{Ingestor, MetricsAggregator};
use crate::shopify::{AdminClient, Paginator};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    store: Arc<dyn Store>,
    shopify: AdminClient,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, store: Arc<dyn Store>, shopify: AdminClient) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                shopify,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn shopify(&self) -> &AdminClient {
        &self.inner.shopify
    }

    #[must_use]
    pub fn paginator(&self) -> Paginator {
        Paginator::new(&self.inner.shopify, &self.inner.config.sync)
    }

    #[must_use]
    pub fn ingestor(&self) -> Ingestor {
        Ingestor::new(Arc::clone(&self.inner.store), self.paginator())
    }

    #[must_use]
    pub fn metrics(&self) -> MetricsAggregator {
        MetricsAggregator::new(self.paginator())
    }
}
