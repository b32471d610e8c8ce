//! Engine composition root
//!
//! Constructed with injected gateway implementations; lifetime is owned by
//! whoever composes the application. No globals.

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::EngineConfig;
use crate::coordinator::OptimisticMutationCoordinator;
use crate::gateway::{CacheGateway, ModerationStore, NetworkGateway};
use crate::models::FeedSnapshot;
use crate::store::FeedStore;

pub struct FeedEngine {
    store: Arc<FeedStore>,
    mutations: OptimisticMutationCoordinator,
}

impl FeedEngine {
    /// Build the engine. Loads the durable moderation set before returning,
    /// so the first materialization is already filtered.
    pub async fn new(
        config: EngineConfig,
        network: Arc<dyn NetworkGateway>,
        cache: Arc<dyn CacheGateway>,
        moderation_store: Arc<dyn ModerationStore>,
    ) -> Self {
        let store = Arc::new(
            FeedStore::new(
                config.clone(),
                network.clone(),
                cache,
                moderation_store,
            )
            .await,
        );
        let mutations = OptimisticMutationCoordinator::new(store.clone(), network, config);
        Self { store, mutations }
    }

    /// Feed loads and moderation
    pub fn store(&self) -> &Arc<FeedStore> {
        &self.store
    }

    /// Optimistic user mutations
    pub fn mutations(&self) -> &OptimisticMutationCoordinator {
        &self.mutations
    }

    /// Subscribe to immutable state snapshots
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.store.subscribe()
    }
}
