//! One-shot startup sequence: load, merge, install, then arm persistence.

use crate::config::StoreConfig;
use crate::core::Recipe;
use crate::persist::{PersistenceSubscription, merge};
use crate::storage::RecipeStorage;
use crate::store::RecipeStore;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationPhase {
    Uninitialized,
    Loading,
    Hydrated,
}

/// Drives `Uninitialized -> Loading -> Hydrated`, one way, at most once.
pub struct HydrationController {
    store: Arc<RecipeStore>,
    storage: Arc<dyn RecipeStorage>,
    format_version: u32,
    phase: watch::Sender<HydrationPhase>,
}

impl HydrationController {
    pub fn new(store: Arc<RecipeStore>, storage: Arc<dyn RecipeStorage>, config: &StoreConfig) -> Self {
        Self {
            store,
            storage,
            format_version: config.format_version,
            phase: watch::Sender::new(HydrationPhase::Uninitialized),
        }
    }

    pub fn phase(&self) -> HydrationPhase {
        *self.phase.borrow()
    }

    pub fn store(&self) -> &Arc<RecipeStore> {
        &self.store
    }

    /// Called when a consumer mounts.
    ///
    /// The first call loads the persisted snapshot, merges it with
    /// `incoming` and installs the result. A call made while that load is
    /// still running waits for it; later calls skip straight to arming
    /// persistence. Persistence is only armed once `Hydrated` is reached.
    /// The returned handle detaches on drop (unmount).
    pub async fn mount(&self, incoming: Vec<Recipe>) -> PersistenceSubscription {
        if self.begin_loading() {
            self.hydrate(incoming).await;
        } else {
            debug!(phase = ?self.phase(), "hydration already started, skipping load");
            self.wait_until_hydrated().await;
        }

        PersistenceSubscription::arm(&self.store, Arc::clone(&self.storage), self.format_version)
    }

    fn begin_loading(&self) -> bool {
        self.phase.send_if_modified(|phase| {
            if *phase != HydrationPhase::Uninitialized {
                return false;
            }
            *phase = HydrationPhase::Loading;
            true
        })
    }

    async fn wait_until_hydrated(&self) {
        let mut phase = self.phase.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = phase.wait_for(|phase| *phase == HydrationPhase::Hydrated).await;
    }

    async fn hydrate(&self, incoming: Vec<Recipe>) {
        if self.store.is_hydrated() {
            debug!("store already hydrated, skipping load");
        } else {
            let persisted = self.storage.load().await;

            // The store may have been hydrated by an import while loading.
            if !self.store.is_hydrated() {
                let incoming_count = incoming.len();
                let persisted_count = persisted.as_ref().map_or(0, |p| p.recipes.len());
                let merged = merge(persisted.as_ref(), incoming);
                info!(
                    persisted = persisted_count,
                    incoming = incoming_count,
                    merged = merged.len(),
                    "recipes hydrated"
                );
                if !merged.is_empty() {
                    self.store.set_all(merged);
                }
                self.store.mark_hydrated();
            }
        }

        self.phase.send_replace(HydrationPhase::Hydrated);
    }
}
