use crate::config::StoreConfig;
use crate::core::Recipe;
use crate::hydration::{HydrationController, HydrationPhase};
use crate::persist::PersistenceSubscription;
use crate::seed::SeedLoader;
use crate::selectors::{RecipeList, RecipeViews};
use crate::storage::{DurableStorage, RecipeStorage};
use crate::store::RecipeStore;
use std::sync::Arc;

/// Wires one store, its views, its storage gateway and its hydration
/// controller together.
///
/// Build it once at startup and hand out `store()` / `views()` to consumers.
/// Nothing here is global; tests build as many books as they need.
///
/// # Examples
///
/// ```
/// use recipebook::{RecipeBook, RecipeCreateInput, RecipeTag, StoreConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> recipebook::Result<()> {
/// let book = RecipeBook::new(StoreConfig::new());
/// let _persistence = book.open(Vec::new()).await;
///
/// book.store()
///     .create(RecipeCreateInput::new("Overnight oats").tags([RecipeTag::Breakfast]))?;
/// book.store().set_search_query("oats");
/// assert_eq!(book.filtered().len(), 1);
/// assert_eq!(book.all().len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct RecipeBook {
    config: StoreConfig,
    store: Arc<RecipeStore>,
    views: Arc<RecipeViews>,
    storage: Arc<dyn RecipeStorage>,
    hydration: HydrationController,
}

impl RecipeBook {
    /// Book backed by the gateway `config` calls for: file storage when a
    /// data directory is set, memory only otherwise.
    pub fn new(config: StoreConfig) -> Self {
        let storage = DurableStorage::for_config(&config);
        Self::with_storage(config, storage)
    }

    pub fn with_storage(config: StoreConfig, storage: Arc<dyn RecipeStorage>) -> Self {
        let store = Arc::new(RecipeStore::new());
        let hydration = HydrationController::new(Arc::clone(&store), Arc::clone(&storage), &config);
        Self {
            config,
            store,
            views: Arc::new(RecipeViews::new()),
            storage,
            hydration,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<RecipeStore> {
        &self.store
    }

    pub fn views(&self) -> &Arc<RecipeViews> {
        &self.views
    }

    pub fn storage(&self) -> &Arc<dyn RecipeStorage> {
        &self.storage
    }

    pub fn phase(&self) -> HydrationPhase {
        self.hydration.phase()
    }

    /// Hydrates with `incoming` as seed data and arms persistence.
    pub async fn open(&self, incoming: Vec<Recipe>) -> PersistenceSubscription {
        self.hydration.mount(incoming).await
    }

    pub fn all(&self) -> RecipeList {
        self.views.select_all(&self.store.state())
    }

    pub fn filtered(&self) -> RecipeList {
        self.views.select_filtered(&self.store.state())
    }

    pub fn seed_loader(&self) -> SeedLoader {
        SeedLoader::new(Arc::clone(&self.store))
    }
}
