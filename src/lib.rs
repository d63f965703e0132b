// ============================================================================
// RecipeBook Library
// ============================================================================

pub mod config;
pub mod core;
pub mod facade;
pub mod hydration;
pub mod persist;
pub mod seed;
pub mod selectors;
pub mod storage;
pub mod store;
pub mod validation;

// Re-export main types for convenience
pub use config::{SnapshotEncoding, StoreConfig};
pub use core::{
    Ingredient, ReactionCounts, Recipe, RecipeCreateInput, RecipeFilters, RecipeFiltersPatch,
    RecipeId, RecipeTag, RecipeUpdateInput, Result, Step, StoreError,
};
pub use facade::RecipeBook;
pub use hydration::{HydrationController, HydrationPhase};
pub use persist::{
    PersistedRecipes, PersistenceSubscription, RecipesSnapshot, SNAPSHOT_FORMAT_VERSION,
    SnapshotCodec, merge,
};
pub use selectors::{RecipeList, RecipeViews};
pub use storage::{DurableStorage, FileBackend, KeyValueBackend, MemoryBackend, NullStorage, RecipeStorage};
pub use store::{RecipeStore, RecipesState, Subscription};
pub use validation::{RecipeForm, ValidationErrors};
