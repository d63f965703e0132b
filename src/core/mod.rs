pub mod error;
pub mod types;

pub use error::{Result, StoreError};
pub use types::{
    Ingredient, Recipe, RecipeCreateInput, RecipeFilters, RecipeFiltersPatch, RecipeId,
    RecipeTag, RecipeUpdateInput, ReactionCounts, Step, generate_id, next_timestamp,
};
