//! Write suppression: decides whether a transition changed anything worth
//! persisting.
//!
//! Two states are equivalent when their order sequences match and, position
//! by position, each recipe has the same id, `updated_at`, `likes` and
//! `dislikes`. Content fields are not compared; every content edit bumps
//! `updated_at`, which is what makes this check sufficient.

use crate::core::Recipe;
use crate::store::RecipesState;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeFingerprint {
    pub id: String,
    pub updated_at: DateTime<Utc>,
    pub likes: u32,
    pub dislikes: u32,
}

impl From<&Recipe> for RecipeFingerprint {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id.clone(),
            updated_at: recipe.updated_at,
            likes: recipe.likes,
            dislikes: recipe.dislikes,
        }
    }
}

/// The restricted comparison snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFingerprint {
    pub version: u32,
    pub order: Vec<String>,
    pub recipes: Vec<RecipeFingerprint>,
}

impl SnapshotFingerprint {
    pub fn of(state: &RecipesState, version: u32) -> Self {
        Self {
            version,
            order: state.recipe_order.as_ref().clone(),
            recipes: state.ordered().map(|recipe| recipe.as_ref().into()).collect(),
        }
    }
}

fn same_fingerprint(left: &Recipe, right: &Recipe) -> bool {
    left.id == right.id
        && left.updated_at == right.updated_at
        && left.likes == right.likes
        && left.dislikes == right.dislikes
}

/// Allocation-free equivalent of comparing two `SnapshotFingerprint`s built
/// with the same version.
pub fn states_equivalent(prev: &RecipesState, next: &RecipesState) -> bool {
    if Arc::ptr_eq(&prev.recipes_by_id, &next.recipes_by_id)
        && Arc::ptr_eq(&prev.recipe_order, &next.recipe_order)
    {
        return true;
    }

    if prev.recipe_order != next.recipe_order {
        return false;
    }

    let mut left = prev.ordered();
    let mut right = next.ordered();
    loop {
        match (left.next(), right.next()) {
            (None, None) => return true,
            (Some(l), Some(r)) if Arc::ptr_eq(l, r) || same_fingerprint(l, r) => continue,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RecipeCreateInput, RecipeTag};
    use crate::store::RecipeStore;

    fn store() -> RecipeStore {
        let store = RecipeStore::new();
        store.create(RecipeCreateInput::new("A").with_id("a")).unwrap();
        store.create(RecipeCreateInput::new("B").with_id("b")).unwrap();
        store
    }

    #[test]
    fn test_filter_change_is_equivalent() {
        let store = store();
        let before = store.state();
        store.toggle_tag(RecipeTag::Snack);
        let after = store.state();

        assert!(states_equivalent(&before, &after));
        assert_eq!(
            SnapshotFingerprint::of(&before, 1),
            SnapshotFingerprint::of(&after, 1)
        );
    }

    #[test]
    fn test_reaction_change_is_not_equivalent() {
        let store = store();
        let before = store.state();
        store.dislike("b");
        assert!(!states_equivalent(&before, &store.state()));
    }

    #[test]
    fn test_reorder_is_not_equivalent() {
        let store = store();
        let before = store.state();
        let mut recipes: Vec<_> = before.ordered().map(|r| r.as_ref().clone()).collect();
        recipes.reverse();
        store.set_all(recipes);

        let after = store.state();
        assert!(!states_equivalent(&before, &after));
        assert_ne!(
            SnapshotFingerprint::of(&before, 1),
            SnapshotFingerprint::of(&after, 1)
        );
    }

    #[test]
    fn test_rebuilt_identical_collection_is_equivalent() {
        let store = store();
        let before = store.state();
        let recipes: Vec<_> = before.ordered().map(|r| r.as_ref().clone()).collect();
        store.set_all(recipes);

        assert!(states_equivalent(&before, &store.state()));
    }
}
