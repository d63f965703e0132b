//! Reconciles a persisted snapshot with freshly supplied recipes.

use super::snapshot::PersistedRecipes;
use crate::core::{Recipe, RecipeId};
use std::collections::HashMap;

/// Merges `persisted` with `incoming` into one ordered list.
///
/// - No snapshot: `incoming` is returned as given.
/// - On an id collision the persisted record wins.
/// - With an explicit order, persisted ids come first in that order; ids no
///   longer present are dropped, and ids the snapshot never saw follow in
///   first-seen order.
/// - Without one, the first-seen order of the combined set is used, incoming
///   ids first.
pub fn merge(persisted: Option<&PersistedRecipes>, incoming: Vec<Recipe>) -> Vec<Recipe> {
    let Some(persisted) = persisted else {
        return incoming;
    };

    let mut working = WorkingSet::with_capacity(incoming.len() + persisted.recipes.len());
    for recipe in incoming {
        working.insert(recipe);
    }
    for recipe in &persisted.recipes {
        working.insert(recipe.clone());
    }

    let Some(order) = persisted.explicit_order() else {
        return working.into_remaining();
    };

    let mut merged = Vec::with_capacity(working.len());
    for id in order {
        if let Some(recipe) = working.take(id) {
            merged.push(recipe);
        }
    }
    merged.extend(working.into_remaining());
    merged
}

/// Map that remembers the position an id was first inserted at.
struct WorkingSet {
    records: HashMap<RecipeId, Recipe>,
    insertion_order: Vec<RecipeId>,
}

impl WorkingSet {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            records: HashMap::with_capacity(capacity),
            insertion_order: Vec::with_capacity(capacity),
        }
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn insert(&mut self, recipe: Recipe) {
        let id = recipe.id.clone();
        if self.records.insert(id.clone(), recipe).is_none() {
            self.insertion_order.push(id);
        }
    }

    fn take(&mut self, id: &str) -> Option<Recipe> {
        self.records.remove(id)
    }

    fn into_remaining(mut self) -> Vec<Recipe> {
        self.insertion_order
            .into_iter()
            .filter_map(|id| self.records.remove(&id))
            .collect()
    }
}
