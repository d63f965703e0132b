use crate::core::{Recipe, RecipeFilters, RecipeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub type RecipeMap = HashMap<RecipeId, Arc<Recipe>>;

/// Immutable view of the store at one point in time.
///
/// Map, order and filters each sit behind their own `Arc`. A transition
/// replaces only the parts it touches, so readers can compare parts by
/// identity (`Arc::ptr_eq`) to learn whether anything changed.
#[derive(Debug, Clone)]
pub struct RecipesState {
    pub recipes_by_id: Arc<RecipeMap>,
    pub recipe_order: Arc<Vec<RecipeId>>,
    pub filters: Arc<RecipeFilters>,
    pub is_hydrated: bool,
}

impl Default for RecipesState {
    fn default() -> Self {
        Self {
            recipes_by_id: Arc::new(HashMap::new()),
            recipe_order: Arc::new(Vec::new()),
            filters: Arc::new(RecipeFilters::default()),
            is_hydrated: false,
        }
    }
}

impl RecipesState {
    pub fn get(&self, id: &str) -> Option<&Arc<Recipe>> {
        self.recipes_by_id.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.recipes_by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.recipe_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipe_order.is_empty()
    }

    /// Recipes in collection order.
    pub fn ordered(&self) -> impl Iterator<Item = &Arc<Recipe>> + '_ {
        self.recipe_order
            .iter()
            .filter_map(|id| self.recipes_by_id.get(id))
    }

    /// True when the order holds each key of the map exactly once.
    pub fn is_consistent(&self) -> bool {
        if self.recipe_order.len() != self.recipes_by_id.len() {
            return false;
        }
        let mut seen = HashSet::with_capacity(self.recipe_order.len());
        self.recipe_order
            .iter()
            .all(|id| self.recipes_by_id.contains_key(id) && seen.insert(id.as_str()))
    }

    pub(crate) fn with_collection(&self, recipes_by_id: RecipeMap, recipe_order: Vec<RecipeId>) -> Self {
        Self {
            recipes_by_id: Arc::new(recipes_by_id),
            recipe_order: Arc::new(recipe_order),
            filters: Arc::clone(&self.filters),
            is_hydrated: self.is_hydrated,
        }
    }

    /// Replaces one record, keeping the order reference as is.
    pub(crate) fn with_recipe(&self, recipe: Arc<Recipe>) -> Self {
        let mut recipes_by_id = (*self.recipes_by_id).clone();
        recipes_by_id.insert(recipe.id.clone(), recipe);
        Self {
            recipes_by_id: Arc::new(recipes_by_id),
            recipe_order: Arc::clone(&self.recipe_order),
            filters: Arc::clone(&self.filters),
            is_hydrated: self.is_hydrated,
        }
    }

    pub(crate) fn with_filters(&self, filters: RecipeFilters) -> Self {
        Self {
            recipes_by_id: Arc::clone(&self.recipes_by_id),
            recipe_order: Arc::clone(&self.recipe_order),
            filters: Arc::new(filters),
            is_hydrated: self.is_hydrated,
        }
    }

    pub(crate) fn hydrated(&self) -> Self {
        Self {
            is_hydrated: true,
            ..self.clone()
        }
    }
}

/// Builds map and order from a flat list.
///
/// A repeated id keeps its first position and takes the last record, so the
/// result always satisfies the collection invariant.
pub(crate) fn index_recipes(recipes: Vec<Recipe>) -> (RecipeMap, Vec<RecipeId>) {
    let mut recipes_by_id = HashMap::with_capacity(recipes.len());
    let mut recipe_order = Vec::with_capacity(recipes.len());

    for recipe in recipes {
        let id = recipe.id.clone();
        if recipes_by_id.insert(id.clone(), Arc::new(recipe)).is_none() {
            recipe_order.push(id);
        }
    }

    (recipes_by_id, recipe_order)
}
