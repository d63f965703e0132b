//! Memoized read views over store state.
//!
//! Each selector keeps a single cache entry keyed by the identity of its
//! inputs. Asking again with unchanged inputs returns the same `Arc`, which
//! consumers use to skip their own recomputation.

use crate::core::{Recipe, RecipeFilters, RecipeId, RecipeTag, ReactionCounts};
use crate::store::{RecipeMap, RecipesState};
use lru::LruCache;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

pub type RecipeList = Arc<Vec<Arc<Recipe>>>;

/// Map and order references the ordered view was computed from.
struct OrderedKey {
    recipes_by_id: Arc<RecipeMap>,
    recipe_order: Arc<Vec<RecipeId>>,
}

impl PartialEq for OrderedKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.recipes_by_id, &other.recipes_by_id)
            && Arc::ptr_eq(&self.recipe_order, &other.recipe_order)
    }
}

impl Eq for OrderedKey {}

impl Hash for OrderedKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.recipes_by_id).hash(state);
        Arc::as_ptr(&self.recipe_order).hash(state);
    }
}

/// Identity of a computed list. Holding the `Arc` keeps the address from
/// being reused while the key is cached.
struct ListIdentity(RecipeList);

impl PartialEq for ListIdentity {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ListIdentity {}

impl Hash for ListIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

#[derive(PartialEq, Eq, Hash)]
struct FilteredKey {
    ordered: ListIdentity,
    query: String,
    tags: String,
}

/// Trimmed, lower-cased search text.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Order-independent signature of a tag selection.
pub fn tags_signature(tags: &[RecipeTag]) -> String {
    let mut sorted: Vec<&'static str> = tags.iter().map(RecipeTag::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.join("|")
}

/// Text predicate: empty query, or a case-insensitive substring of the title
/// or description. `query` must already be normalized.
pub fn matches_query(recipe: &Recipe, query: &str) -> bool {
    query.is_empty()
        || recipe.title.to_lowercase().contains(query)
        || recipe
            .description
            .as_ref()
            .is_some_and(|description| description.to_lowercase().contains(query))
}

/// Tag predicate: no active tags, or at least one tag in common.
pub fn matches_tags(recipe: &Recipe, active: &[RecipeTag]) -> bool {
    active.is_empty() || recipe.tags.iter().any(|tag| active.contains(tag))
}

pub struct RecipeViews {
    ordered: Mutex<LruCache<OrderedKey, RecipeList>>,
    filtered: Mutex<LruCache<FilteredKey, RecipeList>>,
}

impl Default for RecipeViews {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeViews {
    pub fn new() -> Self {
        Self {
            ordered: Mutex::new(LruCache::new(NonZeroUsize::MIN)),
            filtered: Mutex::new(LruCache::new(NonZeroUsize::MIN)),
        }
    }

    /// All recipes in collection order.
    pub fn select_all(&self, state: &RecipesState) -> RecipeList {
        let key = OrderedKey {
            recipes_by_id: Arc::clone(&state.recipes_by_id),
            recipe_order: Arc::clone(&state.recipe_order),
        };

        let mut cache = self.ordered.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = cache.get(&key) {
            return Arc::clone(list);
        }

        let list: RecipeList = Arc::new(state.ordered().cloned().collect());
        cache.put(key, Arc::clone(&list));
        list
    }

    /// Recipes matching the store's current filters, in collection order.
    pub fn select_filtered(&self, state: &RecipesState) -> RecipeList {
        self.select_filtered_with(state, &state.filters)
    }

    /// Recipes matching `filters`, in collection order.
    ///
    /// When every recipe matches, the ordered view itself is returned.
    pub fn select_filtered_with(&self, state: &RecipesState, filters: &RecipeFilters) -> RecipeList {
        let ordered = self.select_all(state);
        let key = FilteredKey {
            ordered: ListIdentity(Arc::clone(&ordered)),
            query: normalize_query(&filters.search_query),
            tags: tags_signature(&filters.tags),
        };

        let mut cache = self.filtered.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = cache.get(&key) {
            return Arc::clone(list);
        }

        let list = if key.query.is_empty() && filters.tags.is_empty() {
            Arc::clone(&ordered)
        } else {
            let matched: Vec<Arc<Recipe>> = ordered
                .iter()
                .filter(|recipe| matches_query(recipe, &key.query) && matches_tags(recipe, &filters.tags))
                .cloned()
                .collect();
            if matched.len() == ordered.len() {
                Arc::clone(&ordered)
            } else {
                Arc::new(matched)
            }
        };

        cache.put(key, Arc::clone(&list));
        list
    }

    pub fn select_by_id(&self, state: &RecipesState, id: &str) -> Option<Arc<Recipe>> {
        state.get(id).cloned()
    }

    /// Reaction counts for a recipe, zeros when it is unknown.
    pub fn select_reaction_counts(&self, state: &RecipesState, id: &str) -> ReactionCounts {
        state.get(id).map(|recipe| recipe.reactions()).unwrap_or_default()
    }
}
