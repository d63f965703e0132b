use super::RecipeStore;
use super::state::index_recipes;
use crate::core::{
    Recipe, RecipeCreateInput, RecipeFilters, RecipeFiltersPatch, RecipeTag, RecipeUpdateInput,
    Result, StoreError, next_timestamp,
};
use std::sync::Arc;
use tracing::debug;

impl RecipeStore {
    pub fn get(&self, id: &str) -> Option<Arc<Recipe>> {
        self.state().get(id).cloned()
    }

    /// Replaces the whole collection and its order.
    ///
    /// Used for hydration and bulk import only.
    pub fn set_all(&self, recipes: Vec<Recipe>) {
        let (recipes_by_id, recipe_order) = index_recipes(recipes);
        self.transition(|state| (Some(state.with_collection(recipes_by_id, recipe_order)), ()));
    }

    /// Adds a recipe at the end of the order.
    ///
    /// Fails with `DuplicateIdentifier` when `input.id` is already taken; the
    /// collection is left untouched in that case.
    pub fn create(&self, input: RecipeCreateInput) -> Result<Arc<Recipe>> {
        let recipe = Arc::new(Recipe::from_input(input, next_timestamp(None)));

        self.transition(|state| {
            if state.contains(&recipe.id) {
                return (None, Err(StoreError::DuplicateIdentifier(recipe.id.clone())));
            }

            let mut recipes_by_id = (*state.recipes_by_id).clone();
            recipes_by_id.insert(recipe.id.clone(), Arc::clone(&recipe));
            let mut recipe_order = (*state.recipe_order).clone();
            recipe_order.push(recipe.id.clone());

            debug!(recipe_id = %recipe.id, "recipe created");
            (
                Some(state.with_collection(recipes_by_id, recipe_order)),
                Ok(Arc::clone(&recipe)),
            )
        })
    }

    /// Updates the recipe with `input.id` when present, creates it otherwise.
    ///
    /// An existing record is patched like `update`: fields the payload
    /// leaves unset (and empty lists) keep their stored values.
    pub fn upsert(&self, input: RecipeCreateInput) -> Arc<Recipe> {
        self.transition(|state| {
            let existing = input.id.as_deref().and_then(|id| state.get(id));

            if let Some(existing) = existing {
                let updated = Arc::new(existing.patched(input.into_patch(existing.id.clone())));
                return (Some(state.with_recipe(Arc::clone(&updated))), updated);
            }

            let created = Arc::new(Recipe::from_input(input, next_timestamp(None)));
            let mut recipes_by_id = (*state.recipes_by_id).clone();
            recipes_by_id.insert(created.id.clone(), Arc::clone(&created));
            let mut recipe_order = (*state.recipe_order).clone();
            recipe_order.push(created.id.clone());
            (
                Some(state.with_collection(recipes_by_id, recipe_order)),
                created,
            )
        })
    }

    /// Merges `input` onto the stored recipe. Returns `None` for an unknown id.
    pub fn update(&self, input: RecipeUpdateInput) -> Option<Arc<Recipe>> {
        let id = input.id.clone();
        self.modify(&id, move |recipe| recipe.patched(input))
    }

    /// Deletes a recipe from map and order in one transition.
    ///
    /// An unknown id is a no-op: no transition, no listener call, and both
    /// references keep their identity.
    pub fn remove(&self, id: &str) -> Option<Arc<Recipe>> {
        self.transition(|state| {
            let Some(removed) = state.get(id).cloned() else {
                return (None, None);
            };

            let mut recipes_by_id = (*state.recipes_by_id).clone();
            recipes_by_id.remove(id);
            let recipe_order = state
                .recipe_order
                .iter()
                .filter(|existing| existing.as_str() != id)
                .cloned()
                .collect();

            debug!(recipe_id = %id, "recipe removed");
            (
                Some(state.with_collection(recipes_by_id, recipe_order)),
                Some(removed),
            )
        })
    }

    pub fn like(&self, id: &str) -> Option<Arc<Recipe>> {
        self.modify(id, |recipe| Recipe {
            likes: recipe.likes.saturating_add(1),
            updated_at: next_timestamp(Some(recipe.updated_at)),
            ..recipe.clone()
        })
    }

    pub fn dislike(&self, id: &str) -> Option<Arc<Recipe>> {
        self.modify(id, |recipe| Recipe {
            dislikes: recipe.dislikes.saturating_add(1),
            updated_at: next_timestamp(Some(recipe.updated_at)),
            ..recipe.clone()
        })
    }

    pub fn reset_reactions(&self, id: &str) -> Option<Arc<Recipe>> {
        self.modify(id, |recipe| Recipe {
            likes: 0,
            dislikes: 0,
            updated_at: next_timestamp(Some(recipe.updated_at)),
            ..recipe.clone()
        })
    }

    fn modify(&self, id: &str, f: impl FnOnce(&Recipe) -> Recipe) -> Option<Arc<Recipe>> {
        self.transition(|state| {
            let Some(existing) = state.get(id) else {
                return (None, None);
            };
            let updated = Arc::new(f(existing));
            (Some(state.with_recipe(Arc::clone(&updated))), Some(updated))
        })
    }

    pub fn filters(&self) -> Arc<RecipeFilters> {
        Arc::clone(&self.state().filters)
    }

    /// Merges a partial filter. Supplied tags are de-duplicated, keeping the
    /// first occurrence.
    pub fn set_filters(&self, patch: RecipeFiltersPatch) {
        self.update_filters(|current| {
            let mut next = current.clone();
            if let Some(search_query) = patch.search_query {
                next.search_query = search_query;
            }
            if let Some(tags) = patch.tags {
                let mut unique = Vec::with_capacity(tags.len());
                for tag in tags {
                    if !unique.contains(&tag) {
                        unique.push(tag);
                    }
                }
                next.tags = unique;
            }
            next
        });
    }

    pub fn set_search_query(&self, search_query: impl Into<String>) {
        let search_query = search_query.into();
        self.update_filters(|current| RecipeFilters {
            search_query,
            tags: current.tags.clone(),
        });
    }

    pub fn toggle_tag(&self, tag: RecipeTag) {
        self.update_filters(|current| {
            let mut tags = current.tags.clone();
            if tags.contains(&tag) {
                tags.retain(|existing| *existing != tag);
            } else {
                tags.push(tag);
            }
            RecipeFilters {
                search_query: current.search_query.clone(),
                tags,
            }
        });
    }

    pub fn reset_filters(&self) {
        self.update_filters(|_| RecipeFilters::default());
    }

    fn update_filters(&self, f: impl FnOnce(&RecipeFilters) -> RecipeFilters) {
        self.transition(|state| {
            let next = f(&state.filters);
            if next == *state.filters {
                return (None, ());
            }
            (Some(state.with_filters(next)), ())
        });
    }

    pub fn mark_hydrated(&self) {
        self.transition(|state| {
            if state.is_hydrated {
                return (None, ());
            }
            (Some(state.hydrated()), ())
        });
    }

    /// Bulk import: marks the store hydrated, then replaces the collection,
    /// so an armed persistence subscription writes the imported set.
    pub fn import(&self, recipes: Vec<Recipe>) -> usize {
        self.mark_hydrated();
        let count = recipes.len();
        self.set_all(recipes);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Ingredient, ReactionCounts, Step};

    fn store_with(ids: &[&str]) -> RecipeStore {
        let store = RecipeStore::new();
        for id in ids {
            store
                .create(RecipeCreateInput::new(format!("Recipe {id}")).with_id(*id))
                .unwrap();
        }
        store
    }

    #[test]
    fn test_create_appends_and_defaults_counters() {
        let store = store_with(&["a", "b"]);
        let created = store.create(RecipeCreateInput::new("Fresh")).unwrap();

        let state = store.state();
        assert_eq!(state.recipe_order.last(), Some(&created.id));
        assert_eq!(created.reactions(), ReactionCounts::default());
        assert_eq!(created.created_at, created.updated_at);
        assert!(state.is_consistent());
    }

    #[test]
    fn test_create_duplicate_leaves_state_unchanged() {
        let store = store_with(&["a"]);
        let before = store.state();

        let err = store
            .create(RecipeCreateInput::new("Other").with_id("a"))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateIdentifier(ref id) if id == "a"));

        let after = store.state();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.get("a").unwrap().title, "Recipe a");
    }

    #[test]
    fn test_upsert_updates_existing_and_keeps_counters() {
        let store = store_with(&["a"]);
        store.like("a");

        let updated = store.upsert(RecipeCreateInput::new("Renamed").with_id("a"));
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.likes, 1);
        assert_eq!(store.len(), 1);

        let created = store.upsert(RecipeCreateInput::new("New").with_id("b"));
        assert_eq!(created.id, "b");
        assert_eq!(store.state().recipe_order.as_slice(), ["a", "b"]);
    }

    #[test]
    fn test_upsert_keeps_fields_the_payload_leaves_out() {
        let store = RecipeStore::new();
        let mut full = RecipeCreateInput::new("Soup")
            .with_id("a")
            .description("hearty")
            .tags([RecipeTag::Dinner, RecipeTag::Vegan]);
        full.author = Some("Ana".to_string());
        full.ingredients = vec![Ingredient::new("Lentils")];
        full.steps = vec![Step::new(1, "Simmer")];
        full.notes = Some("Better the next day".to_string());
        full.servings = Some(4);
        full.prep_time_minutes = Some(10);
        full.cook_time_minutes = Some(30);
        full.total_time_minutes = Some(40);
        let original = store.create(full).unwrap();
        store.dislike("a");

        let updated = store.upsert(RecipeCreateInput::new("Soup v2").with_id("a"));

        assert_eq!(updated.title, "Soup v2");
        assert_eq!(updated.description.as_deref(), Some("hearty"));
        assert_eq!(updated.author.as_deref(), Some("Ana"));
        assert_eq!(updated.tags, [RecipeTag::Dinner, RecipeTag::Vegan]);
        assert_eq!(updated.ingredients, original.ingredients);
        assert_eq!(updated.steps, original.steps);
        assert_eq!(updated.notes.as_deref(), Some("Better the next day"));
        assert_eq!(updated.servings, Some(4));
        assert_eq!(updated.prep_time_minutes, Some(10));
        assert_eq!(updated.cook_time_minutes, Some(30));
        assert_eq!(updated.total_time_minutes, Some(40));
        assert_eq!(updated.dislikes, 1);
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at > original.updated_at);
        assert!(store.state().is_consistent());
    }

    #[test]
    fn test_upsert_replaces_fields_the_payload_sets() {
        let store = RecipeStore::new();
        store
            .create(RecipeCreateInput::new("Soup").with_id("a").tags([RecipeTag::Dinner]))
            .unwrap();

        let mut payload = RecipeCreateInput::new("Soup").with_id("a").tags([RecipeTag::Lunch]);
        payload.likes = Some(7);
        let updated = store.upsert(payload);

        assert_eq!(updated.tags, [RecipeTag::Lunch]);
        assert_eq!(updated.likes, 7);
    }

    #[test]
    fn test_update_unknown_returns_none() {
        let store = store_with(&["a"]);
        assert!(store.update(RecipeUpdateInput::new("zzz").title("x")).is_none());
    }

    #[test]
    fn test_like_twice_adds_two() {
        let store = store_with(&["a"]);
        let original = store.get("a").unwrap();

        let once = store.like("a").unwrap();
        assert_eq!(once.likes, 1);
        assert_eq!(once.dislikes, 0);
        assert!(once.updated_at > original.updated_at);

        let twice = store.like("a").unwrap();
        assert_eq!(twice.likes, 2);
        assert!(twice.updated_at > once.updated_at);
    }

    #[test]
    fn test_reset_reactions_zeroes_both() {
        let store = store_with(&["a"]);
        store.like("a");
        store.dislike("a");
        let reset = store.reset_reactions("a").unwrap();
        assert_eq!(reset.reactions(), ReactionCounts::default());
    }

    #[test]
    fn test_remove_unknown_keeps_identity() {
        let store = store_with(&["a", "b"]);
        let before = store.state();

        assert!(store.remove("nope").is_none());

        let after = store.state();
        assert!(Arc::ptr_eq(&before.recipes_by_id, &after.recipes_by_id));
        assert!(Arc::ptr_eq(&before.recipe_order, &after.recipe_order));
    }

    #[test]
    fn test_remove_drops_from_map_and_order() {
        let store = store_with(&["a", "b", "c"]);
        let removed = store.remove("b").unwrap();
        assert_eq!(removed.id, "b");

        let state = store.state();
        assert_eq!(state.recipe_order.as_slice(), ["a", "c"]);
        assert!(!state.contains("b"));
        assert!(state.is_consistent());
    }

    #[test]
    fn test_toggle_tag_and_set_filters() {
        let store = RecipeStore::new();
        assert_eq!(store.filters().tags.len(), RecipeTag::ALL.len());

        store.toggle_tag(RecipeTag::Vegan);
        assert!(!store.filters().tags.contains(&RecipeTag::Vegan));
        store.toggle_tag(RecipeTag::Vegan);
        assert!(store.filters().tags.contains(&RecipeTag::Vegan));

        store.set_filters(RecipeFiltersPatch {
            search_query: Some("soup".into()),
            tags: Some(vec![RecipeTag::Lunch, RecipeTag::Lunch, RecipeTag::Dinner]),
        });
        let filters = store.filters();
        assert_eq!(filters.search_query, "soup");
        assert_eq!(filters.tags, vec![RecipeTag::Lunch, RecipeTag::Dinner]);

        store.reset_filters();
        assert_eq!(*store.filters(), RecipeFilters::default());
    }

    #[test]
    fn test_import_marks_hydrated_and_replaces() {
        let store = store_with(&["old"]);
        let recipes = vec![
            Recipe::from_input(RecipeCreateInput::new("One").with_id("1"), next_timestamp(None)),
            Recipe::from_input(RecipeCreateInput::new("Two").with_id("2"), next_timestamp(None)),
        ];

        assert_eq!(store.import(recipes), 2);
        assert!(store.is_hydrated());
        assert_eq!(store.state().recipe_order.as_slice(), ["1", "2"]);
    }
}
