//! Seed data: a JSON array of complete recipes, used either as the
//! `incoming` list at hydration or as a bulk import.

use crate::core::{Recipe, Result, StoreError};
use crate::store::RecipeStore;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub async fn load_seed_file<P: AsRef<Path>>(path: P) -> Result<Vec<Recipe>> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        StoreError::Io(format!("Failed to read seed file '{}': {}", path.display(), e))
    })?;
    parse_seed(&bytes)
}

pub fn parse_seed(bytes: &[u8]) -> Result<Vec<Recipe>> {
    serde_json::from_slice(bytes)
        .map_err(|e| StoreError::Serialization(format!("Invalid seed data: {}", e)))
}

/// Bulk-imports seed recipes into a store.
pub struct SeedLoader {
    store: Arc<RecipeStore>,
}

impl SeedLoader {
    pub fn new(store: Arc<RecipeStore>) -> Self {
        Self { store }
    }

    /// Replaces the collection with the recipes in `path`.
    ///
    /// The store is marked hydrated first, so an armed persistence
    /// subscription writes the imported set.
    pub async fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let recipes = load_seed_file(path).await?;
        let count = self.store.import(recipes);
        info!(count, "seed recipes loaded into the store");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"[
        {"id": "s1", "title": "Carbonara", "tags": ["dinner", "quick"], "likes": 12,
         "createdAt": "2024-05-01T10:00:00Z", "updatedAt": "2024-05-01T10:00:00Z"},
        {"id": "s2", "title": "Greek Salad", "tags": ["lunch"],
         "createdAt": "2024-05-01T10:00:00Z", "updatedAt": "2024-05-01T10:00:00Z"}
    ]"#;

    #[test]
    fn test_parse_seed() {
        let recipes = parse_seed(SEED.as_bytes()).unwrap();
        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[0].likes, 12);
    }

    #[test]
    fn test_parse_seed_rejects_non_array() {
        assert!(matches!(
            parse_seed(br#"{"title": "x"}"#),
            Err(StoreError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_loader_imports_and_hydrates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipes.json");
        std::fs::write(&path, SEED).unwrap();

        let store = Arc::new(RecipeStore::new());
        let loaded = SeedLoader::new(store.clone()).load_file(&path).await.unwrap();

        assert_eq!(loaded, 2);
        assert!(store.is_hydrated());
        assert_eq!(store.state().recipe_order.as_slice(), ["s1", "s2"]);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = load_seed_file("/definitely/not/here.json").await.unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
