//! Integration tests for hydration, merge and background persistence

use async_trait::async_trait;
use chrono::Utc;
use recipebook::{
    DurableStorage, HydrationPhase, KeyValueBackend, MemoryBackend, Recipe, RecipeBook,
    RecipeCreateInput, RecipeStorage, RecipesSnapshot, Result, SnapshotCodec, SnapshotEncoding,
    StoreConfig,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn recipe(id: &str, title: &str) -> Recipe {
    Recipe::from_input(RecipeCreateInput::new(title).with_id(id), Utc::now())
}

/// Memory backend that counts writes.
struct CountingBackend {
    inner: MemoryBackend,
    writes: AtomicUsize,
}

impl CountingBackend {
    fn new() -> Self {
        Self {
            inner: MemoryBackend::new(),
            writes: AtomicUsize::new(0),
        }
    }

    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueBackend for CountingBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value).await
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

async fn write_snapshot(backend: &dyn KeyValueBackend, config: &StoreConfig, recipes: Vec<Recipe>) {
    let recipe_order = recipes.iter().map(|r| r.id.clone()).collect();
    let payload = RecipesSnapshot {
        version: config.format_version,
        recipe_order,
        recipes,
    }
    .stamped(Utc::now());
    let bytes = SnapshotCodec::new(config.encoding, config.format_version)
        .encode(&payload)
        .unwrap();
    backend.set(&config.storage_key, bytes).await.unwrap();
}

#[tokio::test]
async fn test_persisted_records_win_and_order_is_kept() {
    let config = StoreConfig::new();
    let backend = Arc::new(MemoryBackend::new());
    write_snapshot(
        backend.as_ref(),
        &config,
        vec![recipe("B", "b"), recipe("A", "a")],
    )
    .await;

    let storage = Arc::new(DurableStorage::with_backend(&config, backend));
    let book = RecipeBook::with_storage(config, storage);
    let _persistence = book
        .open(vec![recipe("A", "incoming a"), recipe("C", "c")])
        .await;

    let state = book.store().state();
    assert_eq!(state.recipe_order.as_slice(), ["B", "A", "C"]);
    assert_eq!(state.get("A").unwrap().title, "a");
    assert!(state.is_hydrated);
    assert_eq!(book.phase(), HydrationPhase::Hydrated);
}

#[tokio::test]
async fn test_no_writes_before_hydration() {
    let config = StoreConfig::new();
    let backend = Arc::new(CountingBackend::new());
    let storage = Arc::new(DurableStorage::with_backend(&config, backend.clone()));
    let book = RecipeBook::with_storage(config, storage);

    // Mutations before mount must never reach storage.
    book.store().create(RecipeCreateInput::new("early").with_id("e")).unwrap();
    assert_eq!(backend.writes(), 0);

    let persistence = book.open(Vec::new()).await;
    persistence.flush().await;
    let after_mount = backend.writes();
    assert!(after_mount >= 1);

    book.store().like("e").unwrap();
    persistence.flush().await;
    assert_eq!(backend.writes(), after_mount + 1);
}

#[tokio::test]
async fn test_filter_changes_do_not_write() {
    let config = StoreConfig::new();
    let backend = Arc::new(CountingBackend::new());
    let storage = Arc::new(DurableStorage::with_backend(&config, backend.clone()));
    let book = RecipeBook::with_storage(config, storage);

    let persistence = book.open(vec![recipe("a", "Soup")]).await;
    persistence.flush().await;
    let baseline = backend.writes();

    book.store().set_search_query("soup");
    book.store().toggle_tag(recipebook::RecipeTag::Dinner);
    persistence.flush().await;

    assert_eq!(backend.writes(), baseline);
}

#[tokio::test]
async fn test_remount_skips_reload() {
    let config = StoreConfig::new();
    let backend = Arc::new(MemoryBackend::new());
    let storage = Arc::new(DurableStorage::with_backend(&config, backend));
    let book = RecipeBook::with_storage(config, storage);

    let first = book.open(vec![recipe("a", "A")]).await;
    book.store().remove("a").unwrap();
    first.flush().await;
    first.detach();

    let second = book.open(vec![recipe("z", "Z")]).await;
    second.flush().await;

    assert!(book.store().is_empty());
    assert_eq!(book.phase(), HydrationPhase::Hydrated);
}

#[tokio::test]
async fn test_version_mismatch_is_discarded() {
    let config = StoreConfig::new();
    let backend = Arc::new(MemoryBackend::new());
    let old = config.clone().format_version(config.format_version + 1);
    write_snapshot(backend.as_ref(), &old, vec![recipe("old", "Old")]).await;

    let storage = DurableStorage::with_backend(&config, backend);
    assert!(storage.load().await.is_none());
}

#[tokio::test]
async fn test_corrupt_payload_loads_nothing() {
    let config = StoreConfig::new();
    let backend = Arc::new(MemoryBackend::new());
    backend.set(&config.storage_key, b"not a snapshot".to_vec()).await.unwrap();

    let storage = Arc::new(DurableStorage::with_backend(&config, backend));
    let book = RecipeBook::with_storage(config, storage);
    let _persistence = book.open(vec![recipe("a", "A")]).await;

    assert_eq!(book.store().state().recipe_order.as_slice(), ["a"]);
}

async fn reopen_from_disk(encoding: SnapshotEncoding) {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig::new().data_dir(dir.path()).encoding(encoding);

    {
        let book = RecipeBook::new(config.clone());
        let persistence = book.open(Vec::new()).await;
        book.store().create(RecipeCreateInput::new("Shakshuka").with_id("s")).unwrap();
        book.store().like("s").unwrap();
        persistence.flush().await;
    }

    let book = RecipeBook::new(config);
    let _persistence = book.open(Vec::new()).await;
    let restored = book.store().get("s").unwrap();
    assert_eq!(restored.title, "Shakshuka");
    assert_eq!(restored.likes, 1);
}

#[tokio::test]
async fn test_file_storage_survives_reopen_json() {
    reopen_from_disk(SnapshotEncoding::Json).await;
}

#[tokio::test]
async fn test_file_storage_survives_reopen_msgpack() {
    reopen_from_disk(SnapshotEncoding::MessagePack).await;
}

#[tokio::test]
async fn test_without_data_dir_nothing_is_available() {
    let book = RecipeBook::new(StoreConfig::new());
    let persistence = book.open(vec![recipe("a", "A")]).await;

    assert!(!book.storage().is_available());
    assert!(!persistence.is_active());
    assert_eq!(book.store().len(), 1);
}

#[tokio::test]
async fn test_demo_seed_hydrates_book() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/seed-recipes.json");
    let incoming = recipebook::seed::load_seed_file(&path).await.unwrap();

    let book = RecipeBook::new(StoreConfig::new());
    let _persistence = book.open(incoming).await;

    let all = book.all();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, "seed-shakshuka");
    assert_eq!(all[0].ingredients.len(), 4);
    assert_eq!(book.views().select_reaction_counts(&book.store().state(), "seed-shakshuka").likes, 4);
}
