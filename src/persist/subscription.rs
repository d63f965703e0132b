use super::fingerprint::states_equivalent;
use super::snapshot::RecipesSnapshot;
use crate::storage::RecipeStorage;
use crate::store::{RecipeStore, Subscription};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::trace;

type PendingWrites = Arc<Mutex<Vec<JoinHandle<()>>>>;

/// Store listener that writes a full snapshot after every relevant change.
///
/// Writes are skipped while the store is not hydrated and when a transition
/// leaves the restricted fingerprint unchanged. Dropping the handle detaches
/// the listener; writes already started keep running.
pub struct PersistenceSubscription {
    subscription: Option<Subscription>,
    pending: PendingWrites,
}

impl PersistenceSubscription {
    /// Arms persistence for `store`. When the store is already hydrated its
    /// current state is written right away.
    pub fn arm(store: &RecipeStore, storage: Arc<dyn RecipeStorage>, version: u32) -> Self {
        let pending: PendingWrites = Arc::new(Mutex::new(Vec::new()));

        if !storage.is_available() {
            return Self {
                subscription: None,
                pending,
            };
        }

        let state = store.state();
        if state.is_hydrated {
            track(&pending, storage.persist(RecipesSnapshot::capture(&state, version)));
        }

        let writes = Arc::clone(&pending);
        let subscription = store.subscribe(move |next, prev| {
            if !next.is_hydrated {
                return;
            }
            if states_equivalent(prev, next) {
                trace!("snapshot unchanged, write skipped");
                return;
            }
            track(&writes, storage.persist(RecipesSnapshot::capture(next, version)));
        });

        Self {
            subscription: Some(subscription),
            pending,
        }
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    /// Waits for every write started so far.
    pub async fn flush(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            pending.drain(..).collect()
        };
        for handle in handles {
            let _ = handle.await;
        }
    }

    /// Detaches from the store without waiting for outstanding writes.
    pub fn detach(mut self) {
        self.subscription.take();
    }
}

fn track(pending: &PendingWrites, handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else {
        return;
    };
    let mut pending = pending.lock().unwrap_or_else(PoisonError::into_inner);
    pending.retain(|existing| !existing.is_finished());
    pending.push(handle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::core::{RecipeCreateInput, RecipeTag};
    use crate::storage::{DurableStorage, KeyValueBackend, MemoryBackend, NullStorage};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts writes on top of a memory backend.
    #[derive(Default)]
    struct CountingBackend {
        inner: MemoryBackend,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl KeyValueBackend for CountingBackend {
        async fn get(&self, key: &str) -> crate::core::Result<Option<Vec<u8>>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: Vec<u8>) -> crate::core::Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value).await
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn counting_storage() -> (Arc<CountingBackend>, Arc<dyn RecipeStorage>) {
        let backend = Arc::new(CountingBackend::default());
        let storage = DurableStorage::with_backend(&StoreConfig::new(), backend.clone());
        (backend, Arc::new(storage))
    }

    #[tokio::test]
    async fn test_no_writes_before_hydration() {
        let (backend, storage) = counting_storage();
        let store = RecipeStore::new();
        let persistence = PersistenceSubscription::arm(&store, storage, 1);

        store.create(RecipeCreateInput::new("Early")).unwrap();
        persistence.flush().await;
        assert_eq!(backend.writes.load(Ordering::SeqCst), 0);

        store.mark_hydrated();
        persistence.flush().await;
        assert_eq!(backend.writes.load(Ordering::SeqCst), 0);

        store.create(RecipeCreateInput::new("Late")).unwrap();
        persistence.flush().await;
        assert_eq!(backend.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hydrated_store_is_written_on_arm() {
        let (backend, storage) = counting_storage();
        let store = RecipeStore::new();
        store.mark_hydrated();

        let persistence = PersistenceSubscription::arm(&store, storage, 1);
        persistence.flush().await;
        assert_eq!(backend.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_filter_changes_are_suppressed() {
        let (backend, storage) = counting_storage();
        let store = RecipeStore::new();
        store.mark_hydrated();
        let persistence = PersistenceSubscription::arm(&store, storage, 1);
        persistence.flush().await;

        store.toggle_tag(RecipeTag::Dessert);
        store.set_search_query("cake");
        persistence.flush().await;
        assert_eq!(backend.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_detach_stops_writes() {
        let (backend, storage) = counting_storage();
        let store = RecipeStore::new();
        store.mark_hydrated();
        let persistence = PersistenceSubscription::arm(&store, storage, 1);
        persistence.flush().await;
        persistence.detach();

        store.create(RecipeCreateInput::new("After")).unwrap();
        tokio::task::yield_now().await;
        assert_eq!(backend.writes.load(Ordering::SeqCst), 1);
        assert_eq!(store.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_storage_registers_nothing() {
        let store = RecipeStore::new();
        let persistence = PersistenceSubscription::arm(&store, Arc::new(NullStorage), 1);
        assert!(!persistence.is_active());
        assert_eq!(store.listener_count(), 0);
    }
}
