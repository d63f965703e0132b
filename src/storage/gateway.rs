//! Durable storage gateway: load the snapshot once, persist it in the
//! background.
//!
//! `load` never fails to its caller and `persist` never blocks it. Every
//! failure on either path ends in a `tracing` event and nothing else.

use super::{FileBackend, KeyValueBackend, MemoryBackend};
use crate::config::StoreConfig;
use crate::core::{Result, StoreError};
use crate::persist::snapshot::{PersistedRecipes, RecipesSnapshot, SnapshotCodec};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[async_trait]
pub trait RecipeStorage: Send + Sync {
    /// Whether a durable backing exists at all.
    fn is_available(&self) -> bool;

    /// Reads the stored snapshot. Missing data, a corrupt payload, a version
    /// mismatch and backend failures all come back as `None`.
    async fn load(&self) -> Option<PersistedRecipes>;

    /// Starts a detached write of `snapshot`.
    ///
    /// The returned handle is for callers that need to wait for the write
    /// (tests, shutdown); dropping it does not cancel the write.
    fn persist(&self, snapshot: RecipesSnapshot) -> Option<JoinHandle<()>>;
}

/// Gateway for hosts without durable storage. Loads nothing, writes nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStorage;

#[async_trait]
impl RecipeStorage for NullStorage {
    fn is_available(&self) -> bool {
        false
    }

    async fn load(&self) -> Option<PersistedRecipes> {
        None
    }

    fn persist(&self, _snapshot: RecipesSnapshot) -> Option<JoinHandle<()>> {
        None
    }
}

type BackendOpener = Box<dyn Fn() -> Result<Arc<dyn KeyValueBackend>> + Send + Sync>;

/// Gateway over a `KeyValueBackend` that is opened on first use.
///
/// The backend is opened at most once; a failed open is logged and the
/// gateway then behaves like `NullStorage` for the rest of its life.
///
/// Writes are numbered when they are started. A write that reaches the
/// backend after a newer one has landed is dropped, so the stored snapshot
/// is always the latest one persisted.
pub struct DurableStorage {
    storage_key: String,
    codec: SnapshotCodec,
    opener: BackendOpener,
    backend: OnceLock<Option<Arc<dyn KeyValueBackend>>>,
    runtime: OnceLock<Handle>,
    sequence: AtomicU64,
    last_written: Arc<Mutex<u64>>,
}

impl DurableStorage {
    pub fn new<F>(config: &StoreConfig, opener: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn KeyValueBackend>> + Send + Sync + 'static,
    {
        Self {
            storage_key: config.storage_key.clone(),
            codec: SnapshotCodec::new(config.encoding, config.format_version),
            opener: Box::new(opener),
            backend: OnceLock::new(),
            runtime: OnceLock::new(),
            sequence: AtomicU64::new(0),
            last_written: Arc::new(Mutex::new(0)),
        }
    }

    /// Gateway over an already constructed backend.
    pub fn with_backend(config: &StoreConfig, backend: Arc<dyn KeyValueBackend>) -> Self {
        Self::new(config, move || Ok(Arc::clone(&backend)))
    }

    pub fn in_memory(config: &StoreConfig) -> Self {
        Self::with_backend(config, Arc::new(MemoryBackend::new()))
    }

    /// File-backed gateway rooted at `config.store_dir()`.
    pub fn file(config: &StoreConfig) -> Self {
        let dir = config.store_dir();
        let extension = config.encoding.file_extension();
        Self::new(config, move || {
            let dir = dir
                .clone()
                .ok_or_else(|| StoreError::Storage("no data directory configured".to_string()))?;
            Ok(Arc::new(FileBackend::open(dir, extension)?) as Arc<dyn KeyValueBackend>)
        })
    }

    /// Picks the gateway for a configuration: file-backed when a data
    /// directory is set, the null gateway otherwise.
    pub fn for_config(config: &StoreConfig) -> Arc<dyn RecipeStorage> {
        if config.data_dir.is_some() {
            Arc::new(Self::file(config))
        } else {
            info!("no data directory configured, recipes stay in memory");
            Arc::new(NullStorage)
        }
    }

    pub fn codec(&self) -> &SnapshotCodec {
        &self.codec
    }

    /// Opens the backend on first call and returns the cached result after.
    pub fn init(&self) -> Option<&Arc<dyn KeyValueBackend>> {
        self.backend
            .get_or_init(|| match (self.opener)() {
                Ok(backend) => {
                    debug!(backend = backend.name(), "storage backend opened");
                    Some(backend)
                }
                Err(err) => {
                    warn!(error = %err, "storage backend unavailable, persistence disabled");
                    None
                }
            })
            .as_ref()
    }

    fn remember_runtime(&self) {
        if let Ok(handle) = Handle::try_current() {
            let _ = self.runtime.get_or_init(|| handle);
        }
    }

    fn spawn_handle(&self) -> Option<Handle> {
        Handle::try_current()
            .ok()
            .or_else(|| self.runtime.get().cloned())
    }
}

#[async_trait]
impl RecipeStorage for DurableStorage {
    fn is_available(&self) -> bool {
        self.init().is_some()
    }

    async fn load(&self) -> Option<PersistedRecipes> {
        self.remember_runtime();
        let backend = self.init()?;

        let bytes = match backend.get(&self.storage_key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(key = %self.storage_key, "no persisted recipes");
                return None;
            }
            Err(err) => {
                warn!(key = %self.storage_key, error = %err, "Failed to load recipes");
                return None;
            }
        };

        match self.codec.decode(&bytes) {
            Ok(payload) => {
                debug!(
                    key = %self.storage_key,
                    recipes = payload.recipes.len(),
                    "persisted recipes loaded"
                );
                Some(payload)
            }
            Err(StoreError::VersionMismatch { expected, found }) => {
                info!(expected, found, "discarding persisted recipes from another format version");
                None
            }
            Err(err) => {
                warn!(key = %self.storage_key, error = %err, "Failed to load recipes");
                None
            }
        }
    }

    fn persist(&self, snapshot: RecipesSnapshot) -> Option<JoinHandle<()>> {
        let backend = Arc::clone(self.init()?);
        let Some(handle) = self.spawn_handle() else {
            warn!("no async runtime available, recipes not persisted");
            return None;
        };

        let codec = self.codec;
        let key = self.storage_key.clone();
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let last_written = Arc::clone(&self.last_written);
        Some(handle.spawn(async move {
            let mut last_written = last_written.lock().await;
            if *last_written > seq {
                debug!(key = %key, seq, "newer snapshot already stored, write dropped");
                return;
            }

            let payload = snapshot.stamped(Utc::now());
            let bytes = match codec.encode(&payload) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(key = %key, error = %err, "Failed to persist recipes");
                    return;
                }
            };
            match backend.set(&key, bytes).await {
                Ok(()) => {
                    *last_written = seq;
                    debug!(key = %key, seq, recipes = payload.recipes.len(), "recipes persisted")
                }
                Err(err) => warn!(
                    key = %key,
                    backend = backend.name(),
                    error = %err,
                    "Failed to persist recipes"
                ),
            }
        }))
    }
}
