use std::path::PathBuf;
use std::str::FromStr;

use crate::persist::snapshot::SNAPSHOT_FORMAT_VERSION;

pub const DATA_DIR_ENV: &str = "RECIPEBOOK_DATA_DIR";
pub const FORMAT_ENV: &str = "RECIPEBOOK_FORMAT";

/// On-disk encoding of persisted snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotEncoding {
    #[default]
    Json,
    MessagePack,
}

impl SnapshotEncoding {
    pub fn file_extension(&self) -> &'static str {
        match self {
            SnapshotEncoding::Json => "json",
            SnapshotEncoding::MessagePack => "msgpack",
        }
    }
}

impl FromStr for SnapshotEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(SnapshotEncoding::Json),
            "msgpack" | "messagepack" | "rmp" => Ok(SnapshotEncoding::MessagePack),
            other => Err(format!("unknown snapshot encoding '{}'", other)),
        }
    }
}

/// Store persistence configuration
///
/// Names follow the browser layout the store was designed around: one
/// database, one object store inside it, one key holding the snapshot.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database name
    pub db_name: String,

    /// Object store name inside the database
    pub store_name: String,

    /// Key the snapshot is written under
    pub storage_key: String,

    /// Expected snapshot format version; anything else is discarded on load
    pub format_version: u32,

    /// Snapshot encoding
    pub encoding: SnapshotEncoding,

    /// Root directory for file-backed storage. `None` means no durable
    /// backing: the store runs purely in memory.
    pub data_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_name: "recipe-app".to_string(),
            store_name: "recipes".to_string(),
            storage_key: "recipes-state".to_string(),
            format_version: SNAPSHOT_FORMAT_VERSION,
            encoding: SnapshotEncoding::default(),
            data_dir: None,
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `RECIPEBOOK_DATA_DIR` and `RECIPEBOOK_FORMAT`, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.data_dir = Some(PathBuf::from(dir));
            }
        }
        if let Ok(format) = std::env::var(FORMAT_ENV) {
            match format.parse() {
                Ok(encoding) => config.encoding = encoding,
                Err(err) => tracing::warn!(error = %err, "ignoring {}", FORMAT_ENV),
            }
        }
        config
    }

    /// Set the database name
    pub fn db_name(mut self, db_name: &str) -> Self {
        self.db_name = db_name.to_string();
        self
    }

    /// Set the object store name
    pub fn store_name(mut self, store_name: &str) -> Self {
        self.store_name = store_name.to_string();
        self
    }

    /// Set the snapshot key
    pub fn storage_key(mut self, storage_key: &str) -> Self {
        self.storage_key = storage_key.to_string();
        self
    }

    pub fn format_version(mut self, version: u32) -> Self {
        self.format_version = version;
        self
    }

    pub fn encoding(mut self, encoding: SnapshotEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Directory holding this store's keys
    pub fn store_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .as_ref()
            .map(|root| root.join(&self.db_name).join(&self.store_name))
    }
}
