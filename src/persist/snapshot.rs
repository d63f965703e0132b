//! Versioned snapshot of the recipe collection and its byte codec.

use crate::config::SnapshotEncoding;
use crate::core::{Recipe, RecipeId, Result, StoreError};
use crate::store::RecipesState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Snapshot captured from store state, before it is stamped for writing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipesSnapshot {
    pub version: u32,
    pub recipe_order: Vec<RecipeId>,
    pub recipes: Vec<Recipe>,
}

impl RecipesSnapshot {
    /// Captures the full collection in order.
    pub fn capture(state: &RecipesState, version: u32) -> Self {
        Self {
            version,
            recipe_order: state.recipe_order.as_ref().clone(),
            recipes: state.ordered().map(|recipe| recipe.as_ref().clone()).collect(),
        }
    }

    pub fn stamped(self, written_at: DateTime<Utc>) -> PersistedRecipes {
        PersistedRecipes {
            version: self.version,
            recipe_order: self.recipe_order,
            recipes: self.recipes,
            updated_at: written_at,
        }
    }
}

/// What is actually stored under the snapshot key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRecipes {
    pub version: u32,
    #[serde(default)]
    pub recipe_order: Vec<RecipeId>,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    pub updated_at: DateTime<Utc>,
}

impl PersistedRecipes {
    /// An empty order list means the snapshot carries no explicit order.
    pub fn explicit_order(&self) -> Option<&[RecipeId]> {
        if self.recipe_order.is_empty() {
            None
        } else {
            Some(&self.recipe_order)
        }
    }
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct SnapshotCodec {
    encoding: SnapshotEncoding,
    version: u32,
}

impl SnapshotCodec {
    pub fn new(encoding: SnapshotEncoding, version: u32) -> Self {
        Self { encoding, version }
    }

    pub fn encoding(&self) -> SnapshotEncoding {
        self.encoding
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn encode(&self, payload: &PersistedRecipes) -> Result<Vec<u8>> {
        match self.encoding {
            SnapshotEncoding::Json => Ok(serde_json::to_vec(payload)?),
            SnapshotEncoding::MessagePack => rmp_serde::to_vec_named(payload).map_err(|e| {
                StoreError::Serialization(format!("Failed to serialize snapshot: {}", e))
            }),
        }
    }

    /// Decodes a stored payload.
    ///
    /// Only the version is read first; a payload written by another format
    /// version is rejected before its recipes are looked at.
    pub fn decode(&self, bytes: &[u8]) -> Result<PersistedRecipes> {
        let probe: VersionProbe = self.decode_as(bytes)?;
        if probe.version != self.version {
            return Err(StoreError::VersionMismatch {
                expected: self.version,
                found: probe.version,
            });
        }
        self.decode_as(bytes)
    }

    fn decode_as<T: for<'de> Deserialize<'de>>(&self, bytes: &[u8]) -> Result<T> {
        match self.encoding {
            SnapshotEncoding::Json => Ok(serde_json::from_slice(bytes)?),
            SnapshotEncoding::MessagePack => rmp_serde::from_slice(bytes).map_err(|e| {
                StoreError::Serialization(format!("Failed to deserialize snapshot: {}", e))
            }),
        }
    }
}

impl Default for SnapshotCodec {
    fn default() -> Self {
        Self::new(SnapshotEncoding::default(), SNAPSHOT_FORMAT_VERSION)
    }
}
