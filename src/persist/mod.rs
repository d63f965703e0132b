//! Snapshot persistence: codec, write suppression, hydrate-time merge and
//! the store listener that writes snapshots in the background.

pub mod fingerprint;
pub mod merge;
pub mod snapshot;
pub mod subscription;

pub use fingerprint::{SnapshotFingerprint, states_equivalent};
pub use merge::merge;
pub use snapshot::{PersistedRecipes, RecipesSnapshot, SNAPSHOT_FORMAT_VERSION, SnapshotCodec};
pub use subscription::PersistenceSubscription;
