pub mod engine;
pub mod file;
pub mod gateway;
pub mod memory;

pub use engine::KeyValueBackend;
pub use file::FileBackend;
pub use gateway::{DurableStorage, NullStorage, RecipeStorage};
pub use memory::MemoryBackend;
