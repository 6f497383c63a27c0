//! Content-addressed embedding cache.
//!
//! Per-frame embedding vectors are expensive to compute, so they are cached
//! by content key (a stable hash of pixel content) and reused across runs.
//! The store is an explicit capability injected into whatever needs it,
//! never ambient state.

pub mod disk;
pub mod error;
pub mod memory;
pub mod store;

pub use disk::DiskEmbeddingStore;
pub use error::{CacheError, CacheResult};
pub use memory::MemoryEmbeddingStore;
pub use store::EmbeddingStore;
