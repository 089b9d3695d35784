pub mod error;
pub mod graph;
pub mod index_data;
pub mod persistence;

pub use error::{StorageError, StorageResult};
pub use graph::{DependencyGraph, ImportEdge, ImportTarget, SpecifierResolver, TransitiveResult};
pub use index_data::{FileRecord, IndexSnapshot, SNAPSHOT_VERSION};
pub use persistence::IndexPersistence;
