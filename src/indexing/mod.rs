pub mod file_info;
pub mod incremental;
pub mod status;
pub mod walker;

pub use file_info::{FileInfo, Freshness, check_freshness};
pub use incremental::{ColdStartStats, IncrementalIndexer, IndexState, UpdateOutcome};
pub use status::{FileError, IndexStatus, UnresolvedImport};
pub use walker::FileWalker;
