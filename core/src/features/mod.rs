pub mod types;
pub use types::*;

pub mod storage;
pub use storage::{FileStorage, KeyValueStore, MemoryStorage, StorageError, StorageResult};

pub mod store;
pub use store::{FeatureStore, StoreError, StoreResult, ViewState, ViewStatePatch};

#[cfg(test)]
mod tests_store;
