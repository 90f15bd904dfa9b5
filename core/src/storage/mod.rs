//! The on-device key-value store the marker collection lives in.
//!
//! The contract is deliberately tiny: string keys, string values, whole-value
//! writes. The app shells provide the real store; [`FileKeyValueStore`] is the
//! desktop/dev implementation and [`MemoryKeyValueStore`] backs tests.

use async_trait::async_trait;
use fm_utils::FileIOError;
use thiserror::Error;

mod file;
mod memory;

pub use file::FileKeyValueStore;
pub use memory::MemoryKeyValueStore;

#[derive(Debug, Error)]
pub enum StorageError {
	#[error("storage i/o failed: {0}")]
	Io(#[from] FileIOError),
	#[error("storage backend unavailable: {0}")]
	Backend(String),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
	async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
	async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
	async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
