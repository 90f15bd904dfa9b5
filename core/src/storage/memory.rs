use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{KeyValueStore, StorageError};

/// In-process store used by tests and UI previews.
#[derive(Default)]
pub struct MemoryKeyValueStore {
	entries: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
	async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
		Ok(self.entries.read().await.get(key).cloned())
	}

	async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
		self.entries
			.write()
			.await
			.insert(key.to_owned(), value.to_owned());
		Ok(())
	}

	async fn remove(&self, key: &str) -> Result<(), StorageError> {
		self.entries.write().await.remove(key);
		Ok(())
	}
}
