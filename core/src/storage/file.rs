use std::{io, path::PathBuf};

use async_trait::async_trait;
use fm_utils::{fs::write_atomically, FileIOError};
use tokio::fs;

use super::{KeyValueStore, StorageError};

/// One file per key under a data directory, written atomically so a crash
/// mid-write never corrupts a value.
pub struct FileKeyValueStore {
	data_dir: PathBuf,
}

impl FileKeyValueStore {
	#[must_use]
	pub fn new(data_dir: impl Into<PathBuf>) -> Self {
		Self {
			data_dir: data_dir.into(),
		}
	}

	fn entry_path(&self, key: &str) -> PathBuf {
		// Keys are internal identifiers ("markers"), not user input, but a
		// separator would silently nest directories.
		debug_assert!(!key.contains(['/', '\\']));
		self.data_dir.join(format!("{key}.json"))
	}
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
	async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
		let path = self.entry_path(key);
		match fs::read_to_string(&path).await {
			Ok(value) => Ok(Some(value)),
			Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(FileIOError::from((path, e)).into()),
		}
	}

	async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
		fs::create_dir_all(&self.data_dir)
			.await
			.map_err(|e| FileIOError::from((&self.data_dir, e)))?;

		write_atomically(self.entry_path(key), value).await?;
		Ok(())
	}

	async fn remove(&self, key: &str) -> Result<(), StorageError> {
		let path = self.entry_path(key);
		match fs::remove_file(&path).await {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(FileIOError::from((path, e)).into()),
		}
	}
}
