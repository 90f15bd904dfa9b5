use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::storage::{KeyValueStore, StorageError};

use super::{Coordinate, MarkerRecord};

/// The single key the whole marker collection is serialized under.
pub const MARKERS_KEY: &str = "markers";

#[derive(Debug, Error)]
pub enum MarkerStoreError {
	#[error("marker storage failed: {0}")]
	Storage(#[from] StorageError),
	#[error("stored marker collection is corrupt: {0}")]
	Corrupt(#[from] serde_json::Error),
	#[error("no marker with id {0}")]
	NotFound(i64),
}

/// CRUD over the locally stored marker collection.
///
/// Every mutation rewrites the entire collection as one JSON array under
/// [`MARKERS_KEY`]; the backing store offers no partial updates. A mutex
/// serializes the read-modify-write cycles so two concurrent mutations cannot
/// drop each other's changes.
pub struct MarkerStore {
	store: Arc<dyn KeyValueStore>,
	write_guard: Mutex<()>,
}

impl MarkerStore {
	#[must_use]
	pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
		Self {
			store,
			write_guard: Mutex::new(()),
		}
	}

	/// All markers, in creation order, exactly as persisted.
	pub async fn all(&self) -> Result<Vec<MarkerRecord>, MarkerStoreError> {
		let Some(raw) = self.store.get(MARKERS_KEY).await? else {
			return Ok(Vec::new());
		};
		Ok(serde_json::from_str(&raw)?)
	}

	/// Linear scan by id; the collection is small enough that nothing better
	/// is warranted.
	pub async fn get(&self, id: i64) -> Result<Option<MarkerRecord>, MarkerStoreError> {
		Ok(self.all().await?.into_iter().find(|record| record.id == id))
	}

	/// Place a new marker at `coordinate` and persist it.
	///
	/// Ids are creation-time milliseconds; two markers placed within the same
	/// millisecond collide, so the candidate id is bumped until free.
	pub async fn create(&self, coordinate: Coordinate) -> Result<MarkerRecord, MarkerStoreError> {
		let _guard = self.write_guard.lock().await;

		let mut records = self.all().await?;
		let mut record = MarkerRecord::new(coordinate);
		while records.iter().any(|existing| existing.id == record.id) {
			record.id += 1;
		}

		debug!(marker_id = record.id, "placing marker");
		records.push(record.clone());
		self.persist(&records).await?;
		Ok(record)
	}

	/// Apply `mutate` to the marker with `id` and persist the collection. The
	/// completion flag is refreshed afterwards, whatever the mutation did.
	pub async fn update(
		&self,
		id: i64,
		mutate: impl FnOnce(&mut MarkerRecord) + Send,
	) -> Result<MarkerRecord, MarkerStoreError> {
		let _guard = self.write_guard.lock().await;

		let mut records = self.all().await?;
		let record = records
			.iter_mut()
			.find(|record| record.id == id)
			.ok_or(MarkerStoreError::NotFound(id))?;

		mutate(record);
		record.refresh_completion();
		let updated = record.clone();

		self.persist(&records).await?;
		Ok(updated)
	}

	pub async fn remove(&self, id: i64) -> Result<(), MarkerStoreError> {
		let _guard = self.write_guard.lock().await;

		let mut records = self.all().await?;
		let before = records.len();
		records.retain(|record| record.id != id);
		if records.len() == before {
			return Err(MarkerStoreError::NotFound(id));
		}

		debug!(marker_id = id, "removing marker");
		self.persist(&records).await
	}

	async fn persist(&self, records: &[MarkerRecord]) -> Result<(), MarkerStoreError> {
		let raw = serde_json::to_string(records)?;
		self.store.set(MARKERS_KEY, &raw).await?;
		Ok(())
	}
}
