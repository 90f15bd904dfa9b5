//! Marker records: one surveyed pole, its photographs, and the derived
//! completion flag that gates synchronization.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use specta::Type;

mod store;

pub use store::{MarkerStore, MarkerStoreError, MARKERS_KEY};

/// Declared connection photos for a freshly placed marker. The surveyor
/// raises this once they have walked the pole.
pub const DEFAULT_CONNECTION_COUNT: u32 = 0;

/// A WGS84 position, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
	pub latitude: f64,
	pub longitude: f64,
}

/// One surveyed pole location.
///
/// `is_complete` is derived from the other fields and cached for persistence
/// and display. The field is private and only ever written by the mutators
/// below, so no call site can set it independently; stale flags that predate
/// this rule can still arrive from storage and are re-checked by the sync
/// engine before upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct MarkerRecord {
	pub id: i64,
	pub coordinate: Coordinate,
	center_image: Option<PathBuf>,
	#[serde(default)]
	connection_images: Vec<PathBuf>,
	#[serde(default)]
	connection_count: u32,
	#[serde(default)]
	is_complete: bool,
}

impl MarkerRecord {
	/// A new, empty marker at `coordinate` with a creation-time id.
	#[must_use]
	pub fn new(coordinate: Coordinate) -> Self {
		Self::with_id(Utc::now().timestamp_millis(), coordinate)
	}

	pub(crate) fn with_id(id: i64, coordinate: Coordinate) -> Self {
		Self {
			id,
			coordinate,
			center_image: None,
			connection_images: Vec::new(),
			connection_count: DEFAULT_CONNECTION_COUNT,
			is_complete: compute_is_complete(None, &[], DEFAULT_CONNECTION_COUNT),
		}
	}

	#[must_use]
	pub fn is_complete(&self) -> bool {
		self.is_complete
	}

	#[must_use]
	pub fn center_image(&self) -> Option<&Path> {
		self.center_image.as_deref()
	}

	#[must_use]
	pub fn connection_images(&self) -> &[PathBuf] {
		&self.connection_images
	}

	#[must_use]
	pub fn connection_count(&self) -> u32 {
		self.connection_count
	}

	pub fn set_center_image(&mut self, image: impl Into<PathBuf>) {
		self.center_image = Some(image.into());
		self.refresh_completion();
	}

	pub fn clear_center_image(&mut self) {
		self.center_image = None;
		self.refresh_completion();
	}

	/// Append the photo for the next connection index.
	pub fn push_connection_image(&mut self, image: impl Into<PathBuf>) {
		self.connection_images.push(image.into());
		self.refresh_completion();
	}

	/// Replace the photo at `index` (a retake). Returns false when no such
	/// connection exists.
	pub fn replace_connection_image(&mut self, index: usize, image: impl Into<PathBuf>) -> bool {
		let Some(slot) = self.connection_images.get_mut(index) else {
			return false;
		};
		*slot = image.into();
		self.refresh_completion();
		true
	}

	/// Remove the photo at `index`, shifting later connections down. No empty
	/// placeholder survives a removal.
	pub fn remove_connection_image(&mut self, index: usize) -> Option<PathBuf> {
		if index >= self.connection_images.len() {
			return None;
		}
		let removed = self.connection_images.remove(index);
		self.refresh_completion();
		Some(removed)
	}

	pub fn set_connection_count(&mut self, count: u32) {
		self.connection_count = count;
		self.refresh_completion();
	}

	/// Recompute the cached completion flag. Also drops empty path entries, a
	/// legacy artifact of captures aborted mid-write.
	pub fn refresh_completion(&mut self) {
		self.connection_images
			.retain(|image| !image.as_os_str().is_empty());
		self.is_complete = compute_is_complete(
			self.center_image.as_deref(),
			&self.connection_images,
			self.connection_count,
		);
	}
}

/// The completion invariant: a center photo exists and at least as many
/// connection photos as declared.
#[must_use]
pub fn compute_is_complete(
	center_image: Option<&Path>,
	connection_images: &[PathBuf],
	connection_count: u32,
) -> bool {
	center_image.is_some() && connection_images.len() >= connection_count as usize
}

/// The markers a sync pass will attempt, in stored order. Incomplete markers
/// are skipped silently; they are work in progress, not errors.
pub fn select_sync_candidates(records: &[MarkerRecord]) -> impl Iterator<Item = &MarkerRecord> {
	records.iter().filter(|record| record.is_complete())
}
