//! The batch synchronization engine: one pass over every completed marker.
//!
//! Markers are uploaded strictly sequentially, in stored order. Payloads
//! inflate via base64 and can run to tens of megabytes each, so holding one
//! at a time is the memory budget; the only concurrency is the independent
//! image packaging inside a single marker. A failing marker never stops the
//! pass, only a storage failure does.

use std::sync::Arc;

use serde::Serialize;
use specta::Type;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::{
	events::{sync_event_channel, SyncEvent},
	marker::{select_sync_candidates, MarkerRecord, MarkerStore, MarkerStoreError},
};

mod packager;
mod payload;
mod uploader;

pub use packager::{
	package_image, DeviceInfo, ImageProperties, PackagedImage, PackagingError, DATA_URI_PREFIX,
};
pub use payload::{build_payload, UploadPayload};
pub use uploader::{
	interpret_response, HttpUploader, UploadError, UploadRejection, UploadResponse, Uploader,
	UPLOAD_SUCCESS_TOKEN,
};

/// The one error class that aborts a pass: without a readable marker list no
/// further progress is meaningful.
#[derive(Debug, Error)]
pub enum SyncError {
	#[error("aborting sync, marker storage failed: {0}")]
	Storage(#[from] MarkerStoreError),
}

/// Why one marker did not upload. Rendered via `Display` into the aggregate
/// report; the batch keeps going either way.
#[derive(Debug, Error)]
pub enum MarkerSyncError {
	#[error("missing center pole image")]
	MissingCenterImage,
	#[error("{declared} connection images declared but only {captured} captured")]
	MissingConnectionImages { declared: u32, captured: usize },
	#[error(transparent)]
	Packaging(#[from] PackagingError),
	#[error(transparent)]
	Upload(#[from] UploadError),
	#[error(transparent)]
	Rejected(#[from] UploadRejection),
}

#[derive(Debug, Clone, PartialEq, Serialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct MarkerFailure {
	pub marker_id: i64,
	pub reason: String,
}

/// Aggregate result of one pass.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
	pub attempted: u32,
	pub uploaded: u32,
	pub failures: Vec<MarkerFailure>,
}

impl SyncOutcome {
	/// Nothing to sync counts as success.
	#[must_use]
	pub fn is_success(&self) -> bool {
		self.failures.is_empty()
	}
}

pub struct SyncEngine {
	markers: MarkerStore,
	uploader: Arc<dyn Uploader>,
	device: DeviceInfo,
	events: broadcast::Sender<SyncEvent>,
}

impl SyncEngine {
	#[must_use]
	pub fn new(markers: MarkerStore, uploader: Arc<dyn Uploader>, device: DeviceInfo) -> Self {
		Self {
			markers,
			uploader,
			device,
			events: sync_event_channel(),
		}
	}

	/// Listen for [`SyncEvent`]s from subsequent passes.
	#[must_use]
	pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
		self.events.subscribe()
	}

	/// Upload every completed marker, one at a time, isolating per-marker
	/// failures.
	///
	/// There is no synced flag: a later pass reprocesses every completed
	/// marker again and the server deduplicates. There is also no
	/// cancellation; once started, a pass runs to the end.
	pub async fn sync_all(&self) -> Result<SyncOutcome, SyncError> {
		// One snapshot per pass; edits made while uploading affect the next
		// pass, not this one.
		let snapshot = self.markers.all().await?;
		let candidates: Vec<MarkerRecord> = select_sync_candidates(&snapshot).cloned().collect();

		let total = u32::try_from(candidates.len()).unwrap_or(u32::MAX);
		if total == 0 {
			debug!("nothing to sync");
			self.emit(SyncEvent::Completed { uploaded: 0 });
			return Ok(SyncOutcome::default());
		}

		info!(total, "starting sync pass");
		self.emit(SyncEvent::Started { total });

		let mut outcome = SyncOutcome::default();
		for (index, marker) in candidates.iter().enumerate() {
			match self.process_marker(marker).await {
				Ok(()) => {
					info!(marker_id = marker.id, "marker uploaded");
					outcome.uploaded += 1;
				}
				Err(reason) => {
					warn!(marker_id = marker.id, %reason, "marker failed, continuing");
					outcome.failures.push(MarkerFailure {
						marker_id: marker.id,
						reason: reason.to_string(),
					});
				}
			}
			outcome.attempted += 1;

			self.emit(SyncEvent::Progress {
				current: u32::try_from(index + 1).unwrap_or(u32::MAX),
				total,
			});
		}

		if outcome.is_success() {
			info!(uploaded = outcome.uploaded, "sync pass complete");
			self.emit(SyncEvent::Completed {
				uploaded: outcome.uploaded,
			});
		} else {
			let message = outcome
				.failures
				.iter()
				.map(|failure| format!("marker_{}: {}", failure.marker_id, failure.reason))
				.collect::<Vec<_>>()
				.join("; ");
			error!(
				failed = outcome.failures.len(),
				uploaded = outcome.uploaded,
				"sync pass finished with failures"
			);
			self.emit(SyncEvent::Error { message });
		}

		Ok(outcome)
	}

	fn emit(&self, event: SyncEvent) {
		// send only fails when nobody is subscribed, which is fine.
		let _ = self.events.send(event);
	}

	async fn process_marker(&self, marker: &MarkerRecord) -> Result<(), MarkerSyncError> {
		// The candidate filter already required completion, but the persisted
		// flag can be stale (older app versions wrote it independently), so
		// re-check before spending I/O on packaging.
		if marker.center_image().is_none() {
			return Err(MarkerSyncError::MissingCenterImage);
		}
		let captured = marker.connection_images().len();
		let declared = marker.connection_count();
		if captured < declared as usize {
			return Err(MarkerSyncError::MissingConnectionImages { declared, captured });
		}

		let payload = build_payload(marker, &self.device).await?;
		let response = self.uploader.upload(&payload).await?;
		interpret_response(&response)?;
		Ok(())
	}
}
