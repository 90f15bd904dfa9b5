//! End-to-end tests for the batch sync pass: in-memory storage, on-disk image
//! fixtures, and a scripted uploader standing in for the remote service.

use std::{collections::VecDeque, path::Path, sync::Arc};

use async_trait::async_trait;
use fm_core::{
	marker::{MarkerStore, MARKERS_KEY},
	storage::{KeyValueStore, MemoryKeyValueStore, StorageError},
	sync::{
		DeviceInfo, SyncError, UploadError, UploadPayload, UploadResponse, Uploader,
		UPLOAD_SUCCESS_TOKEN,
	},
	Coordinate, MarkerRecord, SyncEngine, SyncEvent,
};
use tokio::sync::{broadcast, Mutex};
use tracing_test::traced_test;

fn coordinate() -> Coordinate {
	Coordinate {
		latitude: 52.379,
		longitude: 4.9,
	}
}

fn confirmed() -> Result<UploadResponse, UploadError> {
	Ok(UploadResponse {
		status: 200,
		body: format!("<html>upload {UPLOAD_SUCCESS_TOKEN}</html>"),
	})
}

/// Replays scripted responses in order and records every payload it saw.
/// Once the script runs out it keeps confirming.
#[derive(Default)]
struct ScriptedUploader {
	script: Mutex<VecDeque<Result<UploadResponse, UploadError>>>,
	seen: Mutex<Vec<String>>,
}

impl ScriptedUploader {
	fn scripted(
		script: impl IntoIterator<Item = Result<UploadResponse, UploadError>>,
	) -> Arc<Self> {
		Arc::new(Self {
			script: Mutex::new(script.into_iter().collect()),
			seen: Mutex::default(),
		})
	}

	async fn seen(&self) -> Vec<String> {
		self.seen.lock().await.clone()
	}
}

#[async_trait]
impl Uploader for ScriptedUploader {
	async fn upload(&self, payload: &UploadPayload) -> Result<UploadResponse, UploadError> {
		self.seen.lock().await.push(payload.marker_id.clone());
		self.script
			.lock()
			.await
			.pop_front()
			.unwrap_or_else(confirmed)
	}
}

/// A storage backend that lost its disk.
struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
	async fn get(&self, _: &str) -> Result<Option<String>, StorageError> {
		Err(StorageError::Backend("device storage unavailable".into()))
	}
	async fn set(&self, _: &str, _: &str) -> Result<(), StorageError> {
		Err(StorageError::Backend("device storage unavailable".into()))
	}
	async fn remove(&self, _: &str) -> Result<(), StorageError> {
		Err(StorageError::Backend("device storage unavailable".into()))
	}
}

fn drain(rx: &mut broadcast::Receiver<SyncEvent>) -> Vec<SyncEvent> {
	let mut events = Vec::new();
	while let Ok(event) = rx.try_recv() {
		events.push(event);
	}
	events
}

async fn write_image(dir: &Path, name: &str) -> std::path::PathBuf {
	let path = dir.join(name);
	tokio::fs::write(&path, name.as_bytes())
		.await
		.expect("write image");
	path
}

/// A marker with a center photo and `connections` matching connection photos.
async fn place_complete_marker(
	markers: &MarkerStore,
	dir: &Path,
	tag: &str,
	connections: u32,
) -> MarkerRecord {
	let placed = markers.create(coordinate()).await.expect("create");
	let center = write_image(dir, &format!("{tag}_center.jpg")).await;

	let mut images = Vec::new();
	for index in 0..connections {
		images.push(write_image(dir, &format!("{tag}_conn{index}.jpg")).await);
	}

	markers
		.update(placed.id, move |record| {
			record.set_center_image(center);
			record.set_connection_count(connections);
			for image in images {
				record.push_connection_image(image);
			}
		})
		.await
		.expect("update")
}

fn engine(kv: Arc<dyn KeyValueStore>, uploader: Arc<dyn Uploader>) -> SyncEngine {
	SyncEngine::new(MarkerStore::new(kv), uploader, DeviceInfo::default())
}

#[tokio::test]
async fn empty_store_syncs_successfully_twice() {
	let uploader = ScriptedUploader::scripted([]);
	let engine = engine(Arc::new(MemoryKeyValueStore::new()), uploader.clone());
	let mut rx = engine.subscribe();

	for _ in 0..2 {
		let outcome = engine.sync_all().await.expect("sync");
		assert!(outcome.is_success());
		assert_eq!(outcome.attempted, 0);
		assert_eq!(drain(&mut rx), [SyncEvent::Completed { uploaded: 0 }]);
	}
	assert!(uploader.seen().await.is_empty());
}

#[tokio::test]
async fn incomplete_markers_are_skipped_not_reported() {
	let kv = Arc::new(MemoryKeyValueStore::new());
	let markers = MarkerStore::new(kv.clone());
	markers.create(coordinate()).await.expect("create");

	let uploader = ScriptedUploader::scripted([]);
	let engine = engine(kv, uploader.clone());
	let mut rx = engine.subscribe();

	let outcome = engine.sync_all().await.expect("sync");
	assert!(outcome.is_success());
	assert_eq!(outcome.attempted, 0);
	assert_eq!(drain(&mut rx), [SyncEvent::Completed { uploaded: 0 }]);
	assert!(uploader.seen().await.is_empty());
}

#[tokio::test]
#[traced_test]
async fn one_failing_marker_never_stops_the_batch() {
	let dir = tempfile::tempdir().expect("tempdir");
	let kv = Arc::new(MemoryKeyValueStore::new());
	let markers = MarkerStore::new(kv.clone());

	let first = place_complete_marker(&markers, dir.path(), "first", 0).await;
	let second = place_complete_marker(&markers, dir.path(), "second", 1).await;
	let third = place_complete_marker(&markers, dir.path(), "third", 0).await;

	// Rewrite the stored collection the way an older app version left it:
	// the completion flag still true, but the declared count raised above
	// the captured images.
	let raw = kv.get(MARKERS_KEY).await.expect("get").expect("stored");
	let mut collection: serde_json::Value = serde_json::from_str(&raw).expect("parse");
	let records = collection.as_array_mut().expect("array");
	let stale = records
		.iter_mut()
		.find(|record| record["id"] == second.id)
		.expect("second marker");
	stale["connectionCount"] = 2.into();
	assert_eq!(stale["isComplete"], true);
	kv.set(MARKERS_KEY, &collection.to_string())
		.await
		.expect("set");

	let uploader = ScriptedUploader::scripted([]);
	let engine = engine(kv, uploader.clone());
	let mut rx = engine.subscribe();

	let outcome = engine.sync_all().await.expect("sync");

	assert!(!outcome.is_success());
	assert_eq!(outcome.attempted, 3);
	assert_eq!(outcome.uploaded, 2);
	assert_eq!(outcome.failures.len(), 1);
	assert_eq!(outcome.failures[0].marker_id, second.id);
	assert!(
		outcome.failures[0].reason.contains("2 connection images"),
		"reason was: {}",
		outcome.failures[0].reason
	);

	// The failing marker never reached the uploader; the other two did, in
	// stored order.
	assert_eq!(
		uploader.seen().await,
		[format!("marker_{}", first.id), format!("marker_{}", third.id)]
	);

	let events = drain(&mut rx);
	assert_eq!(events[0], SyncEvent::Started { total: 3 });
	let progress: Vec<&SyncEvent> = events
		.iter()
		.filter(|event| matches!(event, SyncEvent::Progress { .. }))
		.collect();
	assert_eq!(
		progress,
		[
			&SyncEvent::Progress {
				current: 1,
				total: 3
			},
			&SyncEvent::Progress {
				current: 2,
				total: 3
			},
			&SyncEvent::Progress {
				current: 3,
				total: 3
			},
		]
	);
	let SyncEvent::Error { message } = events.last().expect("final event") else {
		panic!("expected a final error event, got {events:?}");
	};
	assert!(message.contains(&format!("marker_{}", second.id)));

	assert!(logs_contain("marker failed, continuing"));
}

#[tokio::test]
async fn server_failures_are_isolated_per_marker() {
	let dir = tempfile::tempdir().expect("tempdir");
	let kv = Arc::new(MemoryKeyValueStore::new());
	let markers = MarkerStore::new(kv.clone());

	let rejected = place_complete_marker(&markers, dir.path(), "rejected", 0).await;
	let unconfirmed = place_complete_marker(&markers, dir.path(), "unconfirmed", 0).await;
	let offline = place_complete_marker(&markers, dir.path(), "offline", 0).await;
	let fine = place_complete_marker(&markers, dir.path(), "fine", 0).await;

	let uploader = ScriptedUploader::scripted([
		Ok(UploadResponse {
			status: 503,
			body: "maintenance".into(),
		}),
		// 2xx without the success token is conservatively a failure.
		Ok(UploadResponse {
			status: 200,
			body: "<html>thanks!</html>".into(),
		}),
		Err(UploadError::Network("connection refused".into())),
		confirmed(),
	]);
	let engine = engine(kv, uploader.clone());

	let outcome = engine.sync_all().await.expect("sync");

	assert_eq!(outcome.attempted, 4);
	assert_eq!(outcome.uploaded, 1);
	assert_eq!(uploader.seen().await.len(), 4, "every marker was attempted");

	let failed: Vec<i64> = outcome.failures.iter().map(|f| f.marker_id).collect();
	assert_eq!(failed, [rejected.id, unconfirmed.id, offline.id]);
	assert!(outcome.failures[0].reason.contains("503"));
	assert!(outcome.failures[1].reason.contains("did not confirm"));
	assert!(outcome.failures[2].reason.contains("network failure"));
	assert_eq!(
		uploader.seen().await.last(),
		Some(&format!("marker_{}", fine.id))
	);
}

#[tokio::test]
async fn a_missing_image_file_fails_only_its_marker() {
	let dir = tempfile::tempdir().expect("tempdir");
	let kv = Arc::new(MemoryKeyValueStore::new());
	let markers = MarkerStore::new(kv.clone());

	let broken = place_complete_marker(&markers, dir.path(), "broken", 1).await;
	let healthy = place_complete_marker(&markers, dir.path(), "healthy", 0).await;

	// The capture was deleted from disk after the marker was completed.
	let gone = &broken.connection_images()[0];
	tokio::fs::remove_file(gone).await.expect("remove image");

	let uploader = ScriptedUploader::scripted([]);
	let engine = engine(kv, uploader.clone());

	let outcome = engine.sync_all().await.expect("sync");

	assert_eq!(outcome.uploaded, 1);
	assert_eq!(outcome.failures.len(), 1);
	assert_eq!(outcome.failures[0].marker_id, broken.id);
	assert!(outcome.failures[0].reason.contains("image unreadable"));
	assert_eq!(uploader.seen().await, [format!("marker_{}", healthy.id)]);
}

#[tokio::test]
async fn storage_failure_aborts_the_whole_pass() {
	let uploader = ScriptedUploader::scripted([]);
	let engine = engine(Arc::new(FailingStore), uploader.clone());
	let mut rx = engine.subscribe();

	assert!(matches!(
		engine.sync_all().await,
		Err(SyncError::Storage(_))
	));
	assert!(drain(&mut rx).is_empty(), "no events for an aborted pass");
	assert!(uploader.seen().await.is_empty());
}

#[tokio::test]
async fn a_pass_reprocesses_previously_uploaded_markers() {
	let dir = tempfile::tempdir().expect("tempdir");
	let kv = Arc::new(MemoryKeyValueStore::new());
	let markers = MarkerStore::new(kv.clone());
	let marker = place_complete_marker(&markers, dir.path(), "only", 0).await;

	let uploader = ScriptedUploader::scripted([]);
	let engine = engine(kv, uploader.clone());

	engine.sync_all().await.expect("first pass");
	engine.sync_all().await.expect("second pass");

	// No synced flag exists; deduplication is the server's job.
	let id = format!("marker_{}", marker.id);
	assert_eq!(uploader.seen().await, [id.clone(), id]);
}
