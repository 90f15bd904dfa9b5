//! fieldmark core: the survey marker model and its upload pipeline.
//!
//! The app shells (map, camera, session screens) own all capture and display;
//! this crate owns what happens to the data afterwards: marker CRUD over the
//! on-device store, packaging captured photos with their sidecar metadata,
//! and the batch sync pass that pushes completed markers to the remote
//! service.

use tracing_subscriber::EnvFilter;

pub mod config;
pub mod events;
pub mod marker;
pub mod storage;
pub mod sync;

pub use config::CoreConfig;
pub use events::SyncEvent;
pub use marker::{Coordinate, MarkerRecord, MarkerStore};
pub use sync::{HttpUploader, SyncEngine, SyncOutcome};

/// Install the default tracing subscriber. App shells call this once at
/// startup; repeated calls are ignored so tests can share a process.
pub fn init_logging() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
		)
		.try_init();
}
