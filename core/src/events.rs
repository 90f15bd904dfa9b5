//! Events the core pushes at whatever UI is listening.

use serde::{Deserialize, Serialize};
use specta::Type;
use tokio::sync::broadcast;

/// Capacity of the sync event channel; a UI that lags behind this many events
/// only loses intermediate progress ticks.
pub const SYNC_EVENT_CHANNEL_SIZE: usize = 64;

/// Progress and outcome notifications for one sync pass.
///
/// Emitted over a broadcast channel owned by the sync engine; subscribe via
/// [`crate::sync::SyncEngine::subscribe`]. Nobody listening is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Type)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SyncEvent {
	Started { total: u32 },
	Progress { current: u32, total: u32 },
	Completed { uploaded: u32 },
	Error { message: String },
}

pub(crate) fn sync_event_channel() -> broadcast::Sender<SyncEvent> {
	broadcast::channel(SYNC_EVENT_CHANNEL_SIZE).0
}
