//! On-disk core configuration: where uploads go and what device identity to
//! fall back on when a sidecar carries none.

use std::path::{Path, PathBuf};

use fm_utils::{fs::write_atomically, FileIOError};
use serde::{Deserialize, Serialize};
use specta::Type;
use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::sync::DeviceInfo;

/// Name of the config file inside the app's data directory.
pub const CORE_CONFIG_NAME: &str = "fieldmark.json";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("config i/o failed: {0}")]
	Io(#[from] FileIOError),
	#[error("config at ({0}) is not valid json: {1}")]
	Malformed(PathBuf, #[source] serde_json::Error),
	#[error("config serialization failed: {0}")]
	Serialize(#[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreConfig {
	pub upload_endpoint: String,
	pub device: DeviceInfo,
}

impl Default for CoreConfig {
	fn default() -> Self {
		Self {
			upload_endpoint: "http://127.0.0.1:8080/upload".to_owned(),
			device: DeviceInfo::default(),
		}
	}
}

impl CoreConfig {
	/// Load the config at `path`, falling back to defaults when the file does
	/// not exist yet. A present-but-broken file is an error; silently
	/// reverting a surveyor's endpoint to localhost would lose field data.
	pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		match fs::read(path).await {
			Ok(raw) => serde_json::from_slice(&raw)
				.map_err(|e| ConfigError::Malformed(path.to_owned(), e)),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				debug!(path = %path.display(), "no config on disk, using defaults");
				Ok(Self::default())
			}
			Err(e) => Err(FileIOError::from((path, e)).into()),
		}
	}

	pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
		let raw = serde_json::to_vec_pretty(self).map_err(ConfigError::Serialize)?;
		write_atomically(path, raw).await?;
		Ok(())
	}
}
