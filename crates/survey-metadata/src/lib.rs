#![doc = include_str!("../README.md")]
#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	clippy::expect_used,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::as_conversions,
	clippy::dbg_macro
)]
#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

use std::{
	io,
	path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use fm_utils::FileIOError;
use tokio::fs;

mod device;
mod error;
mod location;
mod sensors;
mod timestamp;

pub use device::DeviceIdentity;
pub use error::{Error, Result};
pub use location::CaptureLocation;
pub use sensors::{Acceleration, Compass, Orientation, SensorBlock};
pub use timestamp::CaptureTimestamp;

/// Extension appended to an image path to find its sidecar.
pub const SIDECAR_SUFFIX: &str = ".json";

/// The full sidecar record written by the capture layer.
#[derive(Default, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
	pub timestamp: Option<CaptureTimestamp>,
	pub location: Option<CaptureLocation>,
	pub sensors: Option<SensorBlock>,
	pub device: Option<DeviceIdentity>,
}

impl ImageMetadata {
	/// Path of the sidecar belonging to `image` (`photo.jpg` → `photo.jpg.json`).
	pub fn sidecar_path(image: impl AsRef<Path>) -> PathBuf {
		let mut raw = image.as_ref().as_os_str().to_owned();
		raw.push(SIDECAR_SUFFIX);
		PathBuf::from(raw)
	}

	/// Read and parse the sidecar belonging to `image`.
	///
	/// A missing sidecar is `Ok(None)`; capture is best-effort and absence is
	/// expected. Unreadable or malformed sidecars are errors so callers can
	/// decide how loudly to degrade.
	pub async fn from_sidecar(image: impl AsRef<Path> + Send) -> Result<Option<Self>> {
		let path = Self::sidecar_path(image);

		let raw = match fs::read(&path).await {
			Ok(raw) => raw,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(FileIOError::from((path, e)).into()),
		};

		serde_json::from_slice(&raw)
			.map(Some)
			.map_err(|e| Error::Malformed(path, e))
	}

	/// Minimal substitute for an absent sidecar: a capture timestamp and
	/// nothing else.
	#[must_use]
	pub fn stub(captured_at: DateTime<Utc>) -> Self {
		Self {
			timestamp: Some(CaptureTimestamp {
				utc: Some(captured_at),
				local: None,
			}),
			..Self::default()
		}
	}

	/// Compass heading in degrees, if one was sampled.
	#[must_use]
	pub fn heading(&self) -> Option<f64> {
		self.sensors.as_ref()?.compass.map(|c| c.heading)
	}

	/// UTC capture instant, if the device clock recorded one.
	#[must_use]
	pub fn captured_at(&self) -> Option<DateTime<Utc>> {
		self.timestamp.as_ref()?.utc
	}
}
