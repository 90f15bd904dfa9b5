//! Turning a locally stored photo into a self-contained, transmittable unit.
//!
//! The image bytes are embedded in the payload as a base64 data URI so the
//! server needs no separate binary channel. That inflates the wire size by
//! roughly a third and materializes every image in memory, which is what
//! bounds practical batch sizes; the sequential batch loop in
//! [`super::SyncEngine`] exists because of this.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use fm_survey_metadata::ImageMetadata;
use fm_utils::FileIOError;
use serde::{Deserialize, Serialize};
use specta::Type;
use thiserror::Error;
use tokio::fs;
use tracing::warn;

/// All survey captures are JPEGs.
pub const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Debug, Error)]
pub enum PackagingError {
	#[error("image unreadable: {0}")]
	ImageRead(#[from] FileIOError),
}

/// Identity of the capturing device as sent to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
	pub model: String,
	pub manufacturer: String,
}

impl Default for DeviceInfo {
	fn default() -> Self {
		Self {
			model: "unknown".to_owned(),
			manufacturer: "unknown".to_owned(),
		}
	}
}

/// Pixel dimensions and container format.
///
/// The capture contract does not report dimensions, so these are the assumed
/// values the server has always been sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct ImageProperties {
	pub width: u32,
	pub height: u32,
	pub format: String,
}

impl Default for ImageProperties {
	fn default() -> Self {
		Self {
			width: 1920,
			height: 1080,
			format: "jpeg".to_owned(),
		}
	}
}

/// One photo, ready for transmission: embedded bytes plus the metadata the
/// server cares about, with defaults substituted where the sidecar was silent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct PackagedImage {
	pub url: String,
	pub heading: f64,
	pub timestamp: DateTime<Utc>,
	pub device_info: DeviceInfo,
	pub image_properties: ImageProperties,
	pub metadata: ImageMetadata,
}

impl PackagedImage {
	/// The one place sidecar fields are mapped onto wire fields. Every
	/// fallback lives here, not at the call sites.
	fn from_parts(url: String, metadata: ImageMetadata, defaults: &DeviceInfo) -> Self {
		let device_info = metadata.device.as_ref().map_or_else(
			|| defaults.clone(),
			|device| DeviceInfo {
				model: device.model.clone().unwrap_or_else(|| defaults.model.clone()),
				manufacturer: device
					.manufacturer
					.clone()
					.unwrap_or_else(|| defaults.manufacturer.clone()),
			},
		);

		Self {
			url,
			heading: metadata.heading().unwrap_or(0.0),
			timestamp: metadata.captured_at().unwrap_or_else(Utc::now),
			device_info,
			image_properties: ImageProperties::default(),
			metadata,
		}
	}
}

/// Package the image at `image` for upload.
///
/// A missing or unreadable image file fails the call; the caller treats that
/// as fatal for the whole marker. A missing or malformed sidecar never does:
/// packaging degrades to a stub with the current time and default identity.
pub async fn package_image(
	image: impl AsRef<Path> + Send,
	device_defaults: &DeviceInfo,
) -> Result<PackagedImage, PackagingError> {
	let image = image.as_ref();

	let bytes = fs::read(image)
		.await
		.map_err(|e| FileIOError::from((image, e)))?;
	let url = format!("{DATA_URI_PREFIX}{}", BASE64.encode(&bytes));

	let metadata = match ImageMetadata::from_sidecar(image).await {
		Ok(Some(metadata)) => metadata,
		Ok(None) => ImageMetadata::stub(Utc::now()),
		Err(e) => {
			warn!(
				image = %image.display(),
				"unusable sidecar, substituting defaults: {e}"
			);
			ImageMetadata::stub(Utc::now())
		}
	};

	Ok(PackagedImage::from_parts(url, metadata, device_defaults))
}
