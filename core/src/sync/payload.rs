//! Per-marker upload payload assembly. No network I/O happens here.

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use specta::Type;

use crate::marker::{Coordinate, MarkerRecord};

use super::packager::{package_image, DeviceInfo, PackagedImage, PackagingError};

/// The exact JSON shape the upload endpoint expects for one marker.
/// Transient: built, sent, discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct UploadPayload {
	pub marker_id: String,
	pub timestamp: DateTime<Utc>,
	pub location: Coordinate,
	pub center_pole: Option<PackagedImage>,
	pub branch_images: Vec<PackagedImage>,
}

/// Assemble the payload for `marker`.
///
/// A marker uploads atomically or not at all: if any image fails to package,
/// the whole build fails. Connection images are independent reads, so they
/// are packaged concurrently; `try_join_all` keeps the output in declaration
/// order regardless of which read finishes first.
pub async fn build_payload(
	marker: &MarkerRecord,
	device_defaults: &DeviceInfo,
) -> Result<UploadPayload, PackagingError> {
	let center_pole = match marker.center_image() {
		Some(image) => Some(package_image(image, device_defaults).await?),
		None => None,
	};

	let branch_images = try_join_all(
		marker
			.connection_images()
			.iter()
			.map(|image| package_image(image, device_defaults)),
	)
	.await?;

	Ok(UploadPayload {
		marker_id: format!("marker_{}", marker.id),
		timestamp: Utc::now(),
		location: marker.coordinate,
		center_pole,
		branch_images,
	})
}
