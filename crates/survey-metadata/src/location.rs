/// A device location fix taken at capture time, WGS84 degrees.
///
/// Altitude and accuracy are only present when the positioning hardware
/// reported them.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
#[serde(rename_all = "camelCase")]
pub struct CaptureLocation {
	pub latitude: f64,
	pub longitude: f64,
	pub altitude: Option<f64>,
	pub accuracy: Option<f64>,
}
