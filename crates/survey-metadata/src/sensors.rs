/// Inertial and magnetic sensor readings sampled when the shutter fired.
#[derive(Default, Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
#[serde(rename_all = "camelCase")]
pub struct SensorBlock {
	pub compass: Option<Compass>,
	pub orientation: Option<Orientation>,
	pub acceleration: Option<Acceleration>,
}

/// Magnetic heading in degrees, 0 = north, clockwise.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
#[serde(rename_all = "camelCase")]
pub struct Compass {
	pub heading: f64,
}

/// Device attitude in degrees.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
#[serde(rename_all = "camelCase")]
pub struct Orientation {
	pub pitch: f64,
	pub roll: f64,
	pub yaw: f64,
}

/// Accelerometer sample in m/s².
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
#[serde(rename_all = "camelCase")]
pub struct Acceleration {
	pub x: f64,
	pub y: f64,
	pub z: f64,
}
