/// Identity of the device that captured an image.
#[derive(Default, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentity {
	pub model: Option<String>,
	pub manufacturer: Option<String>,
	pub os: Option<String>,
}
