use chrono::{DateTime, Utc};

/// Capture instant as recorded by the device clock.
///
/// `local` is the device's own rendering of the wall-clock time and is kept
/// verbatim; only `utc` is meaningful for ordering.
#[derive(Default, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, specta::Type)]
#[serde(rename_all = "camelCase")]
pub struct CaptureTimestamp {
	pub utc: Option<DateTime<Utc>>,
	pub local: Option<String>,
}
