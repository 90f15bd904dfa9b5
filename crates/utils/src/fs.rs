use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::FileIOError;

fn staging_path(target: &Path) -> PathBuf {
	let mut name = target
		.file_name()
		.map(ToOwned::to_owned)
		.unwrap_or_default();
	name.push(".tmp");
	target.with_file_name(name)
}

/// Write `contents` to a sibling staging file, then rename it over `target`,
/// so readers never observe a half-written file.
pub async fn write_atomically(
	target: impl AsRef<Path>,
	contents: impl AsRef<[u8]>,
) -> Result<(), FileIOError> {
	let target = target.as_ref();
	let staging = staging_path(target);

	fs::write(&staging, contents.as_ref())
		.await
		.map_err(|e| FileIOError::from((&staging, e)))?;

	fs::rename(&staging, target)
		.await
		.map_err(|e| FileIOError::from((target, e)))
}
