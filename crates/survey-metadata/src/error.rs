use std::path::PathBuf;

use fm_utils::FileIOError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("there was an i/o error while reading a sidecar: {0}")]
	Io(#[from] FileIOError),
	#[error("the sidecar at ({0}) is not valid json: {1}")]
	Malformed(PathBuf, #[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
