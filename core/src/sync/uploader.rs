//! The HTTP seam between the sync engine and the remote service.

use async_trait::async_trait;
use reqwest::header;
use thiserror::Error;

use super::payload::UploadPayload;

/// Literal the response body must contain for a 2xx reply to count as a
/// confirmed upload. The endpoint answers with HTML, not structured JSON, so
/// this body scan is the contract; it is server-coupled and must change in
/// lockstep with the server.
pub const UPLOAD_SUCCESS_TOKEN: &str = "success";

/// Maximum response-body length carried in failure reasons.
const BODY_SNIPPET_LEN: usize = 512;

/// Transport-level failure: the request never produced an HTTP response.
#[derive(Debug, Error)]
pub enum UploadError {
	#[error("network failure: {0}")]
	Network(String),
}

impl From<reqwest::Error> for UploadError {
	fn from(e: reqwest::Error) -> Self {
		Self::Network(e.to_string())
	}
}

/// The server answered, but not with a confirmed success.
#[derive(Debug, Error)]
pub enum UploadRejection {
	#[error("server rejected upload (status {status}): {body}")]
	Rejected { status: u16, body: String },
	#[error("server did not confirm upload (status {status}): {body}")]
	Unconfirmed { status: u16, body: String },
}

/// What came back over the wire, undigested.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadResponse {
	pub status: u16,
	pub body: String,
}

/// Decide whether a response is a confirmed success.
///
/// Conservative on purpose: a 2xx with an unrecognized body is treated as a
/// failure rather than assumed to have worked, because the caller will retry
/// on the next pass and the server deduplicates.
pub fn interpret_response(response: &UploadResponse) -> Result<(), UploadRejection> {
	if !(200..300).contains(&response.status) {
		return Err(UploadRejection::Rejected {
			status: response.status,
			body: snippet(&response.body),
		});
	}

	if response.body.contains(UPLOAD_SUCCESS_TOKEN) {
		Ok(())
	} else {
		Err(UploadRejection::Unconfirmed {
			status: response.status,
			body: snippet(&response.body),
		})
	}
}

fn snippet(body: &str) -> String {
	let trimmed = body.trim();
	match trimmed.char_indices().nth(BODY_SNIPPET_LEN) {
		Some((cut, _)) => format!("{}…", &trimmed[..cut]),
		None => trimmed.to_owned(),
	}
}

/// How a payload reaches the server. The engine only ever talks to this
/// trait, so tests substitute a recording stub.
#[async_trait]
pub trait Uploader: Send + Sync {
	async fn upload(&self, payload: &UploadPayload) -> Result<UploadResponse, UploadError>;
}

/// The real thing: `POST` to the configured endpoint.
///
/// No timeout is configured beyond the client's platform defaults; a hung
/// request surfaces as a per-marker network failure, not a batch abort.
pub struct HttpUploader {
	client: reqwest::Client,
	endpoint: String,
}

impl HttpUploader {
	#[must_use]
	pub fn new(endpoint: impl Into<String>) -> Self {
		Self {
			client: reqwest::Client::new(),
			endpoint: endpoint.into(),
		}
	}
}

#[async_trait]
impl Uploader for HttpUploader {
	async fn upload(&self, payload: &UploadPayload) -> Result<UploadResponse, UploadError> {
		let response = self
			.client
			.post(&self.endpoint)
			.header(header::ACCEPT, "application/json, text/plain, */*")
			.json(payload)
			.send()
			.await?;

		let status = response.status().as_u16();
		let body = response.text().await?;

		Ok(UploadResponse { status, body })
	}
}
