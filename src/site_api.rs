//! Client for the backend's photo and payment endpoints.

use log::debug;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SourceSettings;
use crate::sources::resolve_api_base;

#[derive(Debug, Error)]
pub enum ApiError {
	#[error("request failed: {0}")]
	Transport(String),

	#[error("HTTP {status}: {detail}")]
	Status { status: u16, detail: String },

	#[error("{0}")]
	Rejected(String),

	#[error("unexpected response: {0}")]
	Decode(String),

	#[error("invalid request: {0}")]
	Invalid(String),
}

impl From<reqwest::Error> for ApiError {
	fn from(e: reqwest::Error) -> Self {
		let e = e.without_url();
		if e.is_decode() {
			ApiError::Decode(e.to_string())
		} else {
			ApiError::Transport(e.to_string())
		}
	}
}

#[derive(Debug, Deserialize)]
struct PhotosBody {
	#[serde(default)]
	photos: Vec<String>,
}

/// Reply to a photo upload.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UploadedPhoto {
	#[serde(default)]
	pub ok: bool,
	pub url: Option<String>,
	pub key: Option<String>,
	pub detail: Option<String>,
}

#[derive(Debug, Serialize)]
struct CheckoutRequest<'a> {
	amount_sek: u32,
	description: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutBody {
	session_id: String,
}

/// FastAPI-style error body.
#[derive(Debug, Deserialize)]
struct ErrorBody {
	detail: Option<serde_json::Value>,
}

pub struct SiteApi {
	client: Client,
	base: String,
}

impl SiteApi {
	pub fn new(client: Client, api_base: impl Into<String>) -> Self {
		Self {
			client,
			base: api_base.into().trim_end_matches('/').to_string(),
		}
	}

	pub fn from_settings(client: Client, settings: &SourceSettings) -> Self {
		Self::new(client, resolve_api_base(settings))
	}

	pub fn api_base(&self) -> &str {
		&self.base
	}

	/// Public URLs of uploaded photos, newest listing order as the backend returns it.
	pub async fn list_photos(&self, limit: usize) -> Result<Vec<String>, ApiError> {
		let url = format!("{}/photos", self.base);
		debug!("listing photos from {}", url);
		let resp = self
			.client
			.get(&url)
			.query(&[("limit", limit)])
			.send()
			.await?;
		let body: PhotosBody = decode(resp).await?;
		Ok(body.photos)
	}

	/// Upload one image as multipart field `file`.
	pub async fn upload_photo(
		&self,
		file_name: &str,
		content_type: &str,
		bytes: Vec<u8>,
	) -> Result<UploadedPhoto, ApiError> {
		if !content_type.starts_with("image/") {
			return Err(ApiError::Invalid("only image uploads are allowed".to_string()));
		}

		let part = Part::bytes(bytes)
			.file_name(file_name.to_string())
			.mime_str(content_type)?;
		let form = Form::new().part("file", part);

		let resp = self
			.client
			.post(format!("{}/photos", self.base))
			.multipart(form)
			.send()
			.await?;
		let uploaded: UploadedPhoto = decode(resp).await?;
		if !uploaded.ok {
			return Err(ApiError::Rejected(
				uploaded
					.detail
					.clone()
					.unwrap_or_else(|| "upload was not accepted".to_string()),
			));
		}
		Ok(uploaded)
	}

	/// Create a hosted checkout session and return its id.
	pub async fn create_checkout(
		&self,
		amount_sek: u32,
		description: Option<&str>,
	) -> Result<String, ApiError> {
		if amount_sek == 0 {
			return Err(ApiError::Invalid("amount must be positive".to_string()));
		}

		let resp = self
			.client
			.post(format!("{}/pay/checkout", self.base))
			.json(&CheckoutRequest {
				amount_sek,
				description,
			})
			.send()
			.await?;
		let body: CheckoutBody = decode(resp).await?;
		Ok(body.session_id)
	}
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
	let status = resp.status();
	if !status.is_success() {
		let text = resp.text().await.unwrap_or_default();
		return Err(ApiError::Status {
			status: status.as_u16(),
			detail: error_detail(&text),
		});
	}
	Ok(resp.json::<T>().await?)
}

fn error_detail(body: &str) -> String {
	match serde_json::from_str::<ErrorBody>(body) {
		Ok(ErrorBody {
			detail: Some(serde_json::Value::String(s)),
		}) => s,
		Ok(ErrorBody { detail: Some(v) }) => v.to_string(),
		_ if body.trim().is_empty() => "no details".to_string(),
		_ => body.trim().chars().take(200).collect(),
	}
}

/// Guess an image content type from a file name.
pub fn image_content_type(file_name: &str) -> Option<&'static str> {
	let ext = file_name.rsplit_once('.')?.1.to_lowercase();
	match ext.as_str() {
		"jpg" | "jpeg" => Some("image/jpeg"),
		"png" => Some("image/png"),
		"gif" => Some("image/gif"),
		"webp" => Some("image/webp"),
		"heic" => Some("image/heic"),
		_ => None,
	}
}

#[cfg(test)]
#[cfg(feature = "unit-tests")]
mod tests {
	use super::*;

	#[test]
	fn detail_extraction() {
		assert_eq!(error_detail(r#"{"detail":"PHOTOS_BUCKET not set"}"#), "PHOTOS_BUCKET not set");
		assert_eq!(error_detail(""), "no details");
		assert_eq!(error_detail("Bad Gateway"), "Bad Gateway");
	}

	#[test]
	fn content_types() {
		assert_eq!(image_content_type("team.JPG"), Some("image/jpeg"));
		assert_eq!(image_content_type("a.b.png"), Some("image/png"));
		assert_eq!(image_content_type("notes.txt"), None);
		assert_eq!(image_content_type("noext"), None);
	}
}
