use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use url::Url;

use super::{PhotoStore, StoreError};

/// Cloud Storage bucket reached through the JSON API.
pub struct GcsStore {
	client: Client,
	base: String,
	bucket: String,
	access_token: Option<String>,
	public_base: String,
}

#[derive(Debug, Deserialize)]
struct ObjectList {
	#[serde(default)]
	items: Vec<ObjectEntry>,
}

#[derive(Debug, Deserialize)]
struct ObjectEntry {
	name: String,
}

#[derive(Debug, Deserialize)]
struct GcsErrorBody {
	error: Option<GcsErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GcsErrorDetail {
	message: Option<String>,
}

impl GcsStore {
	pub fn new(
		client: Client,
		base: impl Into<String>,
		bucket: impl Into<String>,
		access_token: Option<String>,
		public_base: Option<String>,
	) -> Self {
		let base = base.into().trim_end_matches('/').to_string();
		let public_base = public_base
			.map(|p| p.trim_end_matches('/').to_string())
			.unwrap_or_else(|| base.clone());
		Self {
			client,
			base,
			bucket: bucket.into(),
			access_token,
			public_base,
		}
	}

	/// `{base}/<segments...>` with each segment escaped.
	fn api_url(&self, segments: &[&str]) -> Result<Url, StoreError> {
		let mut url = Url::parse(&self.base)
			.map_err(|e| StoreError::Remote(format!("invalid storage base URL: {}", e)))?;
		url.path_segments_mut()
			.map_err(|_| StoreError::Remote("storage base URL cannot take a path".to_string()))?
			.pop_if_empty()
			.extend(segments);
		Ok(url)
	}

	fn public_url(&self, key: &str) -> String {
		format!("{}/{}/{}", self.public_base, self.bucket, key)
	}

	fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
		match self.access_token.as_deref().filter(|t| !t.is_empty()) {
			Some(token) => req.bearer_auth(token),
			None => req,
		}
	}

	async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response, StoreError> {
		let resp = self
			.authorize(req)
			.send()
			.await
			.map_err(|e| StoreError::Remote(format!("{} request failed: {}", what, e.without_url())))?;

		let status = resp.status();
		if status.is_success() {
			return Ok(resp);
		}
		let message = resp
			.json::<GcsErrorBody>()
			.await
			.ok()
			.and_then(|b| b.error)
			.and_then(|e| e.message)
			.unwrap_or_else(|| "no details".to_string());
		Err(StoreError::Remote(format!(
			"{} HTTP {}: {}",
			what,
			status.as_u16(),
			message
		)))
	}
}

#[async_trait]
impl PhotoStore for GcsStore {
	fn name(&self) -> &'static str {
		"gcs"
	}

	async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<String, StoreError> {
		let mut url = self.api_url(&["upload", "storage", "v1", "b", self.bucket.as_str(), "o"])?;
		url.query_pairs_mut()
			.append_pair("uploadType", "media")
			.append_pair("name", key)
			.append_pair("predefinedAcl", "publicRead");
		debug!("uploading {} ({} bytes) to bucket {}", key, bytes.len(), self.bucket);

		let req = self
			.client
			.post(url)
			.header(reqwest::header::CONTENT_TYPE, content_type)
			.body(bytes);
		self.send(req, "storage upload").await?;
		Ok(self.public_url(key))
	}

	async fn list(&self, prefix: &str, limit: usize) -> Result<Vec<String>, StoreError> {
		let mut url = self.api_url(&["storage", "v1", "b", self.bucket.as_str(), "o"])?;
		url.query_pairs_mut()
			.append_pair("prefix", prefix)
			.append_pair("maxResults", &limit.to_string());

		let resp = self.send(self.client.get(url), "storage list").await?;
		let body: ObjectList = resp
			.json()
			.await
			.map_err(|e| StoreError::Remote(format!("storage list returned unexpected data: {}", e.without_url())))?;

		Ok(body
			.items
			.iter()
			.filter(|o| !o.name.ends_with('/'))
			.take(limit)
			.map(|o| self.public_url(&o.name))
			.collect())
	}
}
