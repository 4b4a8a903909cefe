//! Storage behind the photo gallery endpoints.
//!
//! Uploads land under [`UPLOAD_PREFIX`] with a dated, random key; listing
//! returns public URLs in key order.

pub mod dir;
pub mod gcs;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use reqwest::Client;
use thiserror::Error;
use uuid::Uuid;

use crate::config::Settings;

pub use dir::DirStore;
pub use gcs::GcsStore;

pub const UPLOAD_PREFIX: &str = "uploads/";

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("storage I/O failed: {0}")]
	Io(#[from] std::io::Error),

	#[error("{0}")]
	Remote(String),
}

#[async_trait]
pub trait PhotoStore: Send + Sync {
	fn name(&self) -> &'static str;

	/// Store one object and return its public URL.
	async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<String, StoreError>;

	/// Public URLs of up to `limit` objects under `prefix`, in key order.
	async fn list(&self, prefix: &str, limit: usize) -> Result<Vec<String>, StoreError>;

	/// Directory to serve the objects from, for stores that keep them locally.
	fn local_root(&self) -> Option<&Path> {
		None
	}
}

/// `uploads/YYYY/MM/DD/<uuid><.ext>`; the extension comes from the uploaded
/// file name and defaults to `.jpg`.
pub fn upload_key(file_name: &str, now: DateTime<Utc>) -> String {
	let ext = Path::new(file_name)
		.extension()
		.and_then(|e| e.to_str())
		.filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
		.map(|e| format!(".{}", e.to_lowercase()))
		.unwrap_or_else(|| ".jpg".to_string());

	format!(
		"{}{}/{}{}",
		UPLOAD_PREFIX,
		now.format("%Y/%m/%d"),
		Uuid::new_v4().simple(),
		ext
	)
}

/// Build the configured store, if any.
pub fn from_settings(settings: &Settings, client: Client) -> Option<Arc<dyn PhotoStore>> {
	let photos = &settings.photos;
	if let Some(root) = &photos.dir {
		let public_base = photos
			.public_base
			.clone()
			.unwrap_or_else(|| format!("http://{}:{}/photos", settings.host, settings.port));
		debug!("photos kept in {}", root.display());
		return Some(Arc::new(DirStore::new(root.clone(), public_base)));
	}

	let bucket = photos
		.bucket
		.as_deref()
		.map(str::trim)
		.filter(|b| !b.is_empty())?;
	debug!("photos kept in bucket {}", bucket);
	Some(Arc::new(GcsStore::new(
		client,
		photos.storage_base.clone(),
		bucket,
		photos.access_token.clone(),
		photos.public_base.clone(),
	)))
}
