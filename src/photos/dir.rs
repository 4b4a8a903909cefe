use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{PhotoStore, StoreError};

/// Keeps photos in a local directory; the backend serves it under `/photos`.
pub struct DirStore {
	root: PathBuf,
	public_base: String,
}

impl DirStore {
	pub fn new(root: PathBuf, public_base: impl Into<String>) -> Self {
		Self {
			root,
			public_base: public_base.into().trim_end_matches('/').to_string(),
		}
	}

	fn url(&self, key: &str) -> String {
		format!("{}/{}", self.public_base, key)
	}
}

#[async_trait]
impl PhotoStore for DirStore {
	fn name(&self) -> &'static str {
		"dir"
	}

	async fn put(&self, key: &str, _content_type: &str, bytes: Vec<u8>) -> Result<String, StoreError> {
		let path = self.root.join(key);
		if let Some(parent) = path.parent() {
			tokio::fs::create_dir_all(parent).await?;
		}
		tokio::fs::write(&path, bytes).await?;
		Ok(self.url(key))
	}

	async fn list(&self, prefix: &str, limit: usize) -> Result<Vec<String>, StoreError> {
		let base = self.root.join(prefix.trim_end_matches('/'));
		if !tokio::fs::try_exists(&base).await? {
			return Ok(Vec::new());
		}

		let mut keys = Vec::new();
		let mut pending = vec![base];
		while let Some(dir) = pending.pop() {
			let mut entries = tokio::fs::read_dir(&dir).await?;
			while let Some(entry) = entries.next_entry().await? {
				let path = entry.path();
				if entry.file_type().await?.is_dir() {
					pending.push(path);
				} else if let Ok(rel) = path.strip_prefix(&self.root) {
					let key: Vec<&str> = rel.iter().filter_map(|p| p.to_str()).collect();
					keys.push(key.join("/"));
				}
			}
		}

		keys.sort();
		Ok(keys.iter().take(limit).map(|k| self.url(k)).collect())
	}

	fn local_root(&self) -> Option<&Path> {
		Some(&self.root)
	}
}
