use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use super::{TableSource, get_ok, read_json};
use crate::config::SourceSettings;
use crate::ingest::table::{cell_text, grid_text};
use crate::ingest::{IngestError, RawTable};

/// `{ headers, rows }` as served by the club backend's `/registrations`.
#[derive(Debug, Deserialize)]
struct RegistrationsBody {
	#[serde(default)]
	headers: Vec<serde_json::Value>,
	#[serde(default)]
	rows: Vec<Vec<serde_json::Value>>,
}

/// Whether `host` is one of the production hosts (or a subdomain of one).
///
/// Suffixes match on a label boundary: `www.labambafrisbee.se` is a
/// production host, `notlabambafrisbee.se` is not.
pub fn is_production_host(host: &str, suffixes: &[String]) -> bool {
	let host = host.trim().trim_end_matches('.').to_lowercase();
	suffixes
		.iter()
		.map(|s| s.trim().trim_start_matches('.').to_lowercase())
		.filter(|s| !s.is_empty())
		.any(|s| host == s || host.ends_with(&format!(".{}", s)))
}

/// API base for a page served from `host`.
///
/// Production hosts reach the API through the site itself
/// (`{site_origin}{site_base_path}/api`); anything else talks to the
/// backend directly (`{backend_origin}/api`).
pub fn api_base(
	host: &str,
	suffixes: &[String],
	site_origin: &str,
	site_base_path: &str,
	backend_origin: &str,
) -> String {
	if is_production_host(host, suffixes) {
		let path = site_base_path.trim_matches('/');
		let origin = site_origin.trim_end_matches('/');
		if path.is_empty() {
			format!("{}/api", origin)
		} else {
			format!("{}/{}/api", origin, path)
		}
	} else {
		format!("{}/api", backend_origin.trim_end_matches('/'))
	}
}

pub fn resolve_api_base(settings: &SourceSettings) -> String {
	api_base(
		&settings.page_host,
		&settings.production_suffixes,
		&settings.site_origin,
		&settings.site_base_path,
		&settings.backend_origin,
	)
}

/// Reads registrations through the club backend.
pub struct BackendSource {
	client: Client,
	api_base: String,
}

impl BackendSource {
	pub fn new(client: Client, api_base: impl Into<String>) -> Self {
		Self {
			client,
			api_base: api_base.into(),
		}
	}

	pub fn api_base(&self) -> &str {
		&self.api_base
	}
}

#[async_trait]
impl TableSource for BackendSource {
	fn name(&self) -> &'static str {
		"backend"
	}

	async fn fetch_table(&self) -> Result<RawTable, IngestError> {
		let url = format!("{}/registrations", self.api_base.trim_end_matches('/'));
		debug!("fetching registrations from {}", url);

		let resp = get_ok(self.client.get(&url), "Registrations API").await?;
		let body: RegistrationsBody = read_json(resp, "Registrations API").await?;

		Ok(RawTable::new(
			body.headers.iter().map(cell_text).collect(),
			grid_text(&body.rows),
		))
	}
}
