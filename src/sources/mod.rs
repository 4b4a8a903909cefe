//! Interchangeable origins for the registration table.
//!
//! Every adapter yields a [`RawTable`]; which one runs is decided by
//! [`SourceMode`] in the settings, never by callers.

pub mod backend;
pub mod sheets_api;
pub mod text_export;

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::config::{SourceMode, SourceSettings};
use crate::ingest::{ColumnSpecs, IngestError, RawTable};

pub use backend::{BackendSource, api_base, resolve_api_base};
pub use sheets_api::SheetsApiSource;
pub use text_export::TextExportSource;

/// Capability shared by the three table origins.
#[async_trait]
pub trait TableSource: Send + Sync {
	/// Short label for logs and status output.
	fn name(&self) -> &'static str;

	async fn fetch_table(&self) -> Result<RawTable, IngestError>;
}

/// Shared HTTP client for all sources.
pub fn http_client() -> Result<Client, IngestError> {
	Client::builder()
		.user_agent(concat!("labamba-hub/", env!("CARGO_PKG_VERSION")))
		.connect_timeout(Duration::from_secs(10))
		.build()
		.map_err(|e| IngestError::Config(format!("HTTP client setup failed: {}", e)))
}

/// Build the source selected by `settings.mode`.
pub fn from_settings(
	settings: &SourceSettings,
	specs: &ColumnSpecs,
	client: Client,
) -> Box<dyn TableSource> {
	debug!("table source: {}", settings.mode.as_str());
	match settings.mode {
		SourceMode::TextExport => Box::new(TextExportSource::new(
			client,
			settings.csv_url.clone(),
			specs.team.clone(),
		)),
		SourceMode::SheetsApi => Box::new(SheetsApiSource::from_settings(client, settings)),
		SourceMode::Backend => Box::new(BackendSource::new(client, resolve_api_base(settings))),
	}
}

/// Send a prepared GET and require a 2xx status.
///
/// Transport errors are stripped of their URL so query-string credentials
/// never reach the status line or the logs.
pub(crate) async fn get_ok(
	request: reqwest::RequestBuilder,
	what: &str,
) -> Result<Response, IngestError> {
	let resp = request
		.send()
		.await
		.map_err(|e| IngestError::Fetch(format!("{} request failed: {}", what, e.without_url())))?;

	let status = resp.status();
	if !status.is_success() {
		return Err(IngestError::Fetch(format!(
			"{} HTTP {}",
			what,
			status.as_u16()
		)));
	}
	Ok(resp)
}

pub(crate) async fn read_json<T: DeserializeOwned>(
	resp: Response,
	what: &str,
) -> Result<T, IngestError> {
	resp.json::<T>().await.map_err(|e| {
		let e = e.without_url();
		if e.is_decode() {
			IngestError::Format(format!("{} returned unexpected data: {}", what, e))
		} else {
			IngestError::Fetch(format!("{} read failed: {}", what, e))
		}
	})
}
