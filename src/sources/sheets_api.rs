use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{TableSource, get_ok, read_json};
use crate::config::SourceSettings;
use crate::ingest::table::grid_text;
use crate::ingest::{IngestError, RawTable};

/// Body of a `spreadsheets.values.get` response. Sheets omits `values`
/// entirely for an empty range.
#[derive(Debug, Deserialize)]
struct ValuesResponse {
	#[serde(default)]
	values: Vec<Vec<serde_json::Value>>,
}

/// Reads a values range through the Google Sheets API with an API key.
pub struct SheetsApiSource {
	client: Client,
	base: String,
	sheet_id: Option<String>,
	api_key: Option<String>,
	range: String,
}

impl SheetsApiSource {
	pub fn new(
		client: Client,
		base: impl Into<String>,
		sheet_id: Option<String>,
		api_key: Option<String>,
		range: impl Into<String>,
	) -> Self {
		Self {
			client,
			base: base.into(),
			sheet_id,
			api_key,
			range: range.into(),
		}
	}

	pub fn from_settings(client: Client, settings: &SourceSettings) -> Self {
		Self::new(
			client,
			settings.sheets_base.clone(),
			settings.sheet_id.clone(),
			settings.api_key.clone(),
			settings.sheet_range.clone(),
		)
	}

	pub fn has_sheet_id(&self) -> bool {
		present(&self.sheet_id).is_some()
	}

	pub fn is_configured(&self) -> bool {
		present(&self.sheet_id).is_some() && present(&self.api_key).is_some()
	}

	/// `{base}/{sheet_id}/values/{range}?key={api_key}` with each segment escaped.
	fn values_url(&self) -> Result<Url, IngestError> {
		let (Some(sheet_id), Some(api_key)) = (present(&self.sheet_id), present(&self.api_key))
		else {
			return Err(IngestError::Config(
				"Sheets API needs both a sheet id and an API key".to_string(),
			));
		};

		let mut url = Url::parse(&self.base)
			.map_err(|e| IngestError::Config(format!("invalid Sheets API base URL: {}", e)))?;
		url.path_segments_mut()
			.map_err(|_| IngestError::Config("Sheets API base URL cannot take a path".to_string()))?
			.pop_if_empty()
			.push(sheet_id)
			.push("values")
			.push(&self.range);
		url.query_pairs_mut().append_pair("key", api_key);
		Ok(url)
	}

	/// Raw value grid of the configured range, header row included.
	pub async fn fetch_values(&self) -> Result<Vec<Vec<String>>, IngestError> {
		let url = self.values_url()?;
		debug!("fetching Sheets range {:?}", self.range);

		let resp = get_ok(self.client.get(url), "Sheets API").await?;
		let body: ValuesResponse = read_json(resp, "Sheets API").await?;
		Ok(grid_text(&body.values))
	}
}

fn present(v: &Option<String>) -> Option<&str> {
	v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[async_trait]
impl TableSource for SheetsApiSource {
	fn name(&self) -> &'static str {
		"sheets_api"
	}

	async fn fetch_table(&self) -> Result<RawTable, IngestError> {
		Ok(RawTable::from_grid(self.fetch_values().await?))
	}
}

#[cfg(test)]
#[cfg(feature = "ingest-tests")]
mod tests {
	use std::collections::HashMap;

	use axum::extract::{Path, Query};
	use axum::http::StatusCode;
	use axum::response::IntoResponse;
	use axum::{Json, Router, routing::get};
	use serde_json::json;

	use super::*;
	use crate::test_utils::spawn_router;

	fn source(base: &str, id: Option<&str>, key: Option<&str>) -> SheetsApiSource {
		SheetsApiSource::new(
			Client::new(),
			base,
			id.map(String::from),
			key.map(String::from),
			"Form Responses 1!A1:Z",
		)
	}

	#[tokio::test]
	async fn reads_values_range() {
		let base = spawn_router(Router::new().route(
			"/sheet123/values/{range}",
			get(
				|Path(range): Path<String>, Query(q): Query<HashMap<String, String>>| async move {
					if q.get("key").map(String::as_str) != Some("k3y") {
						return (StatusCode::FORBIDDEN, Json(json!({}))).into_response();
					}
					Json(json!({
						"range": range,
						"values": [["Team", "Range"], ["Falcons", range], ["Auks"]]
					}))
					.into_response()
				},
			),
		))
		.await;

		let table = source(&base, Some("sheet123"), Some("k3y"))
			.fetch_table()
			.await
			.expect("fetch");
		assert_eq!(table.headers, vec!["Team", "Range"]);
		assert_eq!(table.cell(0, 1), "Form Responses 1!A1:Z");
		assert_eq!(table.cell(1, 1), "");
	}

	#[tokio::test]
	async fn absent_values_is_empty_table() {
		let base = spawn_router(Router::new().route(
			"/sheet123/values/{range}",
			get(|| async { Json(json!({ "range": "Form Responses 1!A1:Z" })) }),
		))
		.await;

		let table = source(&base, Some("sheet123"), Some("k"))
			.fetch_table()
			.await
			.expect("fetch");
		assert!(table.is_empty());
	}

	#[tokio::test]
	async fn missing_key_or_id_is_config_error() {
		for s in [
			source("http://127.0.0.1:9", None, Some("k")),
			source("http://127.0.0.1:9", Some("id"), None),
			source("http://127.0.0.1:9", Some("id"), Some("  ")),
		] {
			assert!(!s.is_configured());
			let err = s.fetch_table().await.unwrap_err();
			assert_eq!(err.kind(), "config");
		}
	}

	#[tokio::test]
	async fn error_status_is_fetch_error_without_key() {
		let base = spawn_router(Router::new().route(
			"/sheet123/values/{range}",
			get(|| async { (StatusCode::FORBIDDEN, "denied") }),
		))
		.await;

		let err = source(&base, Some("sheet123"), Some("s3cret"))
			.fetch_table()
			.await
			.unwrap_err();
		assert_eq!(err, IngestError::Fetch("Sheets API HTTP 403".to_string()));
		assert!(!err.to_string().contains("s3cret"));
	}

	#[tokio::test]
	async fn malformed_body_is_format_error() {
		let base = spawn_router(Router::new().route(
			"/sheet123/values/{range}",
			get(|| async { Json(json!({ "values": "nope" })) }),
		))
		.await;

		let err = source(&base, Some("sheet123"), Some("k"))
			.fetch_table()
			.await
			.unwrap_err();
		assert_eq!(err.kind(), "format");
	}
}
