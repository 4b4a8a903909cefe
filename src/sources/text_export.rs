use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use super::{TableSource, get_ok};
use crate::ingest::parsers::parse_csv;
use crate::ingest::{CandidateSpec, IngestError, RawTable, detect_column};

/// Reads the published CSV export of the registration sheet.
pub struct TextExportSource {
	client: Client,
	url: Option<String>,
	team: CandidateSpec,
}

impl TextExportSource {
	pub fn new(client: Client, url: Option<String>, team: CandidateSpec) -> Self {
		Self { client, url, team }
	}
}

#[async_trait]
impl TableSource for TextExportSource {
	fn name(&self) -> &'static str {
		"text_export"
	}

	async fn fetch_table(&self) -> Result<RawTable, IngestError> {
		let url = self
			.url
			.as_deref()
			.filter(|u| !u.trim().is_empty())
			.ok_or_else(|| IngestError::Config("CSV export URL not configured".to_string()))?;

		debug!("fetching CSV export from {}", url);
		let resp = get_ok(self.client.get(url), "CSV export").await?;
		let body = resp
			.text()
			.await
			.map_err(|e| IngestError::Fetch(format!("CSV export read failed: {}", e)))?;

		let table = RawTable::from_grid(parse_csv(&body));
		if detect_column(&table.headers, &self.team).is_none() {
			return Err(IngestError::missing_team_column());
		}
		Ok(table)
	}
}
