use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::detect::{CandidateSpec, detect_column};
use super::error::IngestError;
use super::table::RawTable;

/// Canonical registration entry every source converges to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
	pub team: String,
	pub country: String,
	pub level: String,
}

impl TeamRecord {
	pub fn new(
		team: impl Into<String>,
		country: impl Into<String>,
		level: impl Into<String>,
	) -> Self {
		Self {
			team: team.into(),
			country: country.into(),
			level: level.into(),
		}
	}

	/// Identity used for deduplication.
	pub fn key(&self) -> String {
		self.team.trim().to_lowercase()
	}
}

/// Candidate specs for the three projected fields.
#[derive(Debug, Clone)]
pub struct ColumnSpecs {
	pub team: CandidateSpec,
	pub country: CandidateSpec,
	pub level: CandidateSpec,
}

/// Column indices found for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
	pub team: usize,
	pub country: Option<usize>,
	pub level: Option<usize>,
}

impl ColumnMap {
	/// Detect all three columns. Only a missing team column is an error.
	pub fn detect(headers: &[String], specs: &ColumnSpecs) -> Result<Self, IngestError> {
		let team = detect_column(headers, &specs.team).ok_or_else(IngestError::missing_team_column)?;
		let country = detect_column(headers, &specs.country);
		let level = detect_column(headers, &specs.level);

		if country.is_none() {
			warn!("no country column among headers {:?}; country left blank", headers);
		}
		if level.is_none() {
			warn!("no level column among headers {:?}; level left blank", headers);
		}
		debug!(
			"columns detected: team={} country={:?} level={:?}",
			team, country, level
		);

		Ok(Self {
			team,
			country,
			level,
		})
	}
}

/// Project every data row of `table` into a [`TeamRecord`].
///
/// Rows with an empty team are still emitted here; [`super::reduce::reduce`]
/// filters them.
pub fn project(table: &RawTable, specs: &ColumnSpecs) -> Result<Vec<TeamRecord>, IngestError> {
	let cols = ColumnMap::detect(&table.headers, specs)?;

	let field = |row: usize, col: Option<usize>| -> String {
		col.map(|c| table.cell(row, c).trim().to_string())
			.unwrap_or_default()
	};

	Ok((0..table.rows.len())
		.map(|i| TeamRecord {
			team: field(i, Some(cols.team)),
			country: field(i, cols.country),
			level: field(i, cols.level),
		})
		.collect())
}
