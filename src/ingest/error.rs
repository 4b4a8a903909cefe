use thiserror::Error;

/// Failure of one ingestion cycle.
///
/// The `Display` text is what the team board shows as its status line, so
/// messages are written for club members rather than operators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngestError {
	/// Required configuration for the selected source is missing.
	#[error("{0}")]
	Config(String),

	/// Transport failure or a non-success HTTP status.
	#[error("{0}")]
	Fetch(String),

	/// The body was not the expected structure, or the team column is missing.
	#[error("{0}")]
	Format(String),
}

impl IngestError {
	pub fn missing_team_column() -> Self {
		IngestError::Format("missing Team column".to_string())
	}

	pub fn kind(&self) -> &'static str {
		match self {
			IngestError::Config(_) => "config",
			IngestError::Fetch(_) => "fetch",
			IngestError::Format(_) => "format",
		}
	}
}
