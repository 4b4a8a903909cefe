pub mod detect;
pub mod error;
pub mod headers;
pub mod parsers;
pub mod projector;
pub mod reduce;
pub mod table;

pub use detect::{CandidateSpec, detect_column};
pub use error::IngestError;
pub use headers::{normalize_header, simplified_key};
pub use parsers::parse_csv;
pub use projector::{ColumnMap, ColumnSpecs, TeamRecord, project};
pub use reduce::reduce;
pub use table::RawTable;

/// Project a fetched table and reduce it to the sorted team list.
pub fn ingest(table: &RawTable, specs: &ColumnSpecs) -> Result<Vec<TeamRecord>, IngestError> {
	project(table, specs).map(reduce)
}
