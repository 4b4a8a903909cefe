use serde::{Deserialize, Serialize};

/// Header row plus data rows as yielded by a table source.
///
/// Rows may be shorter (or longer) than `headers`; missing trailing cells
/// read as the empty string through [`RawTable::cell`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
	#[serde(default)]
	pub headers: Vec<String>,
	#[serde(default)]
	pub rows: Vec<Vec<String>>,
}

impl RawTable {
	pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
		Self { headers, rows }
	}

	/// Split a grid whose first row is the header row.
	pub fn from_grid(mut grid: Vec<Vec<String>>) -> Self {
		if grid.is_empty() {
			return Self::default();
		}
		let headers = grid.remove(0);
		Self {
			headers,
			rows: grid,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.headers.is_empty() && self.rows.is_empty()
	}

	/// Cell at `col` of data row `row`, or `""` when either is out of range.
	pub fn cell(&self, row: usize, col: usize) -> &str {
		self.rows
			.get(row)
			.and_then(|r| r.get(col))
			.map(String::as_str)
			.unwrap_or("")
	}
}

/// Render a JSON cell as text. Sheets and the backend normally send strings,
/// but numbers and booleans slip through when a column is formatted.
pub fn cell_text(v: &serde_json::Value) -> String {
	match v {
		serde_json::Value::String(s) => s.clone(),
		serde_json::Value::Null => String::new(),
		other => other.to_string(),
	}
}

pub fn grid_text(values: &[Vec<serde_json::Value>]) -> Vec<Vec<String>> {
	values
		.iter()
		.map(|row| row.iter().map(cell_text).collect())
		.collect()
}
