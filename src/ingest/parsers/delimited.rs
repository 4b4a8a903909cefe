use std::mem::take;

/// Parse comma-separated text into rows of fields.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
	parse_delimited(text, ',')
}

/// Single-pass scanner for delimited text as produced by spreadsheet exports.
///
/// - `"` opens a quoted section; inside it `""` is a literal quote and the
///   separator and newlines are ordinary content.
/// - `\r` is dropped wherever it appears, so CRLF and LF both end a row.
/// - The last field and row are flushed without a trailing newline.
/// - Trailing rows whose fields are all empty are dropped; empty rows in the
///   middle of the input are kept. Empty input yields no rows.
pub fn parse_delimited(text: &str, sep: char) -> Vec<Vec<String>> {
	let mut rows = Vec::new();
	let mut row = Vec::new();
	let mut field = String::new();
	let mut in_quotes = false;
	let mut chars = text.chars().peekable();

	while let Some(ch) = chars.next() {
		match ch {
			'\r' => {}
			'"' if in_quotes => {
				if chars.peek() == Some(&'"') {
					chars.next();
					field.push('"');
				} else {
					in_quotes = false;
				}
			}
			'"' => in_quotes = true,
			c if in_quotes => field.push(c),
			c if c == sep => row.push(take(&mut field)),
			'\n' => {
				row.push(take(&mut field));
				rows.push(take(&mut row));
			}
			c => field.push(c),
		}
	}

	row.push(field);
	rows.push(row);

	while rows
		.last()
		.is_some_and(|r| r.iter().all(|f| f.is_empty()))
	{
		rows.pop();
	}

	rows
}
