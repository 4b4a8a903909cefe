//! Comparison keys for raw column headers.
//!
//! Registration sheets are edited by hand and exported through several
//! tools, so the same column shows up as `"Team "`, `"\u{feff}Team"` or
//! `"Nivå"` vs `"Niva"`. Two keys are derived from a raw header:
//!
//! - the *normalized* form: invisible characters removed, non-breaking
//!   spaces turned into spaces, trimmed and lowercased;
//! - the *simplified* key: the normalized form decomposed (NFD), stripped
//!   of combining marks, and reduced to ASCII lowercase letters and digits.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Zero-width space/joiners, word joiner and the byte-order mark.
fn is_invisible(c: char) -> bool {
	matches!(
		c,
		'\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}'
	)
}

/// Normalize a raw header for exact comparison.
///
/// Absent cells are passed in as `""` and come back as `""`.
///
/// ```
/// use labamba_hub::ingest::headers::normalize_header;
///
/// assert_eq!(normalize_header("\u{feff} Team\u{a0}Name "), "team name");
/// ```
pub fn normalize_header(raw: &str) -> String {
	let visible: String = raw
		.chars()
		.filter(|c| !is_invisible(*c))
		.map(|c| if c == '\u{00A0}' { ' ' } else { c })
		.collect();
	visible.trim().to_lowercase()
}

/// Accent-insensitive, alphanumeric-only key used for fuzzy header matching.
///
/// ```
/// use labamba_hub::ingest::headers::simplified_key;
///
/// assert_eq!(simplified_key("Nivå"), simplified_key("niva"));
/// assert_eq!(simplified_key("Team-Name"), "teamname");
/// ```
pub fn simplified_key(raw: &str) -> String {
	normalize_header(raw)
		.nfd()
		.filter(|c| !is_combining_mark(*c))
		.filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
		.collect()
}
