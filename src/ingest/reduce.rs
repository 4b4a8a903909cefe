use std::collections::HashSet;

use deunicode::deunicode;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use super::projector::TeamRecord;

/// Drop blank teams, keep the first record per case-insensitive team name,
/// and sort by team name ignoring case and accents.
///
/// Sorting is stable, so names that compare equal at the base-letter level
/// keep their first-seen order.
pub fn reduce(records: impl IntoIterator<Item = TeamRecord>) -> Vec<TeamRecord> {
	let mut seen = HashSet::new();
	let mut kept: Vec<TeamRecord> = records
		.into_iter()
		.filter(|r| !r.team.trim().is_empty())
		.filter(|r| seen.insert(r.key()))
		.collect();

	kept.sort_by_cached_key(|r| collation_key(&r.team));
	kept
}

/// Primary-strength sort key: base letters only, lowercased.
///
/// Marks are stripped after NFD; letters that do not decompose (`Ø`, `Æ`,
/// `Ł`, `ß`) are then transliterated, so `Ørnene` sorts with `o` and
/// `Æbleskiver` with `ae`.
pub fn collation_key(s: &str) -> String {
	let bare: String = s
		.trim()
		.nfd()
		.filter(|c| !is_combining_mark(*c))
		.collect();
	deunicode(&bare).to_lowercase()
}
