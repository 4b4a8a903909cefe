use regex::{Regex, RegexBuilder};

use super::headers::{normalize_header, simplified_key};

/// Ranked header names for one logical column plus a free-text fallback.
///
/// Candidates are kept pre-normalized; the fallback pattern is compiled
/// case-insensitive.
#[derive(Debug, Clone)]
pub struct CandidateSpec {
	candidates: Vec<String>,
	simplified: Vec<String>,
	fallback: Regex,
}

impl CandidateSpec {
	pub fn new<I, S>(candidates: I, fallback_pattern: &str) -> Result<Self, regex::Error>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let candidates: Vec<String> = candidates
			.into_iter()
			.map(|c| normalize_header(c.as_ref()))
			.collect();
		let simplified = candidates.iter().map(|c| simplified_key(c)).collect();
		let fallback = RegexBuilder::new(fallback_pattern)
			.case_insensitive(true)
			.build()?;
		Ok(Self {
			candidates,
			simplified,
			fallback,
		})
	}

	pub fn candidates(&self) -> &[String] {
		&self.candidates
	}

	pub fn fallback(&self) -> &Regex {
		&self.fallback
	}
}

/// Locate the column for `spec` among raw `headers`.
///
/// Tried in order, first hit wins:
/// 1. exact normalized match, candidate priority outer, header order inner
/// 2. the same over simplified keys
/// 3. fallback pattern over normalized headers
/// 4. fallback pattern over simplified keys
pub fn detect_column<S: AsRef<str>>(headers: &[S], spec: &CandidateSpec) -> Option<usize> {
	let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h.as_ref())).collect();
	let simplified: Vec<String> = headers.iter().map(|h| simplified_key(h.as_ref())).collect();

	first_by_priority(&normalized, &spec.candidates)
		.or_else(|| first_by_priority(&simplified, &spec.simplified))
		.or_else(|| normalized.iter().position(|h| spec.fallback.is_match(h)))
		.or_else(|| simplified.iter().position(|h| spec.fallback.is_match(h)))
}

fn first_by_priority(headers: &[String], candidates: &[String]) -> Option<usize> {
	candidates
		.iter()
		.filter(|c| !c.is_empty())
		.find_map(|c| headers.iter().position(|h| h == c))
}
