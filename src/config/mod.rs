use std::path::{Path, PathBuf};

use log::Level;
use serde::Deserialize;
use thiserror::Error;

use crate::ingest::{CandidateSpec, ColumnSpecs};

/// Runtime configuration for the club hub.
///
/// Values are loaded from (in order): `/etc/labamba/hub.json`, `labamba/hub.json`
/// in the user config folders (all optional), environment variables prefixed
/// with `LBF_` (nested keys separated by `__`, e.g. `LBF_SOURCE__MODE`), and
/// finally the flat `LBF_*` overrides handled in [`load`].
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
#[serde(default)]
pub struct Settings {
	pub host: String,
	pub port: u16,
	pub log_level: Level,
	/// Team list polling interval in milliseconds; 0 disables polling.
	pub refresh_ms: u64,
	/// How long the backend keeps a registrations payload before re-reading the sheet.
	pub cache_ttl_secs: u64,
	pub source: SourceSettings,
	pub columns: ColumnSettings,
	pub photos: PhotoSettings,
	pub payments: PaymentSettings,
	/// Origins allowed by the backend. `https://*.example.org` admits any subdomain.
	pub cors_origins: Vec<String>,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_string(),
			port: 8000,
			log_level: Level::Info,
			refresh_ms: 60_000,
			cache_ttl_secs: 30,
			source: SourceSettings::default(),
			columns: ColumnSettings::default(),
			photos: PhotoSettings::default(),
			payments: PaymentSettings::default(),
			cors_origins: vec![
				"https://labambafrisbee.se".to_string(),
				"https://labambafrisbee.netlify.app".to_string(),
				"https://*.netlify.app".to_string(),
				"http://localhost:5173".to_string(),
				"http://localhost:3000".to_string(),
				"http://127.0.0.1:8000".to_string(),
				"http://127.0.0.1:8080".to_string(),
			],
		}
	}
}

/// Which origin the team list is read from.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
	/// Published CSV export of the registration sheet.
	TextExport,
	/// Google Sheets values API with an API key.
	SheetsApi,
	/// The club backend's `/registrations` proxy.
	#[default]
	Backend,
}

impl SourceMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			SourceMode::TextExport => "text_export",
			SourceMode::SheetsApi => "sheets_api",
			SourceMode::Backend => "backend",
		}
	}

	pub fn from_hint(hint: &str) -> Option<Self> {
		match hint.trim().to_lowercase().replace('-', "_").as_str() {
			"text_export" | "csv" => Some(SourceMode::TextExport),
			"sheets_api" | "sheets" | "api" => Some(SourceMode::SheetsApi),
			"backend" | "proxy" => Some(SourceMode::Backend),
			_ => None,
		}
	}
}

/// Connection parameters for every source kind.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
#[serde(default)]
pub struct SourceSettings {
	pub mode: SourceMode,
	pub csv_url: Option<String>,
	pub sheet_id: Option<String>,
	pub api_key: Option<String>,
	pub sheet_range: String,
	pub sheets_base: String,
	/// Host name the site is being served from; decides the API base.
	pub page_host: String,
	pub production_suffixes: Vec<String>,
	pub site_origin: String,
	pub site_base_path: String,
	pub backend_origin: String,
}

impl Default for SourceSettings {
	fn default() -> Self {
		let page_host = hostname::get()
			.ok()
			.and_then(|s| s.into_string().ok())
			.unwrap_or_else(|| "localhost".to_string());

		Self {
			mode: SourceMode::default(),
			csv_url: None,
			sheet_id: None,
			api_key: None,
			sheet_range: "Form Responses 1!A1:Z".to_string(),
			sheets_base: "https://sheets.googleapis.com/v4/spreadsheets".to_string(),
			page_host,
			production_suffixes: vec!["labambafrisbee.se".to_string(), "netlify.app".to_string()],
			site_origin: "https://labambafrisbee.se".to_string(),
			site_base_path: String::new(),
			backend_origin: "http://127.0.0.1:8000".to_string(),
		}
	}
}

/// Where uploaded photos are kept.
///
/// A local `dir` wins over `bucket`; with neither set the photo endpoints
/// answer 500.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
#[serde(default)]
pub struct PhotoSettings {
	pub bucket: Option<String>,
	pub dir: Option<PathBuf>,
	/// Root of the Cloud Storage JSON API.
	pub storage_base: String,
	/// Base of public object URLs. Defaults to `storage_base` for a bucket
	/// and to `http://{host}:{port}/photos` for a local dir.
	pub public_base: Option<String>,
	/// OAuth access token sent as a bearer token to Cloud Storage.
	pub access_token: Option<String>,
	pub max_upload_bytes: usize,
}

impl Default for PhotoSettings {
	fn default() -> Self {
		Self {
			bucket: None,
			dir: None,
			storage_base: "https://storage.googleapis.com".to_string(),
			public_base: None,
			access_token: None,
			max_upload_bytes: 20 * 1024 * 1024,
		}
	}
}

/// Hosted card checkout.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
#[serde(default)]
pub struct PaymentSettings {
	pub stripe_secret_key: Option<String>,
	pub stripe_base: String,
	pub success_url: String,
	pub cancel_url: String,
	/// Line item name when the request carries no description.
	pub default_description: String,
}

impl Default for PaymentSettings {
	fn default() -> Self {
		Self {
			stripe_secret_key: None,
			stripe_base: "https://api.stripe.com".to_string(),
			success_url: "https://labambafrisbee.se/gothrow?paid=1".to_string(),
			cancel_url: "https://labambafrisbee.se/gothrow?canceled=1".to_string(),
			default_description: "Gothrow payment".to_string(),
		}
	}
}

/// Accepted header names and fallback pattern for one logical column.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Default)]
#[serde(default)]
pub struct CandidateSettings {
	pub candidates: Vec<String>,
	pub pattern: String,
}

impl CandidateSettings {
	fn new(candidates: &[&str], pattern: &str) -> Self {
		Self {
			candidates: candidates.iter().map(|c| c.to_string()).collect(),
			pattern: pattern.to_string(),
		}
	}

	pub fn compile(&self) -> Result<CandidateSpec, regex::Error> {
		CandidateSpec::new(&self.candidates, &self.pattern)
	}
}

#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
#[serde(default)]
pub struct ColumnSettings {
	pub team: CandidateSettings,
	pub country: CandidateSettings,
	pub level: CandidateSettings,
}

impl Default for ColumnSettings {
	fn default() -> Self {
		Self {
			team: CandidateSettings::new(
				&["team", "team name", "lagnamn", "lagets namn", "lag", "namn på laget"],
				r"team|lag",
			),
			country: CandidateSettings::new(
				&["country", "land", "nation", "country of origin", "hemland"],
				r"country|land|nation",
			),
			level: CandidateSettings::new(
				&["level", "nivå", "division", "skill level", "spelnivå"],
				r"level|niv|division",
			),
		}
	}
}

impl ColumnSettings {
	pub fn compile(&self) -> Result<ColumnSpecs, SettingsError> {
		Ok(ColumnSpecs {
			team: self.team.compile()?,
			country: self.country.compile()?,
			level: self.level.compile()?,
		})
	}
}

#[derive(Debug, Error)]
pub enum SettingsError {
	#[error("configuration error: {0}")]
	Config(#[from] config::ConfigError),
	#[error("invalid column pattern: {0}")]
	Pattern(#[from] regex::Error),
}

pub fn load() -> Result<Settings, SettingsError> {
	let mut builder = config::Config::builder()
		.add_source(config::File::with_name("/etc/labamba/hub.json").required(false));

	if let Some(folder) = dirs::config_dir() {
		let user_config_path = folder.join("labamba").join("hub.json");
		builder = builder.add_source(config::File::from(user_config_path).required(false));
	}
	if let Some(folder) = dirs::config_local_dir() {
		let local_config_path = folder.join("labamba").join("hub.json");
		builder = builder.add_source(config::File::from(local_config_path).required(false));
	}

	finish(builder)
}

/// Load one explicit config file plus the environment overlay.
pub fn load_from(path: &Path) -> Result<Settings, SettingsError> {
	let builder = config::Config::builder().add_source(config::File::from(path).required(true));
	finish(builder)
}

fn finish(
	builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<Settings, SettingsError> {
	let cfg = builder
		.add_source(config::Environment::with_prefix("LBF").separator("__"))
		.build()?;

	let mut s: Settings = cfg.try_deserialize()?;
	apply_env_overrides(&mut s);

	// Surface bad fallback patterns at startup rather than on the first refresh.
	s.columns.compile()?;

	Ok(s)
}

fn non_empty_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|v| !v.is_empty())
}

// Flat variables mirror the names the club deployment already uses, and the
// `config` crate does not map them onto nested keys.
fn apply_env_overrides(s: &mut Settings) {
	if let Some(h) = non_empty_var("LBF_HOST") {
		s.host = h;
	}
	if let Some(p) = non_empty_var("LBF_PORT").and_then(|p| p.parse::<u16>().ok()) {
		s.port = p;
	}
	if let Some(l) = non_empty_var("LBF_LOG_LEVEL").and_then(|l| l.parse::<Level>().ok()) {
		s.log_level = l;
	}
	if let Some(r) = non_empty_var("LBF_REFRESH_MS").and_then(|r| r.parse::<u64>().ok()) {
		s.refresh_ms = r;
	}
	if let Some(t) = non_empty_var("LBF_CACHE_TTL_SECS").and_then(|t| t.parse::<u64>().ok()) {
		s.cache_ttl_secs = t;
	}
	if let Some(m) = non_empty_var("LBF_SOURCE_MODE").and_then(|m| SourceMode::from_hint(&m)) {
		s.source.mode = m;
	}
	if let Some(u) = non_empty_var("LBF_CSV_URL") {
		s.source.csv_url = Some(u);
	}
	if let Some(id) = non_empty_var("LBF_SHEET_ID") {
		s.source.sheet_id = Some(id);
	}
	if let Some(r) = non_empty_var("LBF_SHEET_RANGE") {
		s.source.sheet_range = r;
	}
	if let Some(k) = non_empty_var("LBF_API_KEY") {
		s.source.api_key = Some(k);
	}
	if let Some(b) = non_empty_var("LBF_PHOTOS_BUCKET") {
		s.photos.bucket = Some(b);
	}
	if let Some(d) = non_empty_var("LBF_PHOTOS_DIR") {
		s.photos.dir = Some(PathBuf::from(d));
	}
	if let Some(t) = non_empty_var("LBF_GCS_TOKEN") {
		s.photos.access_token = Some(t);
	}
	if let Some(k) = non_empty_var("LBF_STRIPE_SECRET_KEY") {
		s.payments.stripe_secret_key = Some(k);
	}
	if let Some(u) = non_empty_var("LBF_CHECKOUT_SUCCESS_URL") {
		s.payments.success_url = u;
	}
	if let Some(u) = non_empty_var("LBF_CHECKOUT_CANCEL_URL") {
		s.payments.cancel_url = u;
	}
}
