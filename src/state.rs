use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::Settings;
use crate::payments::StripeCheckout;
use crate::photos::{self, PhotoStore};
use crate::sources::SheetsApiSource;

/// Body of `GET /api/registrations`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationsPayload {
	pub headers: Vec<String>,
	pub rows: Vec<Vec<String>>,
	pub count: usize,
}

impl RegistrationsPayload {
	/// Split a sheet value grid; the first row is the header row.
	pub fn from_values(mut values: Vec<Vec<String>>) -> Self {
		if values.is_empty() {
			return Self::default();
		}
		let headers = values.remove(0);
		Self {
			count: values.len(),
			headers,
			rows: values,
		}
	}
}

/// Single-slot TTL cache for the registrations payload.
pub struct RegistrationsCache {
	ttl: Duration,
	slot: Mutex<Option<(Instant, RegistrationsPayload)>>,
}

impl RegistrationsCache {
	pub fn new(ttl: Duration) -> Self {
		Self {
			ttl,
			slot: Mutex::new(None),
		}
	}

	pub async fn get(&self) -> Option<RegistrationsPayload> {
		let slot = self.slot.lock().await;
		match &*slot {
			Some((at, payload)) if at.elapsed() < self.ttl => Some(payload.clone()),
			_ => None,
		}
	}

	pub async fn put(&self, payload: RegistrationsPayload) {
		*self.slot.lock().await = Some((Instant::now(), payload));
	}
}

/// Application state passed to handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
	pub sheets: Arc<SheetsApiSource>,
	pub cache: Arc<RegistrationsCache>,
	/// `None` when no photo storage is configured.
	pub photos: Option<Arc<dyn PhotoStore>>,
	pub payments: Arc<StripeCheckout>,
	pub max_upload_bytes: usize,
}

impl AppState {
	pub fn from_settings(settings: &Settings, client: reqwest::Client) -> Self {
		Self {
			sheets: Arc::new(SheetsApiSource::from_settings(client.clone(), &settings.source)),
			cache: Arc::new(RegistrationsCache::new(Duration::from_secs(
				settings.cache_ttl_secs,
			))),
			photos: photos::from_settings(settings, client.clone()),
			payments: Arc::new(StripeCheckout::new(client, &settings.payments)),
			max_upload_bytes: settings.photos.max_upload_bytes,
		}
	}
}
