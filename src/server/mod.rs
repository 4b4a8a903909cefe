//! The club backend.
//!
//! Serves the sheet behind `/api/registrations` so the public site never
//! needs the Sheets API key, with a short in-memory cache in front of it,
//! plus the photo gallery and checkout endpoints.

mod pay;
mod photos;

use anyhow::Context;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, Method, StatusCode, request::Parts};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{debug, info, warn};
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::config::Settings;
use crate::health::health;
use crate::ingest::IngestError;
use crate::sources::http_client;
use crate::state::{AppState, RegistrationsPayload};

pub use pay::create_checkout;
pub use photos::{list_photos, upload_photo};

pub fn router(state: AppState, cors_origins: &[String]) -> Router {
	let mut app = Router::new()
		.route("/health", get(health))
		.route("/api/health", get(health))
		.route("/api/registrations", get(registrations))
		.route(
			"/api/photos",
			get(list_photos)
				.post(upload_photo)
				.layer(DefaultBodyLimit::max(state.max_upload_bytes)),
		)
		.route("/api/pay/checkout", post(create_checkout));

	// Locally stored photos are served by the backend itself.
	if let Some(root) = state.photos.as_ref().and_then(|p| p.local_root()) {
		app = app.nest_service("/photos", ServeDir::new(root));
	}

	app.layer(cors_layer(cors_origins)).with_state(state)
}

/// `{ "detail": msg }` with `status`, the error shape every endpoint uses.
pub(crate) fn detail(status: StatusCode, msg: impl Into<String>) -> Response {
	(status, Json(json!({ "detail": msg.into() }))).into_response()
}

/// `GET /api/registrations`: `{ headers, rows, count }` from the sheet.
pub async fn registrations(State(state): State<AppState>) -> Response {
	if !state.sheets.has_sheet_id() {
		return Json(RegistrationsPayload::default()).into_response();
	}

	if let Some(hit) = state.cache.get().await {
		debug!("registrations served from cache");
		return Json(hit).into_response();
	}

	match state.sheets.fetch_values().await {
		Ok(values) => {
			let payload = RegistrationsPayload::from_values(values);
			info!("registrations refreshed from sheet: {} rows", payload.count);
			state.cache.put(payload.clone()).await;
			Json(payload).into_response()
		}
		Err(IngestError::Config(msg)) => {
			warn!("registrations unavailable: {}", msg);
			detail(StatusCode::INTERNAL_SERVER_ERROR, msg)
		}
		Err(e) => {
			warn!("Sheets fetch failed: {}", e);
			detail(StatusCode::BAD_GATEWAY, format!("Sheets fetch failed: {}", e))
		}
	}
}

/// Whether `origin` is allowed. Entries of the form `https://*.example.org`
/// admit any subdomain of `example.org` over that scheme.
pub fn origin_allowed(origin: &str, allowed: &[String]) -> bool {
	allowed.iter().any(|a| match a.split_once("*.") {
		Some((scheme, suffix)) => origin
			.strip_prefix(scheme)
			.and_then(|host| host.strip_suffix(suffix))
			.and_then(|sub| sub.strip_suffix('.'))
			.is_some_and(|sub| !sub.is_empty() && !sub.contains('/')),
		None => a == origin,
	})
}

fn cors_layer(origins: &[String]) -> CorsLayer {
	let allowed = origins.to_vec();
	CorsLayer::new()
		.allow_methods([Method::GET, Method::POST, Method::OPTIONS])
		.allow_headers(Any)
		.allow_origin(AllowOrigin::predicate(
			move |origin: &HeaderValue, _parts: &Parts| {
				origin
					.to_str()
					.map(|o| origin_allowed(o, &allowed))
					.unwrap_or(false)
			},
		))
}

/// Bind and serve until Ctrl-C.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
	let client = http_client()?;
	let state = AppState::from_settings(&settings, client);
	if !state.sheets.has_sheet_id() {
		warn!("no sheet id configured; /api/registrations will answer an empty list");
	}
	match &state.photos {
		Some(store) => info!("photo storage: {}", store.name()),
		None => warn!("no photo storage configured; /api/photos will answer 500"),
	}
	if !state.payments.is_configured() {
		warn!("no Stripe key configured; /api/pay/checkout will answer 500");
	}

	let app = router(state, &settings.cors_origins);
	let addr = format!("{}:{}", settings.host, settings.port);
	let listener = tokio::net::TcpListener::bind(&addr)
		.await
		.with_context(|| format!("failed to bind {}", addr))?;

	info!("registrations backend listening on http://{}", addr);
	axum::serve(listener, app)
		.with_graceful_shutdown(async {
			let _ = tokio::signal::ctrl_c().await;
			info!("shutting down");
		})
		.await
		.context("server error")?;
	Ok(())
}
