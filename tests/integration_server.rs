//! The registrations backend over real HTTP.
#![cfg(feature = "ingest-tests")]

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::Form;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use labamba_hub::config::PaymentSettings;
use labamba_hub::payments::StripeCheckout;
use labamba_hub::photos::DirStore;
use labamba_hub::server::router;
use labamba_hub::site_api::{ApiError, SiteApi};
use labamba_hub::sources::SheetsApiSource;
use labamba_hub::state::{AppState, RegistrationsPayload};
use serde_json::{Value, json};

fn state(sheets_base: &str, sheet_id: Option<&str>, api_key: Option<&str>) -> AppState {
	common::app_state(SheetsApiSource::new(
		reqwest::Client::new(),
		sheets_base,
		sheet_id.map(str::to_string),
		api_key.map(str::to_string),
		"Form Responses 1!A1:Z",
	))
}

fn bare_state() -> AppState {
	state("http://127.0.0.1:1", None, None)
}

fn origins() -> Vec<String> {
	vec![
		"https://labambafrisbee.se".to_string(),
		"https://*.netlify.app".to_string(),
	]
}

#[tokio::test]
async fn health_endpoints() {
	let base = common::spawn_router(router(bare_state(), &origins())).await;
	for path in ["/health", "/api/health"] {
		let body: Value = reqwest::get(format!("{}{}", base, path))
			.await
			.expect("request")
			.json()
			.await
			.expect("json");
		assert_eq!(body["ok"], true, "{}", path);
	}
}

#[tokio::test]
async fn no_sheet_id_answers_empty_list() {
	let base = common::spawn_router(router(bare_state(), &origins())).await;
	let resp = reqwest::get(format!("{}/api/registrations", base))
		.await
		.expect("request");
	assert_eq!(resp.status(), reqwest::StatusCode::OK);
	let payload: RegistrationsPayload = resp.json().await.expect("payload");
	assert_eq!(payload, RegistrationsPayload::default());
}

#[tokio::test]
async fn missing_api_key_is_a_server_error() {
	let base = common::spawn_router(router(
		state("http://127.0.0.1:1", Some("sheet-1"), None),
		&origins(),
	))
	.await;
	let resp = reqwest::get(format!("{}/api/registrations", base))
		.await
		.expect("request");
	assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
	let body: Value = resp.json().await.expect("json");
	assert!(body["detail"].as_str().is_some_and(|d| !d.is_empty()));
}

#[tokio::test]
async fn upstream_failure_is_a_bad_gateway() {
	let upstream = Router::new().route(
		"/v4/spreadsheets/{sheet}/values/{range}",
		get(|| async { (StatusCode::FORBIDDEN, "API key not valid").into_response() }),
	);
	let sheets_base = format!("{}/v4/spreadsheets", common::spawn_router(upstream).await);
	let base = common::spawn_router(router(
		state(&sheets_base, Some("sheet-1"), Some("k")),
		&origins(),
	))
	.await;

	let resp = reqwest::get(format!("{}/api/registrations", base))
		.await
		.expect("request");
	assert_eq!(resp.status(), reqwest::StatusCode::BAD_GATEWAY);
	let body: Value = resp.json().await.expect("json");
	let detail = body["detail"].as_str().expect("detail");
	assert!(detail.starts_with("Sheets fetch failed: "), "{}", detail);
	assert!(!detail.contains("key=k"), "{}", detail);
}

#[tokio::test]
async fn cors_admits_configured_origins_only() {
	let base = common::spawn_router(router(bare_state(), &origins())).await;
	let client = reqwest::Client::new();

	let allowed = client
		.get(format!("{}/api/health", base))
		.header("Origin", "https://preview--labamba.netlify.app")
		.send()
		.await
		.expect("request");
	assert_eq!(
		allowed
			.headers()
			.get("access-control-allow-origin")
			.and_then(|v| v.to_str().ok()),
		Some("https://preview--labamba.netlify.app")
	);

	let denied = client
		.get(format!("{}/api/health", base))
		.header("Origin", "https://example.org")
		.send()
		.await
		.expect("request");
	assert!(denied.headers().get("access-control-allow-origin").is_none());
}

fn status_of(err: ApiError) -> (u16, String) {
	match err {
		ApiError::Status { status, detail } => (status, detail),
		other => panic!("unexpected error {:?}", other),
	}
}

#[tokio::test]
async fn photo_and_checkout_endpoints_report_missing_configuration() {
	let base = common::spawn_router(router(bare_state(), &origins())).await;
	let api = SiteApi::new(reqwest::Client::new(), format!("{}/api", base));

	let (status, detail) = status_of(api.list_photos(10).await.unwrap_err());
	assert_eq!(status, 500);
	assert_eq!(detail, "photo storage not configured");

	let (status, detail) = status_of(
		api.upload_photo("a.jpg", "image/jpeg", vec![1, 2, 3])
			.await
			.unwrap_err(),
	);
	assert_eq!(status, 500);
	assert_eq!(detail, "photo storage not configured");

	let (status, detail) = status_of(api.create_checkout(100, None).await.unwrap_err());
	assert_eq!(status, 500);
	assert_eq!(detail, "Stripe not configured");
}

#[tokio::test]
async fn photos_round_trip_through_a_local_dir() {
	let root = tempfile::tempdir().expect("temp dir");
	let (listener, base) = common::reserve().await;
	let mut state = bare_state();
	state.photos = Some(Arc::new(DirStore::new(
		root.path().to_path_buf(),
		format!("{}/photos", base),
	)));
	common::serve_on(listener, router(state, &origins()));

	let api = SiteApi::new(reqwest::Client::new(), format!("{}/api", base));
	assert!(api.list_photos(10).await.expect("list").is_empty());

	let uploaded = api
		.upload_photo("Final.JPG", "image/jpeg", b"jpeg bytes".to_vec())
		.await
		.expect("upload");
	let url = uploaded.url.expect("url");
	assert!(url.starts_with(&format!("{}/photos/uploads/", base)), "{}", url);
	assert!(url.ends_with(".jpg"), "{}", url);
	assert_eq!(uploaded.key.as_deref().map(|k| url.ends_with(k)), Some(true));

	let served = reqwest::get(&url).await.expect("fetch photo");
	assert_eq!(served.status(), reqwest::StatusCode::OK);
	assert_eq!(served.bytes().await.expect("body").as_ref(), b"jpeg bytes");

	assert_eq!(api.list_photos(10).await.expect("list"), vec![url]);

	// Non-image parts are refused by the backend as well.
	let form = reqwest::multipart::Form::new().part(
		"file",
		reqwest::multipart::Part::bytes(b"hello".to_vec())
			.file_name("notes.txt")
			.mime_str("text/plain")
			.expect("mime"),
	);
	let resp = reqwest::Client::new()
		.post(format!("{}/api/photos", base))
		.multipart(form)
		.send()
		.await
		.expect("request");
	assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
	let body: Value = resp.json().await.expect("json");
	assert_eq!(body["detail"], "Only image uploads allowed");
}

async fn stripe_sessions(Form(form): Form<HashMap<String, String>>) -> impl IntoResponse {
	match form.get("line_items[0][price_data][unit_amount]").map(String::as_str) {
		Some("25000") => Json(json!({ "id": "cs_test_250" })).into_response(),
		_ => (
			StatusCode::BAD_REQUEST,
			Json(json!({ "error": { "message": "Amount must be 25000" } })),
		)
			.into_response(),
	}
}

#[tokio::test]
async fn checkout_goes_through_stripe() {
	let stripe = common::spawn_router(
		Router::new().route("/v1/checkout/sessions", post(stripe_sessions)),
	)
	.await;
	let mut state = bare_state();
	state.payments = Arc::new(StripeCheckout::new(
		reqwest::Client::new(),
		&PaymentSettings {
			stripe_secret_key: Some("sk_test".to_string()),
			stripe_base: stripe,
			..PaymentSettings::default()
		},
	));
	let base = common::spawn_router(router(state, &origins())).await;
	let api = SiteApi::new(reqwest::Client::new(), format!("{}/api", base));

	assert_eq!(
		api.create_checkout(250, Some("Gothrow 2025")).await.expect("session"),
		"cs_test_250"
	);

	let (status, detail) = status_of(api.create_checkout(10, None).await.unwrap_err());
	assert_eq!(status, 502);
	assert_eq!(detail, "Stripe error: Amount must be 25000");
}
