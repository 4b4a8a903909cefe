//! Shared helpers for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use labamba_hub::config::PaymentSettings;
use labamba_hub::payments::StripeCheckout;
use labamba_hub::sources::SheetsApiSource;
use labamba_hub::state::{AppState, RegistrationsCache};

/// Bind an ephemeral loopback port; returns the listener and its base URL.
pub async fn reserve() -> (tokio::net::TcpListener, String) {
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
		.await
		.expect("bind loopback");
	let addr = listener.local_addr().expect("local addr");
	(listener, format!("http://{}", addr))
}

pub fn serve_on(listener: tokio::net::TcpListener, router: Router) {
	tokio::spawn(async move {
		let _ = axum::serve(listener, router).await;
	});
}

/// Serve `router` on an ephemeral loopback port and return its base URL.
pub async fn spawn_router(router: Router) -> String {
	let (listener, base) = reserve().await;
	serve_on(listener, router);
	base
}

/// Own a `&[&[&str]]` literal as a value grid.
pub fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
	rows.iter()
		.map(|r| r.iter().map(|c| c.to_string()).collect())
		.collect()
}

/// A registration sheet as the signup form exports it: Swedish headers,
/// a duplicate submission and an accented team name.
pub fn signup_grid() -> Vec<Vec<String>> {
	grid(&[
		&["Tidstämpel", "Lagnamn", "Land", "Nivå"],
		&["2024-05-01 10:00", "Zebra", "SE", "Open"],
		&["2024-05-01 10:05", "Älgarna", "SE", "Mixed"],
		&["2024-05-01 10:07", "alpha", "NO", "Open"],
		&["2024-05-02 09:00", "Zebra", "SE", "Open"],
		&["2024-05-02 09:30", "  ", "DK", ""],
	])
}

/// Backend state around `sheets` with no photo storage and no Stripe key.
pub fn app_state(sheets: SheetsApiSource) -> AppState {
	AppState {
		sheets: Arc::new(sheets),
		cache: Arc::new(RegistrationsCache::new(Duration::from_secs(30))),
		photos: None,
		payments: Arc::new(StripeCheckout::new(
			reqwest::Client::new(),
			&PaymentSettings::default(),
		)),
		max_upload_bytes: 1024 * 1024,
	}
}
