//! Shared fixtures for tests that need an HTTP upstream.

#![cfg(test)]

use axum::Router;

/// Serve `router` on an ephemeral loopback port and return its base URL
/// (`http://127.0.0.1:<port>`, no trailing slash).
pub async fn spawn_router(router: Router) -> String {
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
		.await
		.expect("bind loopback");
	let addr = listener.local_addr().expect("local addr");
	tokio::spawn(async move {
		let _ = axum::serve(listener, router).await;
	});
	format!("http://{}", addr)
}
