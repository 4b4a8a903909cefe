//! `GET`/`POST /api/photos`.

use axum::extract::multipart::Field;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;

use super::detail;
use crate::photos::{PhotoStore, UPLOAD_PREFIX, upload_key};
use crate::state::AppState;

const NOT_CONFIGURED: &str = "photo storage not configured";
const MAX_LIST: usize = 500;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
	#[serde(default = "default_limit")]
	pub limit: usize,
}

fn default_limit() -> usize {
	60
}

pub async fn list_photos(State(state): State<AppState>, Query(q): Query<ListQuery>) -> Response {
	let Some(store) = state.photos else {
		return detail(StatusCode::INTERNAL_SERVER_ERROR, NOT_CONFIGURED);
	};

	match store.list(UPLOAD_PREFIX, q.limit.min(MAX_LIST)).await {
		Ok(photos) => Json(json!({ "ok": true, "photos": photos })).into_response(),
		Err(e) => {
			warn!("photo listing from {} failed: {}", store.name(), e);
			detail(StatusCode::INTERNAL_SERVER_ERROR, format!("List failed: {}", e))
		}
	}
}

/// Multipart upload of field `file`; only `image/*` parts are stored.
pub async fn upload_photo(State(state): State<AppState>, mut multipart: Multipart) -> Response {
	let Some(store) = state.photos else {
		return detail(StatusCode::INTERNAL_SERVER_ERROR, NOT_CONFIGURED);
	};

	loop {
		let field = match multipart.next_field().await {
			Ok(Some(field)) => field,
			Ok(None) => return detail(StatusCode::BAD_REQUEST, "missing file field"),
			Err(e) => return detail(e.status(), format!("invalid upload: {}", e.body_text())),
		};
		if field.name() == Some("file") {
			return store_upload(store.as_ref(), field).await;
		}
	}
}

async fn store_upload(store: &dyn PhotoStore, field: Field<'_>) -> Response {
	let content_type = field.content_type().unwrap_or_default().to_string();
	if !content_type.starts_with("image/") {
		return detail(StatusCode::BAD_REQUEST, "Only image uploads allowed");
	}
	let key = upload_key(field.file_name().unwrap_or_default(), Utc::now());
	let bytes = match field.bytes().await {
		Ok(b) => b,
		Err(e) => return detail(e.status(), format!("invalid upload: {}", e.body_text())),
	};

	match store.put(&key, &content_type, bytes.to_vec()).await {
		Ok(url) => {
			info!("stored photo {} ({} bytes) in {}", key, bytes.len(), store.name());
			Json(json!({ "ok": true, "url": url, "key": key })).into_response()
		}
		Err(e) => {
			warn!("photo upload to {} failed: {}", store.name(), e);
			detail(StatusCode::INTERNAL_SERVER_ERROR, format!("Upload failed: {}", e))
		}
	}
}
