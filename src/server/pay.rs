//! `POST /api/pay/checkout`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::warn;
use serde::Deserialize;
use serde_json::json;

use super::detail;
use crate::payments::PaymentError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
	pub amount_sek: u32,
	#[serde(default)]
	pub description: Option<String>,
}

pub async fn create_checkout(
	State(state): State<AppState>,
	Json(body): Json<CheckoutRequest>,
) -> Response {
	match state
		.payments
		.create_session(body.amount_sek, body.description.as_deref())
		.await
	{
		Ok(id) => Json(json!({ "sessionId": id })).into_response(),
		Err(PaymentError::NotConfigured) => {
			detail(StatusCode::INTERNAL_SERVER_ERROR, PaymentError::NotConfigured.to_string())
		}
		Err(PaymentError::Invalid(msg)) => detail(StatusCode::BAD_REQUEST, msg),
		Err(PaymentError::Upstream(msg)) => {
			warn!("checkout session failed: {}", msg);
			detail(StatusCode::BAD_GATEWAY, format!("Stripe error: {}", msg))
		}
	}
}
