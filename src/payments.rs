//! Hosted card checkout sessions through Stripe's form-encoded REST API.

use log::{debug, info};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::config::PaymentSettings;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
	#[error("Stripe not configured")]
	NotConfigured,

	#[error("{0}")]
	Invalid(String),

	#[error("{0}")]
	Upstream(String),
}

#[derive(Debug, Deserialize)]
struct SessionBody {
	id: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
	error: Option<StripeErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
	message: Option<String>,
}

/// SEK to öre, the smallest currency unit Stripe bills in.
pub fn ore(amount_sek: u32) -> u64 {
	u64::from(amount_sek) * 100
}

pub struct StripeCheckout {
	client: Client,
	base: String,
	secret_key: Option<String>,
	success_url: String,
	cancel_url: String,
	default_description: String,
}

impl StripeCheckout {
	pub fn new(client: Client, settings: &PaymentSettings) -> Self {
		Self {
			client,
			base: settings.stripe_base.trim_end_matches('/').to_string(),
			secret_key: settings
				.stripe_secret_key
				.clone()
				.filter(|k| !k.trim().is_empty()),
			success_url: settings.success_url.clone(),
			cancel_url: settings.cancel_url.clone(),
			default_description: settings.default_description.clone(),
		}
	}

	pub fn is_configured(&self) -> bool {
		self.secret_key.is_some()
	}

	/// Create a one-line-item payment session and return its id.
	pub async fn create_session(
		&self,
		amount_sek: u32,
		description: Option<&str>,
	) -> Result<String, PaymentError> {
		let key = self.secret_key.as_deref().ok_or(PaymentError::NotConfigured)?;
		if amount_sek == 0 {
			return Err(PaymentError::Invalid("amount_sek must be positive".to_string()));
		}

		let name = description
			.map(str::trim)
			.filter(|d| !d.is_empty())
			.unwrap_or(self.default_description.as_str());
		let form = [
			("mode", "payment".to_string()),
			("payment_method_types[0]", "card".to_string()),
			("line_items[0][price_data][currency]", "sek".to_string()),
			("line_items[0][price_data][product_data][name]", name.to_string()),
			("line_items[0][price_data][unit_amount]", ore(amount_sek).to_string()),
			("line_items[0][quantity]", "1".to_string()),
			("success_url", self.success_url.clone()),
			("cancel_url", self.cancel_url.clone()),
		];
		debug!("creating checkout session for {} SEK", amount_sek);

		let resp = self
			.client
			.post(format!("{}/v1/checkout/sessions", self.base))
			.bearer_auth(key)
			.form(&form)
			.send()
			.await
			.map_err(|e| PaymentError::Upstream(e.without_url().to_string()))?;

		let status = resp.status();
		if !status.is_success() {
			let message = resp
				.json::<StripeErrorBody>()
				.await
				.ok()
				.and_then(|b| b.error)
				.and_then(|e| e.message)
				.unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
			return Err(PaymentError::Upstream(message));
		}

		let session: SessionBody = resp
			.json()
			.await
			.map_err(|e| PaymentError::Upstream(format!("unexpected response: {}", e.without_url())))?;
		info!("checkout session {} created", session.id);
		Ok(session.id)
	}
}
