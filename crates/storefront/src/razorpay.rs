//! Razorpay payment gateway client.
//!
//! The storefront creates a gateway order server-side, the browser widget
//! collects the payment, and the widget's callback values are verified here
//! with the key secret before the order is completed.

use std::sync::Arc;
use std::time::Duration;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::instrument;

use crate::config::RazorpayConfig;

type HmacSha256 = Hmac<Sha256>;

/// Errors that can occur when talking to Razorpay.
#[derive(Debug, Error)]
pub enum RazorpayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The API rejected the request.
    #[error("Razorpay API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The payment signature did not match.
    #[error("Payment signature verification failed")]
    InvalidSignature,
}

/// A gateway order, the handle the browser widget pays against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    /// Amount in minor units (paise).
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    notes: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    description: String,
}

/// Client for the Razorpay Orders API.
#[derive(Clone)]
pub struct RazorpayClient {
    inner: Arc<RazorpayClientInner>,
}

struct RazorpayClientInner {
    client: reqwest::Client,
    api_url: String,
    key_id: String,
    key_secret: SecretString,
}

impl RazorpayClient {
    #[must_use]
    pub fn new(config: &RazorpayConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();

        Self {
            inner: Arc::new(RazorpayClientInner {
                client,
                api_url: config.api_url.clone(),
                key_id: config.key_id.clone(),
                key_secret: config.key_secret.clone(),
            }),
        }
    }

    /// Public key id handed to the checkout widget.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.inner.key_id
    }

    /// Create a gateway order for `amount_paise`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or is rejected.
    #[instrument(skip(self, notes))]
    pub async fn create_order(
        &self,
        amount_paise: i64,
        currency: &str,
        receipt: &str,
        notes: &serde_json::Value,
    ) -> Result<RazorpayOrder, RazorpayError> {
        let body = CreateOrderBody {
            amount: amount_paise,
            currency,
            receipt,
            notes,
        };

        let response = self
            .inner
            .client
            .post(format!("{}/v1/orders", self.inner.api_url))
            .basic_auth(
                &self.inner.key_id,
                Some(self.inner.key_secret.expose_secret()),
            )
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&response_text)
                .map(|e| e.error.description)
                .unwrap_or_else(|_| response_text.chars().take(200).collect());
            tracing::error!(status = %status, message = %message, "Razorpay order creation failed");
            return Err(RazorpayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&response_text)?)
    }

    /// Verify the signature the widget returns after a successful payment.
    ///
    /// The signature is the hex HMAC-SHA256 of `"{order_id}|{payment_id}"`
    /// keyed with the key secret. Comparison is constant-time.
    ///
    /// # Errors
    ///
    /// Returns `RazorpayError::InvalidSignature` if the signature does not match.
    pub fn verify_payment_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<(), RazorpayError> {
        verify_signature(
            self.inner.key_secret.expose_secret(),
            order_id,
            payment_id,
            signature,
        )
    }
}

fn verify_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> Result<(), RazorpayError> {
    let expected = hex::decode(signature.trim()).map_err(|_| RazorpayError::InvalidSignature)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| RazorpayError::InvalidSignature)?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());

    mac.verify_slice(&expected)
        .map_err(|_| RazorpayError::InvalidSignature)
}

/// Compute a signature the way the gateway does. Used by tests.
#[must_use]
pub fn sign_payment(secret: &str, order_id: &str, payment_id: &str) -> String {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_signature() {
        let signature = sign_payment("rzp_secret", "order_ABC", "pay_XYZ");
        assert_eq!(signature.len(), 64);
        assert!(verify_signature("rzp_secret", "order_ABC", "pay_XYZ", &signature).is_ok());
    }

    #[test]
    fn test_signature_is_bound_to_ids_and_secret() {
        let signature = sign_payment("rzp_secret", "order_ABC", "pay_XYZ");
        assert!(verify_signature("rzp_secret", "order_ABC", "pay_OTHER", &signature).is_err());
        assert!(verify_signature("rzp_secret", "order_OTHER", "pay_XYZ", &signature).is_err());
        assert!(verify_signature("other_secret", "order_ABC", "pay_XYZ", &signature).is_err());
    }

    #[test]
    fn test_malformed_signature() {
        assert!(matches!(
            verify_signature("rzp_secret", "order_ABC", "pay_XYZ", "not-hex"),
            Err(RazorpayError::InvalidSignature)
        ));
        assert!(verify_signature("rzp_secret", "order_ABC", "pay_XYZ", "").is_err());
    }

    #[test]
    fn test_known_vector() {
        // HMAC-SHA256(key="key", "The quick brown fox jumps over the lazy dog")
        let mut mac = HmacSha256::new_from_slice(b"key").unwrap();
        mac.update(b"The quick brown fox jumps over the lazy dog");
        assert_eq!(
            hex::encode(mac.finalize().into_bytes()),
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }
}
