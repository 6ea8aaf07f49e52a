//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error response also carries an `HX-Trigger` toast so HTMX requests
//! surface the failure without swapping in the error body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use maison_core::checkout::CheckoutError;
use maison_core::coupon::CouponError;
use maison_core::validation::ValidationErrors;

use crate::contentful::ContentfulError;
use crate::db::RepositoryError;
use crate::htmx::{ToastLevel, toast};
use crate::medusa::MedusaError;
use crate::razorpay::RazorpayError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Commerce backend operation failed.
    #[error("Medusa error: {0}")]
    Medusa(#[from] MedusaError),

    /// CMS operation failed.
    #[error("Contentful error: {0}")]
    Contentful(#[from] ContentfulError),

    /// Payment gateway operation failed.
    #[error("Razorpay error: {0}")]
    Razorpay(#[from] RazorpayError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// One or more form fields are invalid.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Coupon code rejected.
    #[error(transparent)]
    Coupon(#[from] CouponError),

    /// Checkout step transition rejected.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl AppError {
    /// Whether this error is the server's fault and worth reporting.
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Session(_)
                | Self::Medusa(_)
                | Self::Contentful(_)
                | Self::Razorpay(
                    RazorpayError::Http(_) | RazorpayError::Parse(_) | RazorpayError::Api { .. }
                )
        )
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) | Self::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Medusa(MedusaError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Medusa(MedusaError::RateLimited(_)) | Self::RateLimited => {
                StatusCode::TOO_MANY_REQUESTS
            }
            Self::Medusa(_) | Self::Contentful(_) => StatusCode::BAD_GATEWAY,
            Self::Razorpay(RazorpayError::InvalidSignature) => StatusCode::BAD_REQUEST,
            Self::Razorpay(_) => StatusCode::BAD_GATEWAY,
            Self::Validation(_) | Self::Checkout(CheckoutError::Validation(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Coupon(_) | Self::Checkout(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message safe to show the shopper.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) | Self::Session(_) => {
                "Something went wrong on our side. Please try again.".to_string()
            }
            Self::Medusa(MedusaError::NotFound(_)) => "We couldn't find that product.".to_string(),
            Self::Medusa(MedusaError::NoShippingOptions(_)) => {
                "We can't ship to this address yet.".to_string()
            }
            Self::Medusa(MedusaError::CartNotCompleted(_)) => {
                "We couldn't place your order. Please try again.".to_string()
            }
            Self::Medusa(_) | Self::Contentful(_) => {
                "Our store is having trouble right now. Please try again.".to_string()
            }
            Self::Razorpay(RazorpayError::InvalidSignature) => {
                "We couldn't verify your payment. If you were charged, contact support.".to_string()
            }
            Self::Razorpay(_) => "The payment service is unavailable. Please try again.".to_string(),
            Self::Validation(errors) | Self::Checkout(CheckoutError::Validation(errors)) => errors
                .first()
                .unwrap_or("Please check the highlighted fields")
                .to_string(),
            Self::Coupon(err) => err.to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::NotFound(_) => "Page not found".to_string(),
            Self::BadRequest(msg) => msg.clone(),
            Self::RateLimited => "Too many requests. Please wait a moment.".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let status = self.status();
        // Don't expose internal error details to clients
        let message = self.public_message();

        (status, toast(ToastLevel::Error, message.clone()), message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Placed order", Some(&[("order_number", "MSN-1A2B3C4D")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

/// Tag the Sentry scope with the shopper's checkout email.
///
/// There are no accounts, so the email is the only stable identity.
pub fn set_sentry_shopper(email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}
