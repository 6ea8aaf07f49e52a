//! HTMX response helpers.
//!
//! Handlers announce state changes (`cart-updated`, `ledger-updated`) and
//! toast notifications through the `HX-Trigger` response header. The page
//! script listens for `showToast` and renders the message.

use std::convert::Infallible;

use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponseParts, ResponseParts};
use serde::Serialize;
use serde_json::{Map, Value};

/// Response header carrying client-side events.
pub const HX_TRIGGER: HeaderName = HeaderName::from_static("hx-trigger");

/// Response header asking HTMX to perform a full-page navigation.
pub const HX_REDIRECT: HeaderName = HeaderName::from_static("hx-redirect");

/// Event fired after the session cart changes.
pub const CART_UPDATED: &str = "cart-updated";

/// Event fired after the Ledger changes.
pub const LEDGER_UPDATED: &str = "ledger-updated";

/// Severity of a toast notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Info,
    Error,
}

/// A set of events for the `HX-Trigger` header.
///
/// ```rust,ignore
/// (Triggers::new().event(CART_UPDATED).toast(ToastLevel::Success, "Added to bag"), fragment)
/// ```
#[derive(Debug, Clone, Default)]
pub struct Triggers {
    events: Map<String, Value>,
}

impl Triggers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bare event.
    #[must_use]
    pub fn event(mut self, name: &str) -> Self {
        self.events.insert(name.to_string(), Value::Null);
        self
    }

    /// Add a toast. A later toast replaces an earlier one.
    #[must_use]
    pub fn toast(mut self, level: ToastLevel, message: impl Into<String>) -> Self {
        self.events.insert(
            "showToast".to_string(),
            serde_json::json!({ "level": level, "message": message.into() }),
        );
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Encode as a header value. Non-ASCII text is `\u` escaped because
    /// browsers decode header bytes as Latin-1.
    #[must_use]
    pub fn header_value(&self) -> Option<HeaderValue> {
        if self.events.is_empty() {
            return None;
        }
        let json = Value::Object(self.events.clone()).to_string();
        HeaderValue::from_str(&escape_non_ascii(&json)).ok()
    }
}

impl IntoResponseParts for Triggers {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if let Some(value) = self.header_value() {
            res.headers_mut().insert(HX_TRIGGER, value);
        }
        Ok(res)
    }
}

/// Shorthand for a single toast.
#[must_use]
pub fn toast(level: ToastLevel, message: impl Into<String>) -> Triggers {
    Triggers::new().toast(level, message)
}

fn escape_non_ascii(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for ch in json.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}
