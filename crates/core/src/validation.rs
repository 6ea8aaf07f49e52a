//! Field-level form validation.
//!
//! Checkout forms are flat records; each field is validated on its own and
//! failures are collected into [`ValidationErrors`] so the page can show every
//! message inline at once.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::types::Email;

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("Invalid regex"));

static PINCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{6}$").expect("Invalid regex"));

/// Validation failures keyed by form field name, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<(&'static str, String)>,
}

impl ValidationErrors {
    /// Create an empty error set.
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record a failure for `field`. A field keeps only its first message.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        if self.get(field).is_none() {
            self.errors.push((field, message.into()));
        }
    }

    /// Record the outcome of a validator for `field`.
    pub fn check(&mut self, field: &'static str, result: Result<(), String>) {
        if let Err(message) = result {
            self.add(field, message);
        }
    }

    /// Message for `field`, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, message)| message.as_str())
    }

    /// The first failure, used for toast notifications.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.errors.first().map(|(_, message)| message.as_str())
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over `(field, message)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.errors
            .iter()
            .map(|(field, message)| (*field, message.as_str()))
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns the collected errors if any field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for ValidationErrors {}

/// Non-blank after trimming.
///
/// # Errors
///
/// Returns `"{label} is required"` for blank input.
pub fn required(value: &str, label: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{label} is required"))
    } else {
        Ok(())
    }
}

/// Shaped like `local@domain.tld`.
///
/// # Errors
///
/// Returns the [`Email`] parse error message.
pub fn email(value: &str) -> Result<(), String> {
    Email::parse(value).map(|_| ()).map_err(|e| e.to_string())
}

/// Exactly ten digits.
///
/// # Errors
///
/// Returns a message when the trimmed input is not ten ASCII digits.
pub fn phone(value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("Phone number is required".to_string());
    }
    if PHONE_RE.is_match(value) {
        Ok(())
    } else {
        Err("Please enter a valid 10-digit phone number".to_string())
    }
}

/// Exactly six digits.
///
/// # Errors
///
/// Returns a message when the trimmed input is not six ASCII digits.
pub fn pincode(value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("Pincode is required".to_string());
    }
    if PINCODE_RE.is_match(value) {
        Ok(())
    } else {
        Err("Please enter a valid 6-digit pincode".to_string())
    }
}
