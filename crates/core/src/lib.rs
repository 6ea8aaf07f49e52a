//! Maison Core - Domain types and checkout logic.
//!
//! This crate provides the types and rules shared by the storefront:
//! - `storefront` - Public-facing e-commerce site
//! - `cli` - Command-line tools for migrations
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Everything here is deterministic and can be
//! exercised directly from unit tests.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, and statuses
//! - [`cart`] - Cart line items and merge/update semantics
//! - [`ledger`] - The saved-items list ("Ledger")
//! - [`coupon`] - Static coupon table and code lookup
//! - [`pricing`] - Subtotal, discount, shipping, tax, and total calculation
//! - [`address`] - Saved shipping addresses
//! - [`checkout`] - The Shipping → Payment → Review step machine
//! - [`validation`] - Field-level form validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod address;
pub mod cart;
pub mod checkout;
pub mod coupon;
pub mod ledger;
pub mod pricing;
pub mod types;
pub mod validation;

pub use types::*;
