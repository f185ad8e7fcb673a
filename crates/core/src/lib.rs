//! Marketfront Core - Shared types library.
//!
//! This crate provides the types and pure transforms used by the storefront:
//! - typed IDs for backend entities
//! - price formatting/parsing and discount percentages
//! - backend error-message heuristics (stock errors, unavailable variants)
//! - countdown arithmetic and date formatting
//!
//! # Architecture
//!
//! The core crate contains only types and functions - no I/O, no HTTP
//! clients. Everything here can be unit tested without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, statuses, countdowns
//! - [`messages`] - Translation of known backend error messages
//! - [`format`] - Date formatting for templates

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod format;
pub mod messages;
pub mod types;

pub use messages::{StockError, friendly_error_message, parse_stock_error};
pub use types::*;
