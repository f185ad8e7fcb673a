//! Core types for Marketfront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod countdown;
pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use countdown::{Countdown, TimeRemaining};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{
    CurrencyCode, Price, PriceFormat, discount_percentage, format_discount_percentage,
    format_price, parse_price_from_formatted,
};
pub use status::*;
