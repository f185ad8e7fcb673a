//! Translation of backend error messages into customer-facing text.
//!
//! The backend reports failures as free-form English strings. A few of them
//! are common enough at checkout to deserve a friendlier rendering; the rest
//! collapse into a generic message so raw backend text never reaches a page.

use std::sync::LazyLock;

use regex::Regex;

/// Message shown when nothing more specific is known.
pub const GENERIC_ERROR: &str = "Something went wrong. Please try again.";

/// Message shown for stock failures that do not name a variant.
pub const GENERIC_STOCK_ERROR: &str = "Some items in your cart are out of stock.";

#[allow(clippy::expect_used)]
static STOCK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)insufficient stock for (?:product )?variant\s*"?(?P<variant>[^"]+?)"?\s*[:.,]\s*(?:only\s+)?available:?\s*(?P<available>\d+)"#,
    )
    .expect("stock error pattern is valid")
});

#[allow(clippy::expect_used)]
static UNAVAILABLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)product variant is not available:\s*(?P<variant>.+)")
        .expect("unavailable variant pattern is valid")
});

/// Known substrings (lower-case) and the text shown in their place.
const KNOWN_MESSAGES: &[(&str, &str)] = &[
    ("invalid credentials", "The email or password is incorrect."),
    ("email has already been taken", "An account with this email already exists."),
    ("email already exists", "An account with this email already exists."),
    ("invalid discount code", "That discount code can't be applied."),
    ("not enough points", "You don't have enough points for this reward."),
];

/// A stock shortage reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockError {
    /// Variant display name as reported by the backend.
    pub variant: String,
    /// Units still available.
    pub available: u32,
}

impl StockError {
    /// Customer-facing description of the shortage.
    #[must_use]
    pub fn message(&self) -> String {
        if self.available == 0 {
            format!("{} is out of stock.", self.variant)
        } else {
            format!("Only {} left of {}.", self.available, self.variant)
        }
    }
}

/// Extract the variant name and available count from a stock error.
///
/// Recognises messages of the form
/// `Insufficient stock for variant "<name>": available <n>, requested <m>`.
/// Returns `None` for anything else.
///
/// ```
/// use marketfront_core::parse_stock_error;
///
/// let err = parse_stock_error(r#"Insufficient stock for variant "Oat Milk 1L": available 3, requested 5"#).unwrap();
/// assert_eq!(err.variant, "Oat Milk 1L");
/// assert_eq!(err.available, 3);
///
/// assert!(parse_stock_error("Payment declined").is_none());
/// ```
#[must_use]
pub fn parse_stock_error(message: &str) -> Option<StockError> {
    let captures = STOCK_PATTERN.captures(message)?;
    let variant = captures.name("variant")?.as_str().trim();
    let available = captures.name("available")?.as_str().parse().ok()?;

    if variant.is_empty() {
        return None;
    }

    Some(StockError {
        variant: variant.to_string(),
        available,
    })
}

/// Extract the variant name from `Product variant is not available: <name>`.
#[must_use]
pub fn unavailable_variant(message: &str) -> Option<&str> {
    let variant = UNAVAILABLE_PATTERN
        .captures(message)?
        .name("variant")?
        .as_str()
        .trim()
        .trim_end_matches('.');

    (!variant.is_empty()).then_some(variant)
}

/// Translate a backend error message into text fit for a notification.
#[must_use]
pub fn friendly_error_message(message: &str) -> String {
    if let Some(stock) = parse_stock_error(message) {
        return stock.message();
    }

    let lower = message.to_lowercase();
    if lower.contains("insufficient stock") {
        return GENERIC_STOCK_ERROR.to_string();
    }

    if let Some(variant) = unavailable_variant(message) {
        return format!("{variant} is no longer available.");
    }

    KNOWN_MESSAGES
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map_or_else(|| GENERIC_ERROR.to_string(), |(_, text)| (*text).to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stock_error_quoted() {
        let err = parse_stock_error(
            r#"Insufficient stock for variant "Red / XL": available 2, requested 5"#,
        )
        .unwrap();
        assert_eq!(err.variant, "Red / XL");
        assert_eq!(err.available, 2);
    }

    #[test]
    fn test_parse_stock_error_unquoted_product_variant() {
        let err =
            parse_stock_error("insufficient stock for product variant Blue Mug. Available: 0")
                .unwrap();
        assert_eq!(err.variant, "Blue Mug");
        assert_eq!(err.available, 0);
    }

    #[test]
    fn test_parse_stock_error_variant_with_dot() {
        let err = parse_stock_error("Insufficient stock for variant Size 9.5, only available 1")
            .unwrap();
        assert_eq!(err.variant, "Size 9.5");
        assert_eq!(err.available, 1);
    }

    #[test]
    fn test_parse_stock_error_unrecognised() {
        assert!(parse_stock_error("").is_none());
        assert!(parse_stock_error("insufficient stock").is_none());
        assert!(parse_stock_error("Product variant is not available: Mug").is_none());
    }

    #[test]
    fn test_unavailable_variant() {
        assert_eq!(
            unavailable_variant("Product variant is not available: Green Tea 500g"),
            Some("Green Tea 500g")
        );
        assert_eq!(unavailable_variant("Product variant is not available: "), None);
        assert_eq!(unavailable_variant("Out of stock"), None);
    }

    #[test]
    fn test_friendly_messages() {
        assert_eq!(
            friendly_error_message(
                r#"Insufficient stock for variant "Rice 5kg": available 1, requested 3"#
            ),
            "Only 1 left of Rice 5kg."
        );
        assert_eq!(
            friendly_error_message(r#"Insufficient stock for variant "Rice 5kg": available 0"#),
            "Rice 5kg is out of stock."
        );
        assert_eq!(
            friendly_error_message("Order failed: insufficient stock"),
            GENERIC_STOCK_ERROR
        );
        assert_eq!(
            friendly_error_message("Product variant is not available: Cold Brew"),
            "Cold Brew is no longer available."
        );
        assert_eq!(
            friendly_error_message("Invalid credentials"),
            "The email or password is incorrect."
        );
        assert_eq!(friendly_error_message("NullPointerException"), GENERIC_ERROR);
    }
}
