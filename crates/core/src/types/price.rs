//! Price formatting and parsing using decimal arithmetic.
//!
//! Backend amounts arrive as JSON numbers or strings and are held as
//! [`Decimal`] so that formatting never goes through floating point.
//!
//! Rounding follows the browser number formatter the storefront replaced:
//! half away from zero, so `1234.5` shows as `$ 1,235` with the default
//! zero-fraction format.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// How a price should be rendered.
///
/// The default is `"$"` with no fraction digits, so `1234.5` renders as
/// `$ 1,235`. Pages use the configured currency symbol with exactly two
/// fraction digits instead (see `AppState::format_price`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceFormat {
    /// Currency symbol placed before the number, separated by a space.
    pub symbol: Option<String>,
    /// Minimum number of fraction digits (zero-padded).
    pub min_fraction_digits: u32,
    /// Maximum number of fraction digits (rounded).
    pub max_fraction_digits: u32,
}

impl Default for PriceFormat {
    fn default() -> Self {
        Self {
            symbol: Some("$".to_string()),
            min_fraction_digits: 0,
            max_fraction_digits: 0,
        }
    }
}

impl PriceFormat {
    /// A format without a currency symbol.
    #[must_use]
    pub fn plain() -> Self {
        Self {
            symbol: None,
            ..Self::default()
        }
    }

    /// Replace the currency symbol.
    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Set the fraction digit bounds. A maximum below the minimum is raised
    /// to the minimum.
    #[must_use]
    pub fn fraction_digits(mut self, min: u32, max: u32) -> Self {
        self.min_fraction_digits = min;
        self.max_fraction_digits = max.max(min);
        self
    }
}

/// Format an amount for display.
///
/// ```
/// use marketfront_core::{PriceFormat, format_price};
/// use rust_decimal::Decimal;
///
/// let amount = Decimal::new(12345, 1); // 1234.5
/// assert_eq!(format_price(amount, &PriceFormat::default()), "$ 1,235");
/// assert_eq!(format_price(amount, &PriceFormat::plain().fraction_digits(0, 1)), "1,234.5");
/// assert_eq!(format_price(amount, &PriceFormat::plain().fraction_digits(2, 2)), "1,234.50");
/// ```
#[must_use]
pub fn format_price(amount: Decimal, format: &PriceFormat) -> String {
    let max = format.max_fraction_digits.max(format.min_fraction_digits);
    let rounded = amount.round_dp_with_strategy(max, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    let digits = rounded.abs().to_string();
    let (integer, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), ""));

    let mut fraction = fraction.trim_end_matches('0').to_string();
    while fraction.len() < format.min_fraction_digits as usize {
        fraction.push('0');
    }

    let mut number = group_thousands(integer);
    if !fraction.is_empty() {
        number.push('.');
        number.push_str(&fraction);
    }

    let sign = if negative { "-" } else { "" };
    match &format.symbol {
        Some(symbol) => format!("{sign}{symbol} {number}"),
        None => format!("{sign}{number}"),
    }
}

/// Insert `,` separators every three digits from the right.
fn group_thousands(integer: &str) -> String {
    let len = integer.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, c) in integer.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Parse an amount back out of a formatted price string.
///
/// Currency symbols, spaces and grouping separators are ignored. Returns
/// `None` when no digits are present.
///
/// ```
/// use marketfront_core::parse_price_from_formatted;
/// use rust_decimal::Decimal;
///
/// assert_eq!(parse_price_from_formatted("$ 1,234.50"), Some(Decimal::new(12345, 1)));
/// assert_eq!(parse_price_from_formatted("free"), None);
/// ```
#[must_use]
pub fn parse_price_from_formatted(formatted: &str) -> Option<Decimal> {
    let negative = formatted
        .chars()
        .take_while(|c| !c.is_ascii_digit())
        .any(|c| c == '-');

    let cleaned: String = formatted
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let value = cleaned.parse::<Decimal>().ok()?;
    Some(if negative { -value } else { value })
}

/// Percentage saved going from `original` to `discounted`, rounded to a whole
/// number and clamped to `0..=100`.
#[must_use]
pub fn discount_percentage(original: Decimal, discounted: Decimal) -> Decimal {
    if original <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let saved = (original - discounted) / original * Decimal::ONE_HUNDRED;
    saved
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
        .normalize()
}

/// Format the discount from `original` to `discounted` as a percentage label.
///
/// ```
/// use marketfront_core::format_discount_percentage;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_discount_percentage(Decimal::from(100), Decimal::from(80)), "20%");
/// ```
#[must_use]
pub fn format_discount_percentage(original: Decimal, discounted: Decimal) -> String {
    format!("{}%", discount_percentage(original, discounted))
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Format with the currency symbol and two fraction digits (e.g. `"$ 19.99"`).
    #[must_use]
    pub fn display(&self) -> String {
        let format = PriceFormat::plain()
            .with_symbol(self.currency_code.symbol())
            .fraction_digits(2, 2);
        format_price(self.amount, &format)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: i64, scale: u32) -> Decimal {
        Decimal::new(value, scale)
    }

    #[test]
    fn test_default_format_rounds_half_away_from_zero() {
        assert_eq!(format_price(dec(12345, 1), &PriceFormat::default()), "$ 1,235");
        assert_eq!(format_price(dec(12344, 1), &PriceFormat::default()), "$ 1,234");
        assert_eq!(format_price(dec(5, 1), &PriceFormat::default()), "$ 1");
    }

    #[test]
    fn test_fraction_digit_variants() {
        let one = PriceFormat::plain().fraction_digits(0, 1);
        let two = PriceFormat::plain().fraction_digits(2, 2);

        assert_eq!(format_price(dec(12345, 1), &one), "1,234.5");
        assert_eq!(format_price(dec(12345, 1), &two), "1,234.50");
        assert_eq!(format_price(Decimal::from(1234), &one), "1,234");
        assert_eq!(format_price(Decimal::from(1234), &two), "1,234.00");
    }

    #[test]
    fn test_grouping() {
        let plain = PriceFormat::plain();
        assert_eq!(format_price(Decimal::ZERO, &plain), "0");
        assert_eq!(format_price(Decimal::from(999), &plain), "999");
        assert_eq!(format_price(Decimal::from(1000), &plain), "1,000");
        assert_eq!(format_price(Decimal::from(1_234_567), &plain), "1,234,567");
    }

    #[test]
    fn test_negative_amounts_keep_sign_before_symbol() {
        assert_eq!(format_price(dec(-1500, 0), &PriceFormat::default()), "-$ 1,500");
        // Rounds to zero, no negative zero
        assert_eq!(format_price(dec(-4, 1), &PriceFormat::default()), "$ 0");
    }

    #[test]
    fn test_custom_symbol() {
        let format = PriceFormat::default().with_symbol("Rp");
        assert_eq!(format_price(Decimal::from(25_000), &format), "Rp 25,000");
    }

    #[test]
    fn test_max_raised_to_min() {
        let format = PriceFormat::plain().fraction_digits(2, 0);
        assert_eq!(format.max_fraction_digits, 2);
        assert_eq!(format_price(dec(15, 1), &format), "1.50");
    }

    #[test]
    fn test_parse_formatted() {
        assert_eq!(parse_price_from_formatted("$ 1,234.50"), Some(dec(12345, 1)));
        assert_eq!(parse_price_from_formatted("1,235"), Some(Decimal::from(1235)));
        assert_eq!(parse_price_from_formatted("-$ 20"), Some(Decimal::from(-20)));
        assert_eq!(parse_price_from_formatted(""), None);
        assert_eq!(parse_price_from_formatted("$ ."), None);
    }

    #[test]
    fn test_parse_reads_back_formatted_output() {
        let amount = dec(98_765_43, 2);
        let format = PriceFormat::default().fraction_digits(2, 2);
        let formatted = format_price(amount, &format);
        assert_eq!(formatted, "$ 98,765.43");
        assert_eq!(parse_price_from_formatted(&formatted), Some(amount));
    }

    #[test]
    fn test_discount_percentage() {
        assert_eq!(
            format_discount_percentage(Decimal::from(100), Decimal::from(80)),
            "20%"
        );
        assert_eq!(
            format_discount_percentage(Decimal::from(30), Decimal::from(20)),
            "33%"
        );
        // 1/8 = 12.5% rounds up
        assert_eq!(
            format_discount_percentage(Decimal::from(8), Decimal::from(7)),
            "13%"
        );
    }

    #[test]
    fn test_discount_percentage_edges() {
        assert_eq!(
            format_discount_percentage(Decimal::ZERO, Decimal::from(5)),
            "0%"
        );
        // Price went up
        assert_eq!(
            format_discount_percentage(Decimal::from(50), Decimal::from(60)),
            "0%"
        );
        assert_eq!(
            format_discount_percentage(Decimal::from(50), Decimal::from(-10)),
            "100%"
        );
    }

    #[test]
    fn test_price_display() {
        let price = Price::new(dec(1999, 2), CurrencyCode::USD);
        assert_eq!(price.display(), "$ 19.99");

        let price = Price::new(Decimal::from(5), CurrencyCode::GBP);
        assert_eq!(price.display(), "£ 5.00");
    }
}
