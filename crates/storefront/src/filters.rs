//! Askama filters shared by the page templates.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Year for the footer copyright: `{{ ""|current_year }}`.
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Cache-busting hash of `static/css/main.css`, set by `build.rs`.
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// BEM modifier class for a status badge.
///
/// `{{ order.status|status_class }}` turns `"Awaiting payment"` into
/// `status--awaiting-payment`.
#[askama::filter_fn]
pub fn status_class(label: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(status_modifier(&label.to_string()))
}

fn status_modifier(label: &str) -> String {
    let slug = label
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    format!("status--{slug}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_modifier() {
        assert_eq!(status_modifier("Paid"), "status--paid");
        assert_eq!(status_modifier("Awaiting payment"), "status--awaiting-payment");
        assert_eq!(status_modifier(" Ready for pickup! "), "status--ready-for-pickup");
    }
}
