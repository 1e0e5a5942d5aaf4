//! Parsing of analyst price-target text such as `"$310.00"` or
//! `"250 – 300"`.

use crate::numeric::round2;

/// Separators that turn a target into a range, checked in this order.
/// `->` precedes `-` so an ASCII arrow is not split as a hyphen.
const RANGE_SEPARATORS: [&str; 4] = ["\u{2013}", "\u{2192}", "->", "-"];

/// Parse a price target. A range resolves to its higher bound (the second
/// component). Malformed text yields `None`.
#[must_use]
pub fn parse_price_target(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let upper = match RANGE_SEPARATORS.iter().find(|sep| text.contains(**sep)) {
        Some(sep) => text.split(*sep).nth(1)?,
        None => text,
    };

    parse_price(upper)
}

/// Parse a single price, tolerating a currency sign, thousands separators
/// and surrounding whitespace.
#[must_use]
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' ' | '\u{a0}'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
        .map(round2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_price() {
        assert_eq!(parse_price_target("310"), Some(310.0));
        assert_eq!(parse_price_target(" $1,250.456 "), Some(1250.46));
    }

    #[test]
    fn en_dash_range_takes_upper_bound() {
        assert_eq!(parse_price_target("250.00 \u{2013} 300.00"), Some(300.0));
    }

    #[test]
    fn hyphen_and_arrow_ranges() {
        assert_eq!(parse_price_target("180-195.5"), Some(195.5));
        assert_eq!(parse_price_target("180 \u{2192} 210"), Some(210.0));
        assert_eq!(parse_price_target("180 -> 215"), Some(215.0));
    }

    #[test]
    fn malformed_is_unavailable() {
        assert_eq!(parse_price_target(""), None);
        assert_eq!(parse_price_target("N/A"), None);
        assert_eq!(parse_price_target("250 \u{2013} abc"), None);
        assert_eq!(parse_price_target("250 \u{2013}"), None);
    }
}
