//! Derived field reconciliation for the order form.
//!
//! Quantity and notional are tied together through price. Whichever of the
//! two the user edited last is the anchor and is never rewritten; the other
//! one is derived from it.

use serde::{Deserialize, Serialize};

/// Which of quantity/notional the user last edited directly
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorField {
    Quantity,
    Notional,
    #[default]
    None,
}

/// Next (quantity, notional) text pair produced by [`reconcile`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedFields {
    pub quantity: String,
    pub notional: String,
}

/// Parses user-facing text into a finite, strictly positive number.
/// Surrounding whitespace is ignored; anything else yields `None`.
pub fn parse_positive(text: &str) -> Option<f64> {
    let value: f64 = text.trim().parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Renders a computed value as the shortest decimal that round-trips
pub fn format_number(value: f64) -> String {
    format!("{value}")
}

/// Recomputes the derived field from the anchor and price.
///
/// Price and anchor are inputs only. Any non-positive or unparsable price,
/// or a non-positive anchor value, leaves both fields exactly as typed.
pub fn reconcile(price: &str, quantity: &str, notional: &str, anchor: AnchorField) -> DerivedFields {
    let mut next = DerivedFields {
        quantity: quantity.to_string(),
        notional: notional.to_string(),
    };

    let Some(price) = parse_positive(price) else {
        return next;
    };

    match anchor {
        AnchorField::Quantity => {
            if let Some(qty) = parse_positive(quantity) {
                next.notional = format_number(qty * price);
            }
        }
        AnchorField::Notional => {
            if let Some(notional) = parse_positive(notional) {
                next.quantity = format_number(notional / price);
            }
        }
        AnchorField::None => {}
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx(text: &str, expected: f64) -> bool {
        let value: f64 = text.parse().unwrap();
        (value - expected).abs() <= EPSILON * expected.abs().max(1.0)
    }

    #[test]
    fn test_parse_positive() {
        assert_eq!(parse_positive("12.5"), Some(12.5));
        assert_eq!(parse_positive("  3 "), Some(3.0));
        assert_eq!(parse_positive("1e2"), Some(100.0));
        assert_eq!(parse_positive("0"), None);
        assert_eq!(parse_positive("-1"), None);
        assert_eq!(parse_positive(""), None);
        assert_eq!(parse_positive("abc"), None);
        assert_eq!(parse_positive("12abc"), None);
        assert_eq!(parse_positive("inf"), None);
        assert_eq!(parse_positive("NaN"), None);
    }

    #[test]
    fn test_format_number_is_shortest_round_trip() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn test_quantity_anchor_derives_notional() {
        let cases = [(100.0, 2.0), (0.01, 12345.0), (65432.1, 0.0003), (3.3, 3.0)];
        for (price, qty) in cases {
            let next = reconcile(&price.to_string(), &qty.to_string(), "", AnchorField::Quantity);
            assert_eq!(next.quantity, qty.to_string());
            assert!(approx(&next.notional, qty * price), "{price} x {qty} -> {}", next.notional);
        }
    }

    #[test]
    fn test_notional_anchor_derives_quantity() {
        let cases = [(100.0, 250.0), (0.01, 1.0), (65432.1, 10.0), (3.0, 10.0)];
        for (price, notional) in cases {
            let next = reconcile(&price.to_string(), "", &notional.to_string(), AnchorField::Notional);
            assert_eq!(next.notional, notional.to_string());
            assert!(approx(&next.quantity, notional / price), "{notional} / {price} -> {}", next.quantity);
        }
    }

    #[test]
    fn test_price_change_with_quantity_anchor_only_touches_notional() {
        let first = reconcile("100", "2.50", "", AnchorField::Quantity);
        assert_eq!(first.notional, "250");

        let second = reconcile("120", &first.quantity, &first.notional, AnchorField::Quantity);
        assert_eq!(second.quantity, "2.50");
        assert_eq!(second.notional, "300");
    }

    #[test]
    fn test_anchor_text_is_never_reformatted() {
        let next = reconcile("10", " 0050 ", "", AnchorField::Quantity);
        assert_eq!(next.quantity, " 0050 ");
        assert_eq!(next.notional, "500");

        let next = reconcile("10", "", "1.000", AnchorField::Notional);
        assert_eq!(next.notional, "1.000");
        assert_eq!(next.quantity, "0.1");
    }

    #[test]
    fn test_invalid_price_suspends_derivation() {
        for price in ["0", "-5", "", "abc", "inf"] {
            let next = reconcile(price, "2", "999", AnchorField::Quantity);
            assert_eq!(next.quantity, "2");
            assert_eq!(next.notional, "999");

            let next = reconcile(price, "2", "999", AnchorField::Notional);
            assert_eq!(next.quantity, "2");
            assert_eq!(next.notional, "999");
        }
    }

    #[test]
    fn test_invalid_anchor_value_is_noop() {
        let next = reconcile("100", "0", "50", AnchorField::Quantity);
        assert_eq!(next.notional, "50");

        let next = reconcile("100", "3", "oops", AnchorField::Notional);
        assert_eq!(next.quantity, "3");
    }

    #[test]
    fn test_no_anchor_keeps_fields_independent() {
        let next = reconcile("100", "2", "7", AnchorField::None);
        assert_eq!(next.quantity, "2");
        assert_eq!(next.notional, "7");
    }
}
