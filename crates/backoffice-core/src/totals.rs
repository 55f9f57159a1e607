use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::LineItem;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Unrounded totals; rounding happens only when an amount is displayed.
pub fn compute_totals(items: &[LineItem], tax_rate: Decimal) -> Totals {
    let subtotal: Decimal = items.iter().map(LineItem::amount).sum();
    let tax = subtotal * tax_rate / Decimal::ONE_HUNDRED;

    Totals {
        subtotal,
        tax,
        total: subtotal + tax,
    }
}

fn to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Two fixed decimal places, as payment providers expect in query strings.
pub fn fixed_2(amount: Decimal) -> String {
    format!("{:.2}", to_cents(amount))
}

/// en-US currency formatting for USD, e.g. `$1,234.50` or `-$5.00`.
pub fn format_usd(amount: Decimal) -> String {
    let cents = to_cents(amount);
    let sign = if cents.is_sign_negative() && !cents.is_zero() {
        "-"
    } else {
        ""
    };

    let text = format!("{:.2}", cents.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}${grouped}.{fraction}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;
    use uuid::Uuid;

    fn item(quantity: Decimal, rate: Decimal) -> LineItem {
        LineItem {
            id: Uuid::new_v4(),
            description: String::new(),
            quantity,
            rate,
        }
    }

    #[test]
    fn empty_items_total_zero() {
        let totals = compute_totals(&[], Decimal::from(25));
        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn design_retainer_scenario() {
        let totals = compute_totals(&[item(Decimal::from(2), Decimal::from(75))], Decimal::TEN);

        assert_eq!(totals.subtotal, Decimal::from(150));
        assert_eq!(totals.tax, Decimal::from(15));
        assert_eq!(totals.total, Decimal::from(165));
        assert_eq!(format_usd(totals.subtotal), "$150.00");
        assert_eq!(format_usd(totals.tax), "$15.00");
        assert_eq!(format_usd(totals.total), "$165.00");
    }

    #[rstest]
    #[case("0", "$0.00")]
    #[case("1234.5", "$1,234.50")]
    #[case("999999.999", "$1,000,000.00")]
    #[case("0.005", "$0.01")]
    #[case("-5", "-$5.00")]
    #[case("-0.001", "$0.00")]
    fn currency_formatting(#[case] amount: &str, #[case] expected: &str) {
        assert_eq!(format_usd(amount.parse().unwrap()), expected);
    }

    #[test]
    fn fixed_two_places() {
        assert_eq!(fixed_2("42.5".parse().unwrap()), "42.50");
        assert_eq!(fixed_2(Decimal::from(7)), "7.00");
    }

    proptest! {
        #[test]
        fn scaling_rates_scales_totals(
            lines in prop::collection::vec((0u32..500, 0u32..100_000), 0..8),
            tax_basis_points in 0u32..10_000,
            factor in 0u32..50,
        ) {
            let tax_rate = Decimal::new(i64::from(tax_basis_points), 2);
            let k = Decimal::from(factor);

            let items: Vec<LineItem> = lines
                .iter()
                .map(|(qty, cents)| item(Decimal::from(*qty), Decimal::new(i64::from(*cents), 2)))
                .collect();
            let scaled: Vec<LineItem> = items
                .iter()
                .map(|line| item(line.quantity, line.rate * k))
                .collect();

            let base = compute_totals(&items, tax_rate);
            let after = compute_totals(&scaled, tax_rate);

            prop_assert_eq!(after.subtotal, base.subtotal * k);
            prop_assert_eq!(after.tax, base.tax * k);
            prop_assert_eq!(after.total, base.total * k);
        }
    }
}
