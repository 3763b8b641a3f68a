//! Sale settlement tests
//!
//! Covers payment-split and line-item consistency, the pending -> completed
//! state machine, and the one-batch-per-line-item settlement rule.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::validation::{
    line_total, validate_line_item, validate_payment_split, validate_subtotal,
};
use shared::{BatchType, SaleStatus};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// A cart line as the checkout flow submits it
#[derive(Debug, Clone, Copy)]
struct Line {
    quantity: Decimal,
    unit_price: Decimal,
}

/// What settlement posts to the ledger for one sale
fn settlement_postings(lines: &[Line]) -> Vec<(BatchType, Decimal)> {
    lines
        .iter()
        .map(|l| (BatchType::Sale, -l.quantity))
        .collect()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// amount_paid + amount_on_credit must equal total_amount within a cent
    #[test]
    fn test_payment_split_consistency() {
        assert!(validate_payment_split(dec("150.00"), dec("150.00"), Decimal::ZERO).is_ok());
        assert!(validate_payment_split(dec("150.00"), dec("100.00"), dec("50.00")).is_ok());
        assert!(validate_payment_split(dec("150.00"), dec("100.00"), dec("49.99")).is_ok());
        assert!(validate_payment_split(dec("150.00"), dec("100.00"), dec("49.98")).is_err());
        assert!(validate_payment_split(dec("150.00"), Decimal::ZERO, Decimal::ZERO).is_err());
    }

    /// Negative split components are rejected
    #[test]
    fn test_payment_split_rejects_negatives() {
        assert!(validate_payment_split(dec("100.00"), dec("-10.00"), dec("110.00")).is_err());
        assert!(validate_payment_split(dec("100.00"), dec("110.00"), dec("-10.00")).is_err());
    }

    /// The on-credit flag is derived from the split, not the caller
    #[test]
    fn test_on_credit_derivation() {
        let on_credit = |amount_on_credit: Decimal| amount_on_credit > Decimal::ZERO;

        assert!(!on_credit(Decimal::ZERO));
        assert!(on_credit(dec("0.01")));
        assert!(on_credit(dec("50.00")));
    }

    /// Line totals sum to the subtotal
    #[test]
    fn test_line_totals_sum_to_subtotal() {
        let lines = [
            Line { quantity: dec("2"), unit_price: dec("30.00") },
            Line { quantity: dec("1.5"), unit_price: dec("100.00") },
            Line { quantity: dec("3"), unit_price: dec("9.99") },
        ];

        let totals: Vec<Decimal> = lines
            .iter()
            .map(|l| line_total(l.quantity, l.unit_price))
            .collect();

        assert_eq!(totals, vec![dec("60.00"), dec("150.000"), dec("29.97")]);
        assert!(validate_subtotal(&totals, dec("239.97")).is_ok());
        assert!(validate_subtotal(&totals, dec("240.97")).is_err());
    }

    /// Zero or negative quantities and negative prices are invalid lines
    #[test]
    fn test_line_item_validation() {
        assert!(validate_line_item(dec("1"), dec("10.00")).is_ok());
        assert!(validate_line_item(dec("0.25"), Decimal::ZERO).is_ok());
        assert!(validate_line_item(Decimal::ZERO, dec("10.00")).is_err());
        assert!(validate_line_item(dec("-1"), dec("10.00")).is_err());
        assert!(validate_line_item(dec("1"), dec("-10.00")).is_err());
    }

    /// Settlement posts exactly one sale batch per line item, each negating
    /// that line's quantity
    #[test]
    fn test_one_posting_per_line_item() {
        let lines = [
            Line { quantity: dec("5"), unit_price: dec("20.00") },
            Line { quantity: dec("2"), unit_price: dec("45.00") },
        ];

        let postings = settlement_postings(&lines);
        assert_eq!(postings.len(), 2);
        assert_eq!(postings[0], (BatchType::Sale, dec("-5")));
        assert_eq!(postings[1], (BatchType::Sale, dec("-2")));
    }

    /// pending -> completed is the only transition; completed is terminal
    #[test]
    fn test_status_state_machine() {
        let can_complete = |status: SaleStatus| status == SaleStatus::Pending;

        assert!(can_complete(SaleStatus::Pending));
        assert!(!can_complete(SaleStatus::Completed));
    }

    /// Completing twice settles the ledger and the balance once: the second
    /// attempt fails the status check before any posting happens
    #[test]
    fn test_double_completion_guard() {
        let mut status = SaleStatus::Pending;
        let mut postings = 0usize;
        let mut balance = dec("0");
        let total = dec("50.00");

        let complete = |status: &mut SaleStatus, postings: &mut usize, balance: &mut Decimal| {
            if *status != SaleStatus::Pending {
                return Err("Sale is already completed");
            }
            *postings += 1;
            *balance += total;
            *status = SaleStatus::Completed;
            Ok(())
        };

        assert!(complete(&mut status, &mut postings, &mut balance).is_ok());
        assert!(complete(&mut status, &mut postings, &mut balance).is_err());

        assert_eq!(postings, 1);
        assert_eq!(balance, dec("50.00"));
    }

    /// End-to-end scenario arithmetic: receive 10 @ 3.0 onto 20 units, sell 5
    #[test]
    fn test_settlement_scenario() {
        use shared::validation::weighted_average_cost;

        let mut quantity = dec("20");
        let avg = weighted_average_cost(Decimal::ZERO, quantity, dec("3.0"), dec("10"));
        quantity += dec("10");
        assert_eq!(quantity, dec("30"));
        assert_eq!(avg, dec("1.0"));

        // Sale of 5 units posts one sale batch of -5
        let postings = settlement_postings(&[Line { quantity: dec("5"), unit_price: dec("10.00") }]);
        quantity += postings[0].1;
        assert_eq!(quantity, dec("25"));

        // The on-credit portion lands on the customer balance
        let mut customer_balance = Decimal::ZERO;
        customer_balance += dec("50.00");
        assert_eq!(customer_balance, dec("50.00"));
    }

    /// Enum wire values match the stored text
    #[test]
    fn test_enum_wire_values() {
        use shared::PaymentMethod;

        assert_eq!(SaleStatus::Pending.as_str(), "pending");
        assert_eq!(SaleStatus::Completed.as_str(), "completed");
        assert_eq!(PaymentMethod::Mpesa.as_str(), "mpesa");
        assert_eq!(PaymentMethod::StoreCredit.as_str(), "store_credit");
        assert_eq!(BatchType::Sale.as_str(), "sale");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for amounts with two decimal places
    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=1_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    /// Strategy for cart lines
    fn line_strategy() -> impl Strategy<Value = Line> {
        ((1i64..=50_000i64), (0i64..=100_000i64)).prop_map(|(q, p)| Line {
            quantity: Decimal::new(q, 3),
            unit_price: Decimal::new(p, 2),
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Any split of a total into paid and on-credit validates
        #[test]
        fn prop_exact_split_validates(total in amount_strategy(), paid_part in 0u8..=100) {
            let paid = total * Decimal::from(paid_part) / Decimal::from(100);
            let on_credit = total - paid;
            prop_assert!(validate_payment_split(total, paid, on_credit).is_ok());
        }

        /// Subtotal computed from the lines always validates against them
        #[test]
        fn prop_computed_subtotal_validates(lines in prop::collection::vec(line_strategy(), 1..15)) {
            let totals: Vec<Decimal> = lines
                .iter()
                .map(|l| line_total(l.quantity, l.unit_price))
                .collect();
            let subtotal: Decimal = totals.iter().sum();
            prop_assert!(validate_subtotal(&totals, subtotal).is_ok());
        }

        /// Settlement always produces exactly one negative posting per line
        #[test]
        fn prop_one_posting_per_line(lines in prop::collection::vec(line_strategy(), 1..15)) {
            let postings = settlement_postings(&lines);
            prop_assert_eq!(postings.len(), lines.len());
            for ((batch_type, change), line) in postings.iter().zip(&lines) {
                prop_assert_eq!(*batch_type, BatchType::Sale);
                prop_assert_eq!(*change, -line.quantity);
            }
        }
    }
}
