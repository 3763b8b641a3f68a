//! Customer store-credit tests
//!
//! Covers the running-balance invariant: credit sales increase the balance,
//! payments decrease it floored at zero, and it never goes negative.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::validation::{apply_payment, validate_payment_amount};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Balance movements as the services apply them
#[derive(Debug, Clone, Copy)]
enum Movement {
    /// Completed credit sale for this total
    CreditSale(Decimal),
    /// Payment recorded against the balance
    Payment(Decimal),
}

fn apply_movements(movements: &[Movement]) -> Decimal {
    movements
        .iter()
        .fold(Decimal::ZERO, |balance, movement| match movement {
            Movement::CreditSale(total) => balance + *total,
            Movement::Payment(amount) => apply_payment(balance, *amount),
        })
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// A payment larger than the balance floors it at zero
    #[test]
    fn test_overpayment_floors_at_zero() {
        assert_eq!(apply_payment(dec("30.00"), dec("100.00")), Decimal::ZERO);
        assert_eq!(apply_payment(Decimal::ZERO, dec("10.00")), Decimal::ZERO);
    }

    /// An exact payment clears the balance
    #[test]
    fn test_exact_payment_clears_balance() {
        assert_eq!(apply_payment(dec("75.50"), dec("75.50")), Decimal::ZERO);
    }

    /// A partial payment leaves the remainder owed
    #[test]
    fn test_partial_payment() {
        assert_eq!(apply_payment(dec("75.50"), dec("25.50")), dec("50.00"));
    }

    /// Non-positive payment amounts are rejected
    #[test]
    fn test_payment_amount_must_be_positive() {
        assert!(validate_payment_amount(dec("0.01")).is_ok());
        assert!(validate_payment_amount(Decimal::ZERO).is_err());
        assert!(validate_payment_amount(dec("-5.00")).is_err());
    }

    /// Credit sale then payment: the settlement scenario from checkout
    #[test]
    fn test_credit_sale_then_payment() {
        let balance = apply_movements(&[
            Movement::CreditSale(dec("50.00")),
            Movement::Payment(dec("20.00")),
        ]);
        assert_eq!(balance, dec("30.00"));
    }

    /// Interleaved sales and payments keep the running balance consistent
    #[test]
    fn test_interleaved_movements() {
        let balance = apply_movements(&[
            Movement::CreditSale(dec("100.00")),
            Movement::Payment(dec("40.00")),
            Movement::CreditSale(dec("25.00")),
            Movement::Payment(dec("90.00")),
        ]);
        // 100 - 40 + 25 = 85, payment of 90 floors at 0
        assert_eq!(balance, Decimal::ZERO);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for positive amounts with two decimal places
    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=1_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    /// Strategy for balance movements
    fn movement_strategy() -> impl Strategy<Value = Movement> {
        prop_oneof![
            amount_strategy().prop_map(Movement::CreditSale),
            amount_strategy().prop_map(Movement::Payment),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// The balance never goes negative under any movement sequence
        #[test]
        fn prop_balance_never_negative(movements in prop::collection::vec(movement_strategy(), 0..50)) {
            let mut balance = Decimal::ZERO;
            for movement in &movements {
                balance = match movement {
                    Movement::CreditSale(total) => balance + *total,
                    Movement::Payment(amount) => apply_payment(balance, *amount),
                };
                prop_assert!(balance >= Decimal::ZERO);
            }
        }

        /// A single payment never yields a negative balance and absorbs any
        /// excess
        #[test]
        fn prop_payment_floors(balance in amount_strategy(), amount in amount_strategy()) {
            let after = apply_payment(balance, amount);
            prop_assert!(after >= Decimal::ZERO);
            if amount >= balance {
                prop_assert_eq!(after, Decimal::ZERO);
            } else {
                prop_assert_eq!(after, balance - amount);
            }
        }
    }
}
