//! Inventory ledger tests
//!
//! Covers the ledger ordering invariant, weighted-average-cost
//! recomputation, and the low-stock threshold rule.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::validation::{validate_batch_quantity, weighted_average_cost};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Minimal in-memory mirror of the ledger write path: the same arithmetic
/// the service binds into its UPDATE/INSERT statements.
#[derive(Debug, Clone, Copy)]
struct BatchEntry {
    quantity_change: Decimal,
    quantity_before: Decimal,
    quantity_after: Decimal,
}

struct Ledger {
    quantity: Decimal,
    weighted_avg_cost: Decimal,
    batches: Vec<BatchEntry>,
}

impl Ledger {
    fn new() -> Self {
        Self {
            quantity: Decimal::ZERO,
            weighted_avg_cost: Decimal::ZERO,
            batches: Vec::new(),
        }
    }

    fn post(&mut self, quantity_change: Decimal, purchase_cost: Option<Decimal>) {
        let quantity_before = self.quantity;
        let quantity_after = quantity_before + quantity_change;

        if let Some(cost) = purchase_cost.filter(|c| *c > Decimal::ZERO) {
            self.weighted_avg_cost = weighted_average_cost(
                self.weighted_avg_cost,
                quantity_before,
                cost,
                quantity_change,
            );
        }

        self.quantity = quantity_after;
        self.batches.push(BatchEntry {
            quantity_change,
            quantity_before,
            quantity_after,
        });
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Every batch carries a consistent before/after snapshot
    #[test]
    fn test_batch_snapshot_arithmetic() {
        let mut ledger = Ledger::new();
        ledger.post(dec("10"), None);
        ledger.post(dec("-3"), None);
        ledger.post(dec("5.5"), None);

        for batch in &ledger.batches {
            assert_eq!(
                batch.quantity_after,
                batch.quantity_before + batch.quantity_change
            );
        }
    }

    /// Sequential posts chain: quantity_before of N+1 equals quantity_after of N
    #[test]
    fn test_ledger_total_order() {
        let mut ledger = Ledger::new();
        for change in ["20", "-5", "12", "-8.25", "3"] {
            ledger.post(dec(change), None);
        }

        for window in ledger.batches.windows(2) {
            assert_eq!(window[1].quantity_before, window[0].quantity_after);
        }
    }

    /// Final quantity is the sum of all quantity changes
    #[test]
    fn test_quantity_reconstructable_from_ledger() {
        let mut ledger = Ledger::new();
        for change in ["100", "-30", "-15", "7.5"] {
            ledger.post(dec(change), None);
        }

        let sum: Decimal = ledger.batches.iter().map(|b| b.quantity_change).sum();
        assert_eq!(ledger.quantity, sum);
        assert_eq!(ledger.quantity, dec("62.5"));
    }

    /// Purchases of 10 @ 2.0 then 5 @ 5.0 from zero stock average to 3.0
    #[test]
    fn test_weighted_average_cost_two_purchases() {
        let mut ledger = Ledger::new();
        ledger.post(dec("10"), Some(dec("2.0")));
        ledger.post(dec("5"), Some(dec("5.0")));

        assert_eq!(ledger.weighted_avg_cost, dec("3.0"));
        assert_eq!(ledger.quantity, dec("15"));
    }

    /// Receiving 10 @ 3.0 onto 20 units carried at zero cost averages to 1.0
    #[test]
    fn test_weighted_average_cost_over_existing_stock() {
        let mut ledger = Ledger::new();
        ledger.post(dec("20"), None); // opening stock, no cost basis
        ledger.post(dec("10"), Some(dec("3.0")));

        assert_eq!(ledger.weighted_avg_cost, dec("1.0"));
        assert_eq!(ledger.quantity, dec("30"));
    }

    /// Sales do not move the cost basis
    #[test]
    fn test_sales_leave_cost_basis_untouched() {
        let mut ledger = Ledger::new();
        ledger.post(dec("10"), Some(dec("2.0")));
        let cost_before = ledger.weighted_avg_cost;

        ledger.post(dec("-4"), None);
        assert_eq!(ledger.weighted_avg_cost, cost_before);
    }

    /// Landing exactly at zero resets the average to the incoming cost
    #[test]
    fn test_weighted_average_cost_zero_quantity_guard() {
        let cost = weighted_average_cost(dec("2.5"), dec("-10"), dec("4.0"), dec("10"));
        assert_eq!(cost, dec("4.0"));
    }

    /// Overselling is representable: quantity may go negative
    #[test]
    fn test_negative_quantity_allowed() {
        let mut ledger = Ledger::new();
        ledger.post(dec("5"), None);
        ledger.post(dec("-8"), None);

        assert_eq!(ledger.quantity, dec("-3"));
        let last = ledger.batches.last().unwrap();
        assert_eq!(last.quantity_after, dec("-3"));
    }

    /// Zero-quantity batches are rejected before touching the ledger
    #[test]
    fn test_zero_change_rejected() {
        assert!(validate_batch_quantity(Decimal::ZERO).is_err());
        assert!(validate_batch_quantity(dec("0.001")).is_ok());
        assert!(validate_batch_quantity(dec("-1")).is_ok());
    }

    /// Low-stock rule: at or below the reorder threshold
    #[test]
    fn test_low_stock_threshold() {
        let min_stock = dec("10");

        assert!(dec("10") <= min_stock);
        assert!(dec("3") <= min_stock);
        assert!(!(dec("10.5") <= min_stock));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for non-zero signed quantity changes (3 decimal places)
    fn change_strategy() -> impl Strategy<Value = Decimal> {
        (-100_000i64..=100_000i64)
            .prop_filter("non-zero", |n| *n != 0)
            .prop_map(|n| Decimal::new(n, 3))
    }

    /// Strategy for positive purchase quantities
    fn purchase_qty_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100_000i64).prop_map(|n| Decimal::new(n, 3))
    }

    /// Strategy for positive unit costs
    fn cost_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=1_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Ledger order invariant holds for any sequence of posts
        #[test]
        fn prop_ledger_chain_and_sum(changes in prop::collection::vec(change_strategy(), 1..40)) {
            let mut ledger = Ledger::new();
            for change in &changes {
                ledger.post(*change, None);
            }

            for window in ledger.batches.windows(2) {
                prop_assert_eq!(window[1].quantity_before, window[0].quantity_after);
            }

            let sum: Decimal = changes.iter().sum();
            prop_assert_eq!(ledger.quantity, sum);
        }

        /// With purchases only, the moving average stays within the range of
        /// the purchase costs
        #[test]
        fn prop_weighted_average_bounded_by_costs(
            purchases in prop::collection::vec((purchase_qty_strategy(), cost_strategy()), 1..20)
        ) {
            let mut ledger = Ledger::new();
            for (qty, cost) in &purchases {
                ledger.post(*qty, Some(*cost));
            }

            let min_cost = purchases.iter().map(|(_, c)| *c).min().unwrap();
            let max_cost = purchases.iter().map(|(_, c)| *c).max().unwrap();

            prop_assert!(ledger.weighted_avg_cost >= min_cost);
            prop_assert!(ledger.weighted_avg_cost <= max_cost);
        }

        /// A single purchase from zero stock sets the average to its cost
        #[test]
        fn prop_first_purchase_sets_cost(qty in purchase_qty_strategy(), cost in cost_strategy()) {
            let avg = weighted_average_cost(Decimal::ZERO, Decimal::ZERO, cost, qty);
            prop_assert_eq!(avg, cost);
        }
    }
}
