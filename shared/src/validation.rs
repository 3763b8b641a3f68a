//! Bookkeeping math and validation for the Duka POS platform
//!
//! Pure functions used by the backend services; the values they produce are
//! what gets bound into the SQL statements, so they are tested without a
//! database.

use rust_decimal::Decimal;

/// Tolerance for payment-split arithmetic on amounts entered in currency
/// units (one cent).
pub fn rounding_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

// ============================================================================
// Inventory Ledger Math
// ============================================================================

/// Recompute the moving weighted-average unit cost after a purchase batch.
///
/// `quantity_before` is the stock level before the batch, `quantity_change`
/// the (positive) purchased quantity, `cost_per_unit` the purchase price.
/// When the resulting quantity is not positive the average is reset to the
/// incoming cost so the next purchase starts from a meaningful basis (and the
/// division by zero is avoided).
pub fn weighted_average_cost(
    avg_cost_before: Decimal,
    quantity_before: Decimal,
    cost_per_unit: Decimal,
    quantity_change: Decimal,
) -> Decimal {
    let quantity_after = quantity_before + quantity_change;
    if quantity_after <= Decimal::ZERO {
        return cost_per_unit;
    }
    (avg_cost_before * quantity_before + cost_per_unit * quantity_change.abs()) / quantity_after
}

/// Validate a batch post input
pub fn validate_batch_quantity(quantity_change: Decimal) -> Result<(), &'static str> {
    if quantity_change == Decimal::ZERO {
        return Err("Quantity change must be non-zero");
    }
    Ok(())
}

// ============================================================================
// Sale Settlement Math
// ============================================================================

/// Validate that a payment split covers the sale total.
///
/// `amount_paid + amount_on_credit` must equal `total_amount` within one cent,
/// and neither component may be negative.
pub fn validate_payment_split(
    total_amount: Decimal,
    amount_paid: Decimal,
    amount_on_credit: Decimal,
) -> Result<(), &'static str> {
    if amount_paid < Decimal::ZERO {
        return Err("Amount paid cannot be negative");
    }
    if amount_on_credit < Decimal::ZERO {
        return Err("Amount on credit cannot be negative");
    }
    let diff = (amount_paid + amount_on_credit - total_amount).abs();
    if diff > rounding_tolerance() {
        return Err("Amount paid plus amount on credit must equal the total");
    }
    Ok(())
}

/// Validate a single sale line item
pub fn validate_line_item(quantity: Decimal, unit_price: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Line item quantity must be positive");
    }
    if unit_price < Decimal::ZERO {
        return Err("Line item unit price cannot be negative");
    }
    Ok(())
}

/// Line total for a sale item
pub fn line_total(quantity: Decimal, unit_price: Decimal) -> Decimal {
    quantity * unit_price
}

/// Validate that the line totals add up to the sale subtotal
pub fn validate_subtotal(line_totals: &[Decimal], subtotal: Decimal) -> Result<(), &'static str> {
    let sum: Decimal = line_totals.iter().sum();
    if (sum - subtotal).abs() > rounding_tolerance() {
        return Err("Line item totals must sum to the subtotal");
    }
    Ok(())
}

// ============================================================================
// Customer Credit Math
// ============================================================================

/// Apply a payment to an outstanding balance, flooring at zero.
///
/// Excess payment beyond the balance is absorbed; the balance never goes
/// negative.
pub fn apply_payment(current_balance: Decimal, amount: Decimal) -> Decimal {
    let remaining = current_balance - amount;
    if remaining < Decimal::ZERO {
        Decimal::ZERO
    } else {
        remaining
    }
}

/// Validate a recorded payment amount
pub fn validate_payment_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount <= Decimal::ZERO {
        return Err("Payment amount must be positive");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn weighted_average_cost_blends_purchases() {
        // 10 @ 2.0 then 5 @ 5.0 starting from zero stock
        let after_first = weighted_average_cost(Decimal::ZERO, Decimal::ZERO, dec("2.0"), dec("10"));
        assert_eq!(after_first, dec("2.0"));

        let after_second = weighted_average_cost(after_first, dec("10"), dec("5.0"), dec("5"));
        assert_eq!(after_second, dec("3.0"));
    }

    #[test]
    fn weighted_average_cost_resets_when_stock_not_positive() {
        // Stock at -5, purchase of 5 lands exactly at zero
        let cost = weighted_average_cost(dec("2.0"), dec("-5"), dec("4.0"), dec("5"));
        assert_eq!(cost, dec("4.0"));
    }

    #[test]
    fn payment_split_within_tolerance() {
        assert!(validate_payment_split(dec("100.00"), dec("60.00"), dec("40.00")).is_ok());
        assert!(validate_payment_split(dec("100.00"), dec("60.00"), dec("39.99")).is_ok());
        assert!(validate_payment_split(dec("100.00"), dec("60.00"), dec("30.00")).is_err());
        assert!(validate_payment_split(dec("100.00"), dec("-1.00"), dec("101.00")).is_err());
    }

    #[test]
    fn payment_floors_at_zero() {
        assert_eq!(apply_payment(dec("50.00"), dec("30.00")), dec("20.00"));
        assert_eq!(apply_payment(dec("50.00"), dec("80.00")), Decimal::ZERO);
        assert_eq!(apply_payment(dec("50.00"), dec("50.00")), Decimal::ZERO);
    }

    #[test]
    fn line_item_validation() {
        assert!(validate_line_item(dec("1.5"), dec("20.00")).is_ok());
        assert!(validate_line_item(Decimal::ZERO, dec("20.00")).is_err());
        assert!(validate_line_item(dec("1"), dec("-0.01")).is_err());
    }

    #[test]
    fn subtotal_must_match_line_totals() {
        let totals = vec![dec("10.00"), dec("25.50")];
        assert!(validate_subtotal(&totals, dec("35.50")).is_ok());
        assert!(validate_subtotal(&totals, dec("36.00")).is_err());
    }
}
