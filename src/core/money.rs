use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a monetary amount to 2 decimal places (paise precision).
///
/// Every derived amount (discount, taxable, GST, line total) is rounded at
/// its point of computation rather than accumulated unrounded, so totals
/// summed from line items reconcile exactly with what was stored per line.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a grand total to whole rupees for the payable invoice amount.
///
/// Midpoints round away from zero (212.50 becomes 213), matching how the
/// round-off line is conventionally printed on GST invoices.
pub fn round_rupees(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}
