//! Lot sizing.

use super::fees::FeeModel;

/// Largest whole-lot share count whose cost, buy fees included, fits the
/// budget. Zero when not even one lot fits.
///
/// Starts one lot above the rate-only bound and steps down one lot at a
/// time while the minimum commission pushes the cost over budget. Share
/// counts saturate at `u64::MAX` for budgets beyond any real account.
pub fn affordable_shares(budget: f64, price: f64, lot_size: u64, fees: &FeeModel) -> u64 {
    if lot_size == 0 || !(price > 0.0 && budget > 0.0) {
        return 0;
    }
    let lot_cost = price * lot_size as f64;
    let rate = 1.0 + fees.commission_rate.max(0.0) + fees.transfer_fee_rate.max(0.0);
    let mut lots = (budget / (lot_cost * rate)).floor() as u64;
    lots = lots.saturating_add(1);
    while lots > 0 && fees.buy_cost(lot_cost * lots as f64) > budget {
        lots -= 1;
    }
    lots.saturating_mul(lot_size)
}
