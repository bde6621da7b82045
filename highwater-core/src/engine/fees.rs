//! Fee model: commission, transfer fee and sell-side stamp tax.
//!
//! Commission applies to both sides and is floored at `min_commission`.
//! Transfer fee applies to both sides. Stamp tax applies to sells only.
//! On a sell the commission is capped so fees never exceed the proceeds.

use serde::{Deserialize, Serialize};

use crate::domain::TradeAction;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeModel {
    pub commission_rate: f64,
    pub min_commission: f64,
    pub transfer_fee_rate: f64,
    pub stamp_tax_rate: f64,
}

impl Default for FeeModel {
    /// Mainland A-share schedule.
    fn default() -> Self {
        Self {
            commission_rate: 0.0001,
            min_commission: 5.0,
            transfer_fee_rate: 0.00001,
            stamp_tax_rate: 0.0005,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub commission: f64,
    pub stamp_tax: f64,
    pub transfer_fee: f64,
    pub total: f64,
}

impl FeeModel {
    pub fn frictionless() -> Self {
        Self {
            commission_rate: 0.0,
            min_commission: 0.0,
            transfer_fee_rate: 0.0,
            stamp_tax_rate: 0.0,
        }
    }

    pub fn quote(&self, amount: f64, side: TradeAction) -> FeeBreakdown {
        let mut commission = (amount * self.commission_rate).max(self.min_commission);
        let transfer_fee = amount * self.transfer_fee_rate;
        let stamp_tax = match side {
            TradeAction::Buy => 0.0,
            TradeAction::Sell => amount * self.stamp_tax_rate,
        };
        if side == TradeAction::Sell {
            // net proceeds of a sell are never negative
            commission = commission.min((amount - stamp_tax - transfer_fee).max(0.0));
        }
        FeeBreakdown {
            commission,
            stamp_tax,
            transfer_fee,
            total: commission + stamp_tax + transfer_fee,
        }
    }

    /// Cash needed to buy `amount` of stock, fees included.
    pub fn buy_cost(&self, amount: f64) -> f64 {
        let fees = self.quote(amount, TradeAction::Buy);
        amount + fees.commission + fees.transfer_fee
    }
}
