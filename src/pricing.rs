//! Order totals.
//!
//! Amounts are integer minor units. Tax is computed in `Decimal` and rounded
//! half away from zero to the nearest minor unit.

use rust_decimal::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq)]
pub struct TotalsConfig {
    pub free_shipping_threshold: i64,
    pub base_shipping_cost: i64,
    pub tax_rate: Decimal,
}

impl Default for TotalsConfig {
    fn default() -> Self {
        Self {
            free_shipping_threshold: 10_000,
            base_shipping_cost: 100,
            tax_rate: Decimal::new(18, 2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct OrderTotals {
    pub subtotal: i64,
    pub tax: i64,
    pub shipping_cost: i64,
    pub total: i64,
}

impl OrderTotals {
    pub fn compute(line_totals: &[i64], config: &TotalsConfig) -> AppResult<Self> {
        let subtotal = line_totals
            .iter()
            .try_fold(0i64, |acc, line| acc.checked_add(*line))
            .ok_or_else(|| AppError::Validation("order subtotal is out of range".into()))?;

        let tax = (Decimal::from(subtotal) * config.tax_rate)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or_else(|| AppError::Validation("order tax is out of range".into()))?;

        let shipping_cost = if subtotal >= config.free_shipping_threshold {
            0
        } else {
            config.base_shipping_cost
        };

        let total = subtotal
            .checked_add(tax)
            .and_then(|sum| sum.checked_add(shipping_cost))
            .ok_or_else(|| AppError::Validation("order total is out of range".into()))?;

        Ok(Self {
            subtotal,
            tax,
            shipping_cost,
            total,
        })
    }

    pub fn is_balanced(&self) -> bool {
        self.total == self.subtotal + self.tax + self.shipping_cost
    }
}

/// `unit_price * quantity`, rejecting overflow instead of wrapping.
pub fn line_total(unit_price: i64, quantity: i32) -> AppResult<i64> {
    unit_price
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| AppError::Validation("line total is out of range".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_below_free_shipping() {
        let line = line_total(1000, 2).unwrap();
        let totals = OrderTotals::compute(&[line], &TotalsConfig::default()).unwrap();
        assert_eq!(
            totals,
            OrderTotals {
                subtotal: 2000,
                tax: 360,
                shipping_cost: 100,
                total: 2460,
            }
        );
    }

    #[test]
    fn threshold_reached_ships_free() {
        let config = TotalsConfig::default();
        let totals = OrderTotals::compute(&[6000, 4000], &config).unwrap();
        assert_eq!(totals.subtotal, config.free_shipping_threshold);
        assert_eq!(totals.shipping_cost, 0);
        assert_eq!(totals.total, 10_000 + 1_800);
    }

    #[test]
    fn tax_rounds_half_away_from_zero() {
        let config = TotalsConfig {
            tax_rate: Decimal::new(5, 2),
            ..TotalsConfig::default()
        };
        // 0.05 * 10 = 0.5 -> 1
        let totals = OrderTotals::compute(&[10], &config).unwrap();
        assert_eq!(totals.tax, 1);
        // 0.05 * 29 = 1.45 -> 1
        let totals = OrderTotals::compute(&[29], &config).unwrap();
        assert_eq!(totals.tax, 1);
    }

    #[test]
    fn totals_always_balance() {
        let config = TotalsConfig::default();
        for lines in [vec![], vec![1], vec![333, 777], vec![9_999], vec![50_000, 1]] {
            let totals = OrderTotals::compute(&lines, &config).unwrap();
            assert!(totals.is_balanced(), "{lines:?}");
        }
    }

    #[test]
    fn overflowing_total_is_rejected() {
        let result = OrderTotals::compute(&[8_000_000_000_000_000_000], &TotalsConfig::default());
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn overflowing_line_is_rejected() {
        assert!(matches!(
            line_total(i64::MAX, 2),
            Err(AppError::Validation(_))
        ));
    }
}
