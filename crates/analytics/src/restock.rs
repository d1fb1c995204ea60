//! Restock recommendations from a demand estimate and current stock.

use serde::{Deserialize, Serialize};

use kassa_core::ProductId;

use crate::forecast::PredictionOutput;

/// Reported when projected demand is zero and no stockout is foreseeable.
pub const NO_STOCKOUT_SENTINEL: u32 = 999;

/// Days of demand the suggested restock quantity should cover beyond lead time.
pub const SAFETY_BUFFER_DAYS: u32 = 14;

/// Default days between placing a restock order and its arrival.
pub const DEFAULT_LEAD_TIME_DAYS: u32 = 3;

/// Stockout risk tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Current inventory position of one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    pub id: ProductId,
    pub name: String,
    pub current_stock: u32,
    /// Long-run observed sell rate in units/day.
    pub average_sell_rate: f64,
}

/// Restock recommendation for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockOptimization {
    pub product_id: ProductId,
    /// Whole days of cover left, or [`NO_STOCKOUT_SENTINEL`].
    pub days_until_stockout: u32,
    pub suggested_restock_quantity: u32,
    pub risk_level: RiskLevel,
    pub recommendation: String,
}

/// Convert a demand estimate and current stock into an actionable restock
/// recommendation.
///
/// Projected daily demand blends the long-run sell rate with the short-term
/// forecast; the suggested quantity targets a [`SAFETY_BUFFER_DAYS`]-day
/// buffer plus `lead_time_days` of replenishment cover.
pub fn optimize_stock(
    item: &StockItem,
    prediction: &PredictionOutput,
    lead_time_days: u32,
) -> StockOptimization {
    let projected_daily_demand =
        (item.average_sell_rate + prediction.predicted_quantity_tomorrow as f64) / 2.0;

    let days_until_stockout = if projected_daily_demand > 0.0 {
        (item.current_stock as f64 / projected_daily_demand).floor() as u32
    } else {
        NO_STOCKOUT_SENTINEL
    };

    let coverage_days = (SAFETY_BUFFER_DAYS + lead_time_days) as f64;
    let suggested_restock_quantity = ((projected_daily_demand * coverage_days).round()
        - item.current_stock as f64)
        .max(0.0) as u32;

    let risk_level = if days_until_stockout <= lead_time_days {
        RiskLevel::High
    } else if days_until_stockout <= lead_time_days + 4 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let recommendation = match risk_level {
        RiskLevel::High => format!(
            "CRITICAL: Order {suggested_restock_quantity} units immediately to avoid stockout."
        ),
        RiskLevel::Medium => {
            format!("Warning: Consider restocking {suggested_restock_quantity} units soon.")
        }
        RiskLevel::Low => {
            format!("Stock levels are healthy for the next {days_until_stockout} days.")
        }
    };

    StockOptimization {
        product_id: item.id.clone(),
        days_until_stockout,
        suggested_restock_quantity,
        risk_level,
        recommendation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::TrendDirection;

    fn prediction(predicted: u32) -> PredictionOutput {
        PredictionOutput {
            product_id: ProductId::new("prod-1"),
            predicted_quantity_tomorrow: predicted,
            probability_percent: 80,
            confidence_percent: 75,
            trend_direction: TrendDirection::Stable,
            active_event_impact: None,
        }
    }

    fn item(current_stock: u32, average_sell_rate: f64) -> StockItem {
        StockItem {
            id: ProductId::new("prod-1"),
            name: "Cola 330ml".to_string(),
            current_stock,
            average_sell_rate,
        }
    }

    #[test]
    fn imminent_stockout_is_high_risk() {
        let result = optimize_stock(&item(5, 10.0), &prediction(10), 3);

        // projected = (10 + 10) / 2 = 10, days = floor(5 / 10) = 0.
        assert_eq!(result.days_until_stockout, 0);
        assert_eq!(result.risk_level, RiskLevel::High);
        // round(10 * (14 + 3)) - 5 = 165.
        assert_eq!(result.suggested_restock_quantity, 165);
        assert_eq!(
            result.recommendation,
            "CRITICAL: Order 165 units immediately to avoid stockout."
        );
    }

    #[test]
    fn zero_demand_reports_no_foreseeable_stockout() {
        let result = optimize_stock(&item(50, 0.0), &prediction(0), 3);

        assert_eq!(result.days_until_stockout, NO_STOCKOUT_SENTINEL);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert_eq!(result.suggested_restock_quantity, 0);
        assert_eq!(
            result.recommendation,
            "Stock levels are healthy for the next 999 days."
        );
    }

    #[test]
    fn medium_risk_inside_lead_time_plus_buffer() {
        // projected = 10, days = floor(50 / 10) = 5, lead 3 => 3 < 5 <= 7.
        let result = optimize_stock(&item(50, 10.0), &prediction(10), 3);

        assert_eq!(result.days_until_stockout, 5);
        assert_eq!(result.risk_level, RiskLevel::Medium);
        // round(10 * 17) - 50 = 120.
        assert_eq!(result.suggested_restock_quantity, 120);
        assert_eq!(
            result.recommendation,
            "Warning: Consider restocking 120 units soon."
        );
    }

    #[test]
    fn ample_stock_is_low_risk() {
        let result = optimize_stock(&item(500, 10.0), &prediction(10), 3);

        assert_eq!(result.days_until_stockout, 50);
        assert_eq!(result.risk_level, RiskLevel::Low);
        // Target of round(10 * 17) = 170 is already covered.
        assert_eq!(result.suggested_restock_quantity, 0);
        assert_eq!(
            result.recommendation,
            "Stock levels are healthy for the next 50 days."
        );
    }

    #[test]
    fn lead_time_widens_the_high_risk_window() {
        // days = 5 is High once the lead time reaches 5.
        let result = optimize_stock(&item(50, 10.0), &prediction(10), 5);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn suggested_quantity_never_goes_negative() {
        let result = optimize_stock(&item(10_000, 1.0), &prediction(1), 3);
        assert_eq!(result.suggested_restock_quantity, 0);
    }
}
