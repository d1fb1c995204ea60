//! Next-day demand prediction for one product.
//!
//! Blends a weighted moving average of recent sales with the least-squares
//! trend, weekday seasonality, and calendar-event multipliers, and attaches a
//! confidence estimate. "Tomorrow" is derived from an explicit reference date
//! so callers (and tests) control the clock.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use kassa_core::ProductId;

/// Moving-average window for the forecast formula.
pub const FORECAST_WINDOW: usize = 7;

/// |slope| below which the trend is reported as stable.
const TREND_SLOPE_THRESHOLD: f64 = 0.5;

/// Days of history at which data-volume confidence saturates.
const FULL_CONFIDENCE_DAYS: f64 = 30.0;

/// Fixed design constants for the confidence/probability model.
const EVENT_STABILITY_PENALTY: f64 = 10.0;
const EVENT_STABILITY_FLOOR: f64 = 50.0;
const SLOPE_PROBABILITY_PENALTY: f64 = 5.0;

/// One day of recorded sales for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStat {
    pub date: NaiveDate,
    pub quantity_sold: u32,
}

/// A date range during which named categories see elevated or depressed
/// demand. Keys of `affected_categories` are lowercase category names; values
/// are positive multipliers. Multipliers compose multiplicatively across
/// overlapping events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub affected_categories: HashMap<String, f64>,
}

impl CalendarEvent {
    /// Whether the event's inclusive `[start_date, end_date]` range covers `date`.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Direction of the recent sales trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

/// Next-day demand forecast for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionOutput {
    pub product_id: ProductId,
    pub predicted_quantity_tomorrow: u32,
    /// In [10, 99].
    pub probability_percent: u8,
    /// In [0, 100].
    pub confidence_percent: u8,
    pub trend_direction: TrendDirection,
    /// Set only when a calendar event affected the forecast.
    pub active_event_impact: Option<String>,
}

/// Unweighted average of the last `window` values; 0.0 if fewer exist.
pub fn simple_moving_average(values: &[f64], window: usize) -> f64 {
    if window == 0 || values.len() < window {
        return 0.0;
    }
    let tail = &values[values.len() - window..];
    tail.iter().sum::<f64>() / window as f64
}

/// Average of the last `window` values weighted linearly 1..=window
/// (oldest to newest, newest weighted highest); 0.0 if fewer exist.
pub fn weighted_moving_average(values: &[f64], window: usize) -> f64 {
    if window == 0 || values.len() < window {
        return 0.0;
    }
    let tail = &values[values.len() - window..];
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for (i, value) in tail.iter().enumerate() {
        let weight = (i + 1) as f64;
        weighted_sum += weight * value;
        weight_total += weight;
    }
    weighted_sum / weight_total
}

/// Ordinary least-squares slope of value against 0-based index; 0.0 if fewer
/// than 2 points.
pub fn trend_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let nf = n as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    for (i, value) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += value;
        sum_xy += x * value;
        sum_xx += x * x;
    }

    let denominator = nf * sum_xx - sum_x * sum_x;
    if denominator == 0.0 {
        return 0.0;
    }
    (nf * sum_xy - sum_x * sum_y) / denominator
}

/// Ratio of the target weekday's historical average to the overall average.
///
/// Defaults to 1.0 when no same-weekday history exists or the overall average
/// is 0.
pub fn weekday_seasonality_factor(stats: &[DailyStat], target: NaiveDate) -> f64 {
    if stats.is_empty() {
        return 1.0;
    }

    let overall =
        stats.iter().map(|s| s.quantity_sold as f64).sum::<f64>() / stats.len() as f64;
    if overall == 0.0 {
        return 1.0;
    }

    let weekday = target.weekday();
    let same_weekday: Vec<f64> = stats
        .iter()
        .filter(|s| s.date.weekday() == weekday)
        .map(|s| s.quantity_sold as f64)
        .collect();
    if same_weekday.is_empty() {
        return 1.0;
    }

    let weekday_avg = same_weekday.iter().sum::<f64>() / same_weekday.len() as f64;
    weekday_avg / overall
}

/// Product of all event multipliers active on `target` for `category`
/// (case-insensitive lookup), plus the name of the last matching event.
///
/// Identity 1.0 and `None` when nothing matches.
pub fn event_multiplier<'a>(
    events: &'a [CalendarEvent],
    category: &str,
    target: NaiveDate,
) -> (f64, Option<&'a str>) {
    let key = category.to_lowercase();
    let mut multiplier = 1.0;
    let mut last_match = None;

    for event in events {
        if !event.is_active_on(target) {
            continue;
        }
        if let Some(factor) = event.affected_categories.get(&key) {
            multiplier *= factor;
            last_match = Some(event.name.as_str());
        }
    }
    (multiplier, last_match)
}

/// Forecast tomorrow's demand for one product.
///
/// `reference_date` is the caller's notion of "today"; the forecast targets
/// the following day. Formula:
/// `max(0, round((WMA7 + slope) * seasonality * event_multiplier))`.
pub fn predict_demand(
    product_id: ProductId,
    category: &str,
    stats: &[DailyStat],
    events: &[CalendarEvent],
    reference_date: NaiveDate,
) -> PredictionOutput {
    let values: Vec<f64> = stats.iter().map(|s| s.quantity_sold as f64).collect();
    let tomorrow = reference_date.succ_opt().unwrap_or(reference_date);

    let wma = weighted_moving_average(&values, FORECAST_WINDOW);
    let sma = simple_moving_average(&values, FORECAST_WINDOW);
    let slope = trend_slope(&values);
    let seasonality = weekday_seasonality_factor(stats, tomorrow);
    let (multiplier, event_name) = event_multiplier(events, category, tomorrow);

    let predicted = ((wma + slope) * seasonality * multiplier).round().max(0.0) as u32;

    let trend_direction = if slope > TREND_SLOPE_THRESHOLD {
        TrendDirection::Rising
    } else if slope < -TREND_SLOPE_THRESHOLD {
        TrendDirection::Falling
    } else {
        TrendDirection::Stable
    };

    let data_volume_confidence = (values.len() as f64 / FULL_CONFIDENCE_DAYS * 100.0).min(100.0);
    let mut stability_confidence = (100.0 - 10.0 * (wma - sma).abs()).max(0.0);
    if multiplier != 1.0 {
        // Event-driven demand is inherently less stable.
        stability_confidence =
            (stability_confidence - EVENT_STABILITY_PENALTY).max(EVENT_STABILITY_FLOOR);
    }
    let confidence = (0.4 * data_volume_confidence + 0.6 * stability_confidence).round();
    let probability = (confidence - SLOPE_PROBABILITY_PENALTY * slope.abs())
        .round()
        .clamp(10.0, 99.0);

    PredictionOutput {
        product_id,
        predicted_quantity_tomorrow: predicted,
        probability_percent: probability as u8,
        confidence_percent: confidence as u8,
        trend_direction,
        active_event_impact: event_name.map(|name| format!("Boosted by {name}")),
    }
}
