//! Per-product insight jobs.
//!
//! A job bundles one product's read-model snapshot with the shared calendar
//! events and a reference date, and chains detector, predictor, and optimizer
//! into one [`InsightReport`]. Jobs are independent of each other; a batch of
//! N products is N jobs with no ordering constraints between them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use kassa_core::ProductId;

use crate::anomaly::{AnomalyDetector, TimeSeriesPoint};
use crate::forecast::{CalendarEvent, DailyStat, predict_demand};
use crate::restock::{DEFAULT_LEAD_TIME_DAYS, StockItem, optimize_stock};
use crate::result::{InsightError, InsightReport};

/// The read-model row a host hands to one job: identity, category, sales
/// history, and the current inventory position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    /// Daily sales history in ascending date order (caller contract).
    pub daily_stats: Vec<DailyStat>,
    pub current_stock: u32,
    pub average_sell_rate: f64,
}

/// A single-product analytics unit.
///
/// Inputs are provided by callers (infra/workers); this crate stays
/// storage-agnostic.
pub trait InsightJob: Send + Sync + 'static {
    type Input: Send + Sync + 'static;

    /// The product this job computes insights for.
    fn product_id(&self) -> &ProductId;

    /// The input snapshot the job will run on.
    fn input(&self) -> &Self::Input;

    /// Execute the analytics pass.
    ///
    /// Must not mutate domain state.
    fn run(&self) -> Result<InsightReport, InsightError>;
}

/// Job running the full pipeline for one product: anomaly check over the
/// sales series, next-day demand forecast, restock recommendation.
#[derive(Debug, Clone)]
pub struct ProductInsightJob {
    input: ProductSnapshot,
    events: Vec<CalendarEvent>,
    /// The caller's "today"; the forecast targets the following day.
    reference_date: NaiveDate,
    lead_time_days: u32,
    detector: AnomalyDetector,
}

impl ProductInsightJob {
    pub fn new(input: ProductSnapshot, reference_date: NaiveDate) -> Self {
        Self {
            input,
            events: Vec::new(),
            reference_date,
            lead_time_days: DEFAULT_LEAD_TIME_DAYS,
            detector: AnomalyDetector::default(),
        }
    }

    pub fn with_events(mut self, events: Vec<CalendarEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn with_lead_time_days(mut self, lead_time_days: u32) -> Self {
        self.lead_time_days = lead_time_days;
        self
    }

    pub fn with_detector(mut self, detector: AnomalyDetector) -> Self {
        self.detector = detector;
        self
    }

    fn validate(&self) -> Result<(), InsightError> {
        let z = self.detector.z_threshold();
        if !(z.is_finite() && z > 0.0) {
            return Err(InsightError::InvalidConfig(
                "z_threshold must be a finite positive number".to_string(),
            ));
        }
        if self.detector.drop_window() == 0 {
            return Err(InsightError::InvalidConfig(
                "drop_window must be at least 1".to_string(),
            ));
        }
        let pct = self.detector.drop_threshold_pct();
        if !(pct.is_finite() && pct > 0.0) {
            return Err(InsightError::InvalidConfig(
                "drop_threshold_pct must be a finite positive number".to_string(),
            ));
        }
        Ok(())
    }
}

impl InsightJob for ProductInsightJob {
    type Input = ProductSnapshot;

    fn product_id(&self) -> &ProductId {
        &self.input.product_id
    }

    fn input(&self) -> &Self::Input {
        &self.input
    }

    fn run(&self) -> Result<InsightReport, InsightError> {
        self.validate()?;

        let series: Vec<TimeSeriesPoint> = self
            .input
            .daily_stats
            .iter()
            .map(|stat| TimeSeriesPoint {
                date: stat.date,
                value: stat.quantity_sold as f64,
            })
            .collect();
        let alerts = self.detector.run_comprehensive_check(&series);

        let prediction = predict_demand(
            self.input.product_id.clone(),
            &self.input.category,
            &self.input.daily_stats,
            &self.events,
            self.reference_date,
        );

        let item = StockItem {
            id: self.input.product_id.clone(),
            name: self.input.name.clone(),
            current_stock: self.input.current_stock,
            average_sell_rate: self.input.average_sell_rate,
        };
        let restock = optimize_stock(&item, &prediction, self.lead_time_days);

        Ok(InsightReport {
            alerts,
            prediction,
            restock,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(offset: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(offset as i64)
    }

    fn snapshot(quantities: &[u32]) -> ProductSnapshot {
        ProductSnapshot {
            product_id: ProductId::new("prod-1"),
            name: "Cola 330ml".to_string(),
            category: "beverages".to_string(),
            daily_stats: quantities
                .iter()
                .enumerate()
                .map(|(i, &quantity_sold)| DailyStat {
                    date: day(i as u32),
                    quantity_sold,
                })
                .collect(),
            current_stock: 50,
            average_sell_rate: 10.0,
        }
    }

    #[test]
    fn job_chains_detector_predictor_and_optimizer() {
        let job = ProductInsightJob::new(snapshot(&[10; 14]), day(13));
        let report = job.run().unwrap();

        assert!(report.alerts.is_empty());
        assert_eq!(report.prediction.predicted_quantity_tomorrow, 10);
        assert_eq!(report.restock.product_id, ProductId::new("prod-1"));
        assert_eq!(report.restock.days_until_stockout, 5);
    }

    #[test]
    fn job_rejects_non_finite_z_threshold() {
        let job = ProductInsightJob::new(snapshot(&[10; 14]), day(13))
            .with_detector(AnomalyDetector::new().with_z_threshold(f64::NAN));

        let err = job.run().unwrap_err();
        match err {
            InsightError::InvalidConfig(msg) => assert!(msg.contains("z_threshold")),
        }
    }

    #[test]
    fn job_rejects_zero_drop_window() {
        let job = ProductInsightJob::new(snapshot(&[10; 14]), day(13))
            .with_detector(AnomalyDetector::new().with_drop_window(0));

        assert!(job.run().is_err());
    }

    #[test]
    fn job_surfaces_anomalies_from_the_sales_history() {
        let mut quantities = vec![100u32; 7];
        quantities.push(0); // collapse on the last day
        let job = ProductInsightJob::new(snapshot(&quantities), day(7));

        let report = job.run().unwrap();
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(
            report.alerts[0].severity,
            crate::anomaly::AlertSeverity::Critical
        );
    }
}
