//! `kassa-analytics`
//!
//! **Responsibility:** the sales analytics core of the POS application.
//!
//! Three independent, side-effect-free components:
//! - [`anomaly`] — flags statistically unusual points in a sales time series.
//! - [`forecast`] — estimates tomorrow's demand for one product.
//! - [`restock`] — turns a demand estimate plus current stock into a restock
//!   recommendation and risk tier.
//!
//! Nothing here owns mutable state or performs I/O. Inputs (historical series,
//! calendar events, stock snapshots) come from the surrounding application's
//! persistence layer; outputs are value objects consumed by display and
//! restock-ordering workflows. Per-product computations are fully independent,
//! so a host may batch them via [`runner::LocalInsightRunner`] in any order.

pub mod anomaly;
pub mod forecast;
pub mod job;
pub mod restock;
pub mod result;
pub mod runner;

pub use anomaly::{
    AlertSeverity, AnomalyDetector, DetectionMethod, OutlierAlert, TimeSeriesPoint,
    detect_anomalies,
};
pub use forecast::{CalendarEvent, DailyStat, PredictionOutput, TrendDirection, predict_demand};
pub use job::{InsightJob, ProductInsightJob, ProductSnapshot};
pub use restock::{RiskLevel, StockItem, StockOptimization, optimize_stock};
pub use result::{InsightError, InsightReport};
pub use runner::{InsightRunner, LocalInsightRunner};
