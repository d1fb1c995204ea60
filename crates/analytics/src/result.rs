//! Combined analytics output and the job-boundary error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::anomaly::OutlierAlert;
use crate::forecast::PredictionOutput;
use crate::restock::StockOptimization;

/// Everything the analytics core produces for one product in one pass:
/// deduplicated alerts, the next-day forecast, and the restock recommendation.
///
/// This is an insight payload for display and restock workflows, not a domain
/// event; producing it mutates nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightReport {
    pub alerts: Vec<OutlierAlert>,
    pub prediction: PredictionOutput,
    pub restock: StockOptimization,
}

/// Error at the job boundary.
///
/// The pure analytics functions themselves never fail; degenerate inputs
/// degrade to documented sentinels. Only a misconfigured job (e.g. a
/// non-finite threshold) is rejected.
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("invalid job configuration: {0}")]
    InvalidConfig(String),
}
