//! In-process execution of insight jobs.
//!
//! Jobs are stateless and independent, so a batch over N products has no
//! ordering constraints; this runner executes them sequentially and leaves
//! fan-out across threads to the host.

use tracing::{debug, warn};

use crate::job::InsightJob;
use crate::result::{InsightError, InsightReport};

/// Runner/executor for insight jobs.
///
/// Intentionally minimal and storage/runtime agnostic.
pub trait InsightRunner: Send + Sync + 'static {
    fn run<J: InsightJob>(&self, job: &J) -> Result<InsightReport, InsightError> {
        job.run()
    }

    /// Execute every job independently, preserving input order in the output.
    fn run_batch<J: InsightJob>(&self, jobs: &[J]) -> Vec<Result<InsightReport, InsightError>> {
        jobs.iter().map(|job| self.run(job)).collect()
    }
}

/// Simple synchronous runner that executes jobs immediately in-process.
#[derive(Debug, Copy, Clone, Default)]
pub struct LocalInsightRunner;

impl LocalInsightRunner {
    pub fn new() -> Self {
        Self
    }
}

impl InsightRunner for LocalInsightRunner {
    fn run<J: InsightJob>(&self, job: &J) -> Result<InsightReport, InsightError> {
        let result = job.run();
        match &result {
            Ok(report) => debug!(
                product_id = %job.product_id(),
                alerts = report.alerts.len(),
                predicted = report.prediction.predicted_quantity_tomorrow,
                "insight job completed"
            ),
            Err(err) => warn!(
                product_id = %job.product_id(),
                error = %err,
                "insight job failed"
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::AnomalyDetector;
    use crate::forecast::DailyStat;
    use crate::job::{ProductInsightJob, ProductSnapshot};
    use chrono::NaiveDate;
    use kassa_core::ProductId;

    fn day(offset: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(offset as i64)
    }

    fn snapshot(id: &str, quantities: &[u32]) -> ProductSnapshot {
        ProductSnapshot {
            product_id: ProductId::new(id),
            name: id.to_string(),
            category: "beverages".to_string(),
            daily_stats: quantities
                .iter()
                .enumerate()
                .map(|(i, &quantity_sold)| DailyStat {
                    date: day(i as u32),
                    quantity_sold,
                })
                .collect(),
            current_stock: 40,
            average_sell_rate: 8.0,
        }
    }

    #[test]
    fn batch_preserves_input_order_and_runs_every_job() {
        let jobs = vec![
            ProductInsightJob::new(snapshot("prod-a", &[5; 10]), day(9)),
            ProductInsightJob::new(snapshot("prod-b", &[20; 10]), day(9)),
        ];

        let reports = LocalInsightRunner::new().run_batch(&jobs);

        assert_eq!(reports.len(), 2);
        let first = reports[0].as_ref().unwrap();
        let second = reports[1].as_ref().unwrap();
        assert_eq!(first.prediction.product_id, ProductId::new("prod-a"));
        assert_eq!(second.prediction.product_id, ProductId::new("prod-b"));
    }

    #[test]
    fn batch_keeps_failures_isolated_per_job() {
        let jobs = vec![
            ProductInsightJob::new(snapshot("prod-ok", &[5; 10]), day(9)),
            ProductInsightJob::new(snapshot("prod-bad", &[5; 10]), day(9))
                .with_detector(AnomalyDetector::new().with_drop_window(0)),
        ];

        let reports = LocalInsightRunner::new().run_batch(&jobs);

        assert!(reports[0].is_ok());
        assert!(reports[1].is_err());
    }
}
