//! Anomaly detection over a single product's sales time series.
//!
//! Three independent statistical signals (z-score, IQR fences, sudden trailing
//! drops) plus a fusion step that deduplicates by date and keeps the most
//! severe alert per day.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One observation in a sales series.
///
/// Callers must supply points in ascending date order; the windowed detectors
/// assume it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Which detector produced an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DetectionMethod {
    ZScore,
    Iqr,
    RollingMean,
    SuddenDrop,
}

/// Alert severity.
///
/// Declaration order defines the ranking used for deduplication:
/// critical > warning > success > info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Success,
    Warning,
    Critical,
}

/// An anomaly flagged on one date. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierAlert {
    pub date: NaiveDate,
    pub value: f64,
    pub method: DetectionMethod,
    pub severity: AlertSeverity,
    pub title: String,
    pub explanation: String,
}

/// Statistical anomaly detector for one ordered time series.
///
/// Each detector is a pure function of the series; `run_comprehensive_check`
/// fuses all of them into one deduplicated, severity-ranked alert stream.
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    /// |z| above which a point is flagged.
    z_threshold: f64,
    /// Trailing window length for sudden-drop detection.
    drop_window: usize,
    /// Percent drop (vs. the trailing window mean) that counts as sudden.
    drop_threshold_pct: f64,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self {
            z_threshold: 2.5,
            drop_window: 7,
            drop_threshold_pct: 40.0,
        }
    }
}

impl AnomalyDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_z_threshold(mut self, z_threshold: f64) -> Self {
        self.z_threshold = z_threshold;
        self
    }

    pub fn with_drop_window(mut self, drop_window: usize) -> Self {
        self.drop_window = drop_window;
        self
    }

    pub fn with_drop_threshold_pct(mut self, drop_threshold_pct: f64) -> Self {
        self.drop_threshold_pct = drop_threshold_pct;
        self
    }

    pub fn z_threshold(&self) -> f64 {
        self.z_threshold
    }

    pub fn drop_window(&self) -> usize {
        self.drop_window
    }

    pub fn drop_threshold_pct(&self) -> f64 {
        self.drop_threshold_pct
    }

    /// Flag points whose z-score against the whole-series population mean and
    /// standard deviation exceeds the threshold.
    ///
    /// A constant series (population stddev 0) yields no alerts.
    pub fn detect_z_score_anomalies(&self, series: &[TimeSeriesPoint]) -> Vec<OutlierAlert> {
        if series.is_empty() {
            return Vec::new();
        }

        let values: Vec<f64> = series.iter().map(|p| p.value).collect();
        let mu = mean(&values);
        let sigma = stddev_population(&values, mu);

        if sigma <= f64::EPSILON {
            return Vec::new();
        }

        let mut alerts = Vec::new();
        for point in series {
            let z = (point.value - mu) / sigma;
            if z.abs() <= self.z_threshold {
                continue;
            }

            let deviation_pct = ((point.value - mu).abs() / mu.max(1.0) * 100.0).round();
            let (severity, title) = if z > 0.0 {
                (AlertSeverity::Success, "Sudden Popularity Spike")
            } else {
                (AlertSeverity::Warning, "Unusual Activity Drop")
            };

            alerts.push(OutlierAlert {
                date: point.date,
                value: point.value,
                method: DetectionMethod::ZScore,
                severity,
                title: title.to_string(),
                explanation: format!(
                    "sales of {:.0} deviate {deviation_pct:.0}% from the series mean of {mu:.2}",
                    point.value
                ),
            });
        }
        alerts
    }

    /// Flag points outside the Tukey fences `[Q1 - 1.5*IQR, Q3 + 1.5*IQR]`.
    ///
    /// Quartiles are taken by floor-indexing into the sorted values
    /// (`sorted[floor(n*0.25)]` / `sorted[floor(n*0.75)]`), not by
    /// interpolation. Requires at least 4 points.
    pub fn detect_iqr_anomalies(&self, series: &[TimeSeriesPoint]) -> Vec<OutlierAlert> {
        let n = series.len();
        if n < 4 {
            return Vec::new();
        }

        let mut sorted: Vec<f64> = series.iter().map(|p| p.value).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let q1 = sorted[(n as f64 * 0.25).floor() as usize];
        let q3 = sorted[(n as f64 * 0.75).floor() as usize];
        let iqr = q3 - q1;
        let lower_fence = q1 - 1.5 * iqr;
        let upper_fence = q3 + 1.5 * iqr;

        let mut alerts = Vec::new();
        for point in series {
            let (severity, title) = if point.value > upper_fence {
                (AlertSeverity::Success, "Unusually High Sales Volume")
            } else if point.value < lower_fence {
                (AlertSeverity::Warning, "Unusually Low Sales Volume")
            } else {
                continue;
            };

            alerts.push(OutlierAlert {
                date: point.date,
                value: point.value,
                method: DetectionMethod::Iqr,
                severity,
                title: title.to_string(),
                explanation: format!(
                    "sales of {:.0} fall outside the expected range {lower_fence:.2} to {upper_fence:.2}",
                    point.value
                ),
            });
        }
        alerts
    }

    /// Flag points that drop sharply below the mean of the trailing window
    /// (the `drop_window` values immediately before the point, excluding it).
    ///
    /// Windows with mean 0 are skipped. Requires at least `drop_window + 1`
    /// points.
    pub fn detect_sudden_drops(&self, series: &[TimeSeriesPoint]) -> Vec<OutlierAlert> {
        let window = self.drop_window;
        if window == 0 || series.len() < window + 1 {
            return Vec::new();
        }

        let mut alerts = Vec::new();
        for i in window..series.len() {
            let trailing: Vec<f64> = series[i - window..i].iter().map(|p| p.value).collect();
            let window_mean = mean(&trailing);
            if window_mean <= f64::EPSILON {
                continue;
            }

            let drop_pct = (window_mean - series[i].value) / window_mean * 100.0;
            if drop_pct < self.drop_threshold_pct {
                continue;
            }

            alerts.push(OutlierAlert {
                date: series[i].date,
                value: series[i].value,
                method: DetectionMethod::SuddenDrop,
                severity: AlertSeverity::Critical,
                title: "Possible Supply Issue".to_string(),
                explanation: format!(
                    "sales of {:.0} are {:.0}% below the {window}-day average of {window_mean:.2}",
                    series[i].value,
                    drop_pct.round()
                ),
            });
        }
        alerts
    }

    /// Run every detector, then deduplicate by date keeping the alert with the
    /// strictly highest severity (first-seen wins ties). Returns alerts sorted
    /// by date descending.
    pub fn run_comprehensive_check(&self, series: &[TimeSeriesPoint]) -> Vec<OutlierAlert> {
        let mut best_by_date: BTreeMap<NaiveDate, OutlierAlert> = BTreeMap::new();

        let candidates = self
            .detect_z_score_anomalies(series)
            .into_iter()
            .chain(self.detect_iqr_anomalies(series))
            .chain(self.detect_sudden_drops(series));

        for alert in candidates {
            match best_by_date.entry(alert.date) {
                Entry::Vacant(slot) => {
                    slot.insert(alert);
                }
                Entry::Occupied(mut slot) => {
                    // Replace only on strictly greater rank; earlier candidates win ties.
                    if alert.severity > slot.get().severity {
                        slot.insert(alert);
                    }
                }
            }
        }

        best_by_date.into_values().rev().collect()
    }
}

/// Comprehensive anomaly check with default thresholds.
///
/// This is the public boundary used by the surrounding application; callers
/// needing custom thresholds construct an [`AnomalyDetector`] instead.
pub fn detect_anomalies(series: &[TimeSeriesPoint]) -> Vec<OutlierAlert> {
    AnomalyDetector::default().run_comprehensive_check(series)
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / (xs.len() as f64)
}

/// Population standard deviation (divides by n), deterministic.
fn stddev_population(xs: &[f64], mean: f64) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let var = xs
        .iter()
        .map(|x| {
            let d = x - mean;
            d * d
        })
        .sum::<f64>()
        / (xs.len() as f64);
    var.sqrt()
}
