//! Descriptive statistics. Undefined results (empty input, zero divisors, single-sample
//! deviations) are `f64::NAN`, never a panic.

use crate::model::DetectionRecord;
use serde::Serialize;
use statrs::statistics::Statistics;

fn finite(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// Mean over the finite values; blanks read as NaN are skipped.
pub fn mean(values: &[f64]) -> f64 {
    let values = finite(values);
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().mean()
}

/// Sample standard deviation with the (n - 1) estimator over the finite values. Fewer
/// than two of them yields NaN.
pub fn std_dev(values: &[f64]) -> f64 {
    let values = finite(values);
    if values.len() < 2 {
        return f64::NAN;
    }
    values.iter().std_dev()
}

/// Combines per-run standard deviations as the root-mean-square of their variances.
/// Non-finite entries are ignored.
pub fn combined_std_dev(std_devs: &[f64]) -> f64 {
    let variances: Vec<f64> = std_devs
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .map(|v| v * v)
        .collect();
    if variances.is_empty() {
        return f64::NAN;
    }
    mean(&variances).sqrt()
}

/// Fraction of records flagged correct, over all records.
pub fn accuracy_ratio(records: &[DetectionRecord]) -> f64 {
    if records.is_empty() {
        return f64::NAN;
    }
    let correct = records.iter().filter(|record| record.is_correct).count();
    correct as f64 / records.len() as f64
}

pub fn fps(mean_time: f64) -> f64 {
    if mean_time == 0.0 || !mean_time.is_finite() {
        return f64::NAN;
    }
    1.0 / mean_time
}

/// Min-max normalisation. A zero range leaves every value undefined.
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let range = max - min;
    values
        .iter()
        .map(|v| {
            if !v.is_finite() || !range.is_finite() || range == 0.0 {
                f64::NAN
            } else {
                (v - min) / range
            }
        })
        .collect()
}

/// Linear-interpolated quantile over the finite values.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(quantile_sorted(&sorted, q))
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q * (sorted.len() as f64 - 1.0);
    let idx = pos.floor() as usize;
    let frac = pos - idx as f64;
    let a = sorted[idx];
    let b = sorted[(idx + 1).min(sorted.len() - 1)];
    a + (b - a) * frac
}

/// Box-plot figures with whiskers at the furthest observations inside 1.5 IQR.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxSummary {
    pub count: usize,
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
}

impl BoxSummary {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        let q1 = quantile_sorted(&sorted, 0.25);
        let median = quantile_sorted(&sorted, 0.5);
        let q3 = quantile_sorted(&sorted, 0.75);
        let iqr = q3 - q1;
        let low_fence = q1 - 1.5 * iqr;
        let high_fence = q3 + 1.5 * iqr;

        let lower_whisker = sorted
            .iter()
            .copied()
            .find(|v| *v >= low_fence)
            .unwrap_or(q1);
        let upper_whisker = sorted
            .iter()
            .rev()
            .copied()
            .find(|v| *v <= high_fence)
            .unwrap_or(q3);

        Some(Self {
            count: sorted.len(),
            lower_whisker,
            q1,
            median,
            q3,
            upper_whisker,
        })
    }
}
