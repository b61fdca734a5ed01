//! Aligns irregular time series to a fixed number of samples so runs of different
//! lengths can be compared point by point.

use crate::model::TimeSeriesSample;
use serde::Serialize;
use std::collections::BTreeSet;

pub const DEFAULT_TARGET_POINTS: usize = 240;
pub const PERCENT_AXIS_MAX: f64 = 100.0;

/// A time series carrying a category label (usually the model) on every row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledSeries {
    pub label: String,
    pub samples: Vec<TimeSeriesSample>,
}

impl LabeledSeries {
    pub fn new(label: impl Into<String>, samples: Vec<TimeSeriesSample>) -> Self {
        Self {
            label: label.into(),
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Rescales `elapsed_time` to percent of the series' maximum. A non-positive maximum
/// puts every sample at zero.
pub fn to_elapsed_percent(samples: &[TimeSeriesSample]) -> Vec<TimeSeriesSample> {
    let max = samples
        .iter()
        .map(|sample| sample.elapsed_time)
        .filter(|t| t.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    samples
        .iter()
        .map(|sample| {
            let elapsed_time = if max > 0.0 {
                sample.elapsed_time / max * PERCENT_AXIS_MAX
            } else {
                0.0
            };
            TimeSeriesSample {
                elapsed_time,
                channels: sample.channels.clone(),
            }
        })
        .collect()
}

/// Keeps samples with `elapsed_time <= max_elapsed`; `None` keeps everything.
pub fn truncate_window(
    samples: &[TimeSeriesSample],
    max_elapsed: Option<f64>,
) -> Vec<TimeSeriesSample> {
    match max_elapsed {
        Some(limit) => samples
            .iter()
            .filter(|sample| sample.elapsed_time <= limit)
            .cloned()
            .collect(),
        None => samples.to_vec(),
    }
}

/// Resamples to exactly `target` rows.
///
/// Shorter series are linearly interpolated at `target` evenly spaced coordinates over
/// `[0, 100]`, clamping outside the observed range. Each channel interpolates only over
/// the rows where it holds a finite value. Longer series keep `target` evenly
/// spaced indices (first and last included, rounded to nearest). A series already of
/// length `target` is returned as-is. An empty series stays empty.
pub fn resample(series: &LabeledSeries, target: usize) -> LabeledSeries {
    let mut samples = series.samples.clone();
    samples.sort_by(|a, b| a.elapsed_time.total_cmp(&b.elapsed_time));

    let resampled = if samples.len() == target || samples.is_empty() {
        samples
    } else if samples.len() < target {
        interpolate(&samples, target)
    } else {
        downsample_indices(samples.len(), target)
            .into_iter()
            .map(|idx| samples[idx].clone())
            .collect()
    };

    LabeledSeries {
        label: series.label.clone(),
        samples: resampled,
    }
}

pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| if i == count - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

fn downsample_indices(len: usize, target: usize) -> Vec<usize> {
    linspace(0.0, (len - 1) as f64, target)
        .into_iter()
        .map(|pos| (pos.round() as usize).min(len - 1))
        .collect()
}

fn interpolate(samples: &[TimeSeriesSample], target: usize) -> Vec<TimeSeriesSample> {
    let coords = linspace(0.0, PERCENT_AXIS_MAX, target);
    let mut out: Vec<TimeSeriesSample> = coords.iter().map(|t| TimeSeriesSample::new(*t)).collect();

    let names: BTreeSet<&String> = samples
        .iter()
        .flat_map(|sample| sample.channels.keys())
        .collect();
    for name in names {
        let (xs, ys): (Vec<f64>, Vec<f64>) = samples
            .iter()
            .filter_map(|sample| sample.channels.get(name).map(|v| (sample.elapsed_time, *v)))
            .filter(|(t, v)| t.is_finite() && v.is_finite())
            .unzip();
        for (row, t) in out.iter_mut().zip(&coords) {
            row.channels.insert(name.clone(), interp(*t, &xs, &ys));
        }
    }
    out
}

/// Piecewise-linear interpolation over ascending `xs`, clamped to the end values.
pub fn interp(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    let (Some(&first_x), Some(&last_x)) = (xs.first(), xs.last()) else {
        return f64::NAN;
    };
    if x <= first_x {
        return ys[0];
    }
    if x >= last_x {
        return ys[ys.len() - 1];
    }
    let hi = xs.partition_point(|v| *v <= x);
    let lo = hi - 1;
    let span = xs[hi] - xs[lo];
    if span == 0.0 {
        return ys[lo];
    }
    ys[lo] + (ys[hi] - ys[lo]) * (x - xs[lo]) / span
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALUE: &str = "value";

    fn series(len: usize, step: f64) -> LabeledSeries {
        let samples = (0..len)
            .map(|i| {
                let t = i as f64 * step;
                TimeSeriesSample::new(t).with_channel(VALUE, 2.0 * t)
            })
            .collect();
        LabeledSeries::new("yolov8s", samples)
    }

    #[test]
    fn downsampling_yields_target_rows() {
        let out = resample(&series(300, 1.0), 240);
        assert_eq!(out.len(), 240);
        assert_eq!(out.samples[0].elapsed_time, 0.0);
        assert_eq!(out.samples[239].elapsed_time, 299.0);
        assert_eq!(out.label, "yolov8s");
    }

    #[test]
    fn downsampling_rounds_to_nearest_index() {
        assert_eq!(downsample_indices(5, 3), vec![0, 2, 4]);
        assert_eq!(downsample_indices(6, 4), vec![0, 2, 3, 5]);
    }

    #[test]
    fn upsampling_yields_target_rows() {
        let out = resample(&series(100, 1.0), 240);
        assert_eq!(out.len(), 240);
        assert_eq!(out.samples[0].elapsed_time, 0.0);
        assert_eq!(out.samples[239].elapsed_time, 100.0);
    }

    #[test]
    fn exact_length_is_identity() {
        let input = series(240, 0.5);
        assert_eq!(resample(&input, 240), input);
    }

    #[test]
    fn linear_series_survives_interpolation() {
        let input = series(101, 1.0);
        let out = resample(&input, 240);
        assert_eq!(out.len(), 240);
        for sample in &out.samples {
            let value = sample.channel(VALUE).unwrap();
            assert!((value - 2.0 * sample.elapsed_time).abs() < 1e-9);
        }
    }

    #[test]
    fn interpolation_clamps_outside_observed_range() {
        let samples = vec![
            TimeSeriesSample::new(20.0).with_channel(VALUE, 5.0),
            TimeSeriesSample::new(60.0).with_channel(VALUE, 9.0),
        ];
        let out = resample(&LabeledSeries::new("m", samples), 5);
        let values: Vec<f64> = out
            .samples
            .iter()
            .map(|sample| sample.channel(VALUE).unwrap())
            .collect();
        assert_eq!(values, vec![5.0, 5.5, 8.0, 9.0, 9.0]);
    }

    #[test]
    fn blank_channel_cells_do_not_poison_neighbours() {
        use crate::extract::{parse_time_series, RESOURCE_USAGES_SHEET};
        use crate::model::{ELAPSED_TIME, MEMORY_MB};
        use calamine::Data;
        use std::path::Path;

        let rows = vec![
            vec![
                Data::String(ELAPSED_TIME.to_string()),
                Data::String(MEMORY_MB.to_string()),
            ],
            vec![Data::Float(0.0), Data::Float(100.0)],
            vec![Data::Float(50.0), Data::Empty],
            vec![Data::Float(100.0), Data::Float(300.0)],
        ];
        let samples =
            parse_time_series(Path::new("run.xlsx"), RESOURCE_USAGES_SHEET, &[ELAPSED_TIME], rows)
                .unwrap();
        let out = resample(&LabeledSeries::new("m", samples), 5);
        let values: Vec<f64> = out
            .samples
            .iter()
            .map(|sample| sample.channel(MEMORY_MB).unwrap())
            .collect();
        assert_eq!(values, vec![100.0, 150.0, 200.0, 250.0, 300.0]);
    }

    #[test]
    fn unsorted_input_is_ordered_before_resampling() {
        let samples = vec![
            TimeSeriesSample::new(100.0).with_channel(VALUE, 1.0),
            TimeSeriesSample::new(0.0).with_channel(VALUE, 0.0),
        ];
        let out = resample(&LabeledSeries::new("m", samples), 3);
        assert_eq!(out.samples[1].channel(VALUE), Some(0.5));
    }

    #[test]
    fn empty_series_stays_empty() {
        let out = resample(&LabeledSeries::new("m", Vec::new()), 240);
        assert!(out.is_empty());
    }

    #[test]
    fn percent_axis_scales_to_maximum() {
        let samples = vec![
            TimeSeriesSample::new(0.0),
            TimeSeriesSample::new(2.0),
            TimeSeriesSample::new(8.0),
        ];
        let percent: Vec<f64> = to_elapsed_percent(&samples)
            .iter()
            .map(|sample| sample.elapsed_time)
            .collect();
        assert_eq!(percent, vec![0.0, 25.0, 100.0]);
    }

    #[test]
    fn window_keeps_samples_up_to_limit() {
        let samples: Vec<TimeSeriesSample> =
            (0..5).map(|i| TimeSeriesSample::new(i as f64 * 100.0)).collect();
        assert_eq!(truncate_window(&samples, Some(200.0)).len(), 3);
        assert_eq!(truncate_window(&samples, None).len(), 5);
    }
}
