use crate::model::{AccuracyRun, DetectionRecord, MainMetadata, PerformanceRun, POWER_WATT};
use crate::stats::{self, BoxSummary};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Groups items by a derived key, preserving input order within each group.
pub fn group_by<K, T, F>(items: impl IntoIterator<Item = T>, mut key: F) -> BTreeMap<K, Vec<T>>
where
    K: Ord,
    F: FnMut(&T) -> K,
{
    let mut groups: BTreeMap<K, Vec<T>> = BTreeMap::new();
    for item in items {
        groups.entry(key(&item)).or_default().push(item);
    }
    groups
}

/// Concatenates the detections of every run that shares a model.
pub fn detections_by_model(runs: &[AccuracyRun]) -> BTreeMap<String, Vec<DetectionRecord>> {
    group_by(runs, |run| run.main.model())
        .into_iter()
        .map(|(model, runs)| {
            let detections: Vec<DetectionRecord> = runs
                .into_iter()
                .flat_map(|run| run.detections.iter().copied())
                .collect();
            (model, detections)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionSummary {
    pub model: String,
    pub detections: usize,
    pub mean_time: f64,
    pub time_std: f64,
    pub accuracy: f64,
    pub mean_score: f64,
    pub score_std: f64,
    pub fps: f64,
}

impl DetectionSummary {
    /// Time and accuracy cover every record; score figures cover correct records only.
    pub fn from_records(model: &str, records: &[DetectionRecord]) -> Self {
        let times: Vec<f64> = records.iter().map(|record| record.time).collect();
        let correct_scores: Vec<f64> = records
            .iter()
            .filter(|record| record.is_correct)
            .map(|record| record.score)
            .collect();
        let mean_time = stats::mean(&times);

        Self {
            model: model.to_string(),
            detections: records.len(),
            mean_time,
            time_std: stats::std_dev(&times),
            accuracy: stats::accuracy_ratio(records),
            mean_score: stats::mean(&correct_scores),
            score_std: stats::std_dev(&correct_scores),
            fps: stats::fps(mean_time),
        }
    }
}

impl fmt::Display for DetectionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model: {}", self.model)?;
        writeln!(f, "Average Detection Time: {}", self.mean_time)?;
        writeln!(f, "Detection Time Std Dev: {}", self.time_std)?;
        writeln!(f, "Average Accuracy: {}", self.accuracy)?;
        writeln!(f, "Average Score: {}", self.mean_score)?;
        writeln!(f, "Score Std Dev: {}", self.score_std)?;
        writeln!(f, "FPS: {}", self.fps)?;
        write!(f, "-----------------------------------")
    }
}

pub fn summarize_detections(runs: &[AccuracyRun]) -> Vec<DetectionSummary> {
    detections_by_model(runs)
        .iter()
        .map(|(model, records)| DetectionSummary::from_records(model, records))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionBreakdown {
    pub model: String,
    pub correct: usize,
    pub incorrect: usize,
    pub correct_pct: f64,
    pub incorrect_pct: f64,
}

pub fn detection_breakdown(runs: &[AccuracyRun]) -> Vec<DetectionBreakdown> {
    detections_by_model(runs)
        .into_iter()
        .map(|(model, records)| {
            let correct = records.iter().filter(|record| record.is_correct).count();
            let incorrect = records.len() - correct;
            let total = records.len();
            let pct = |count: usize| {
                if total > 0 {
                    100.0 * count as f64 / total as f64
                } else {
                    0.0
                }
            };
            DetectionBreakdown {
                model,
                correct,
                incorrect,
                correct_pct: pct(correct),
                incorrect_pct: pct(incorrect),
            }
        })
        .collect()
}

/// Score distribution per model over every detection.
pub fn score_distribution(runs: &[AccuracyRun]) -> BTreeMap<String, BoxSummary> {
    detections_by_model(runs)
        .into_iter()
        .filter_map(|(model, records)| {
            let scores: Vec<f64> = records.iter().map(|record| record.score).collect();
            BoxSummary::from_values(&scores).map(|summary| (model, summary))
        })
        .collect()
}

/// A summary figure precomputed into each performance workbook's `Main` sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PerformanceMetric {
    DetectionTime,
    CpuUsage,
    CpuFrequency,
    PackagePower,
    PackageTemperature,
    MemoryUsage,
    PowerUsage,
    Fps,
}

impl PerformanceMetric {
    pub const ALL: [PerformanceMetric; 8] = [
        PerformanceMetric::DetectionTime,
        PerformanceMetric::CpuUsage,
        PerformanceMetric::CpuFrequency,
        PerformanceMetric::PackagePower,
        PerformanceMetric::PackageTemperature,
        PerformanceMetric::MemoryUsage,
        PerformanceMetric::PowerUsage,
        PerformanceMetric::Fps,
    ];

    /// Key of the per-run average in the `Main` sheet.
    pub fn mean_key(self) -> &'static str {
        match self {
            PerformanceMetric::DetectionTime => "average_detection_time",
            PerformanceMetric::CpuUsage => "avg_cpu_usage",
            PerformanceMetric::CpuFrequency => "cpu_freq_avg",
            PerformanceMetric::PackagePower => "avg_cpu_package_power",
            PerformanceMetric::PackageTemperature => "avg_cpu_package_temp",
            PerformanceMetric::MemoryUsage => "avg_memory_usage",
            PerformanceMetric::PowerUsage => "avg_power_usage",
            PerformanceMetric::Fps => "fps",
        }
    }

    /// Key of the per-run standard deviation, where the workbook records one.
    pub fn std_key(self) -> Option<&'static str> {
        match self {
            PerformanceMetric::CpuUsage => Some("cpu_usage_std"),
            PerformanceMetric::CpuFrequency => Some("cpu_freq_std"),
            PerformanceMetric::PackagePower => Some("cpu_package_power_std"),
            PerformanceMetric::PackageTemperature => Some("cpu_package_temp_std"),
            PerformanceMetric::MemoryUsage => Some("memory_usage_std"),
            PerformanceMetric::PowerUsage => Some("power_usage_std"),
            PerformanceMetric::DetectionTime | PerformanceMetric::Fps => None,
        }
    }

    /// Chart-friendly name; matches the historical output file stems.
    pub fn name(self) -> &'static str {
        match self {
            PerformanceMetric::DetectionTime => "avg_detection_time",
            other => other.mean_key(),
        }
    }
}

impl fmt::Display for PerformanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricStat {
    pub mean: f64,
    pub std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceAggregate {
    pub model: String,
    pub cpu: String,
    pub runs: usize,
    pub metrics: BTreeMap<PerformanceMetric, MetricStat>,
}

fn metric_values(mains: &[&MainMetadata], key: &str) -> Vec<f64> {
    mains.iter().map(|main| main.number_or_nan(key)).collect()
}

fn finite(values: Vec<f64>) -> Vec<f64> {
    values.into_iter().filter(|v| v.is_finite()).collect()
}

/// Per (model, cpu): mean of the per-run averages and RMS-combined per-run deviations.
pub fn performance_by_model_and_cpu(runs: &[PerformanceRun]) -> Vec<PerformanceAggregate> {
    group_by(runs, |run| (run.main.model(), run.main.cpu()))
        .into_iter()
        .map(|((model, cpu), group)| {
            let mains: Vec<&MainMetadata> = group.iter().map(|run| &run.main).collect();
            let metrics = PerformanceMetric::ALL
                .iter()
                .map(|metric| {
                    let means = finite(metric_values(&mains, metric.mean_key()));
                    let std = match metric.std_key() {
                        Some(key) => stats::combined_std_dev(&metric_values(&mains, key)),
                        None => stats::std_dev(&means),
                    };
                    (
                        *metric,
                        MetricStat {
                            mean: stats::mean(&means),
                            std,
                        },
                    )
                })
                .collect();
            PerformanceAggregate {
                model,
                cpu,
                runs: group.len(),
                metrics,
            }
        })
        .collect()
}

/// Min-max normalises `metric` across every run, then averages per model.
pub fn normalized_by_model(
    runs: &[PerformanceRun],
    metric: PerformanceMetric,
) -> BTreeMap<String, f64> {
    let values: Vec<f64> = runs
        .iter()
        .map(|run| run.main.number_or_nan(metric.mean_key()))
        .collect();
    let normalized = stats::min_max_normalize(&values);
    group_by(runs.iter().zip(normalized), |(run, _)| run.main.model())
        .into_iter()
        .map(|(model, entries)| {
            let values = finite(entries.into_iter().map(|(_, value)| value).collect());
            (model, stats::mean(&values))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EfficiencyPoint {
    pub model: String,
    pub avg_fps: f64,
    pub avg_detection_time: f64,
    pub avg_cpu_package_power: f64,
}

/// Throughput against package power, one point per model.
pub fn fps_vs_package_power(runs: &[PerformanceRun]) -> Vec<EfficiencyPoint> {
    group_by(runs, |run| run.main.model())
        .into_iter()
        .map(|(model, group)| {
            let mains: Vec<&MainMetadata> = group.iter().map(|run| &run.main).collect();
            let avg = |metric: PerformanceMetric| {
                stats::mean(&finite(metric_values(&mains, metric.mean_key())))
            };
            EfficiencyPoint {
                model,
                avg_fps: avg(PerformanceMetric::Fps),
                avg_detection_time: avg(PerformanceMetric::DetectionTime),
                avg_cpu_package_power: avg(PerformanceMetric::PackagePower),
            }
        })
        .collect()
}

/// `power_watt` distribution per (cpu, model).
pub fn power_distribution(runs: &[PerformanceRun]) -> BTreeMap<(String, String), BoxSummary> {
    group_by(runs, |run| (run.main.cpu(), run.main.model()))
        .into_iter()
        .filter_map(|(key, group)| {
            let watts: Vec<f64> = group
                .iter()
                .flat_map(|run| run.power_usage.iter())
                .filter_map(|sample| sample.channel(POWER_WATT))
                .collect();
            BoxSummary::from_values(&watts).map(|summary| (key, summary))
        })
        .collect()
}
