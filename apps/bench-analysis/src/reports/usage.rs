use crate::aggregate::group_by;
use crate::config::{AnalysisConfig, LabelConfig};
use crate::model::{PerformanceRun, CPU_PACKAGE_POWER, CPU_PACKAGE_TEMP, CPU_USAGE, MEMORY_MB};
use crate::resample::{resample, to_elapsed_percent, LabeledSeries};
use crate::sink::{Table, TableSink};
use anyhow::Result;

pub const USAGE_CHANNELS: &[&str] = &[MEMORY_MB, CPU_USAGE, CPU_PACKAGE_POWER, CPU_PACKAGE_TEMP];

#[derive(Debug, Clone, Copy)]
pub struct UsageOptions {
    pub target_points: usize,
    /// Keep the recorded elapsed-time axis instead of resampling onto percent of run.
    pub raw: bool,
}

pub fn run(config: &AnalysisConfig, options: UsageOptions, sink: &mut dyn TableSink) -> Result<()> {
    let runs = super::load_performance_runs(config);
    report(&runs, &config.labels, options, sink)
}

struct Timeline {
    cpu: String,
    source: String,
    series: LabeledSeries,
}

fn timeline(run: &PerformanceRun, options: UsageOptions) -> Timeline {
    let series = LabeledSeries::new(run.main.model(), run.resource_usage.clone());
    let series = if options.raw {
        series
    } else {
        let percent = LabeledSeries::new(series.label, to_elapsed_percent(&series.samples));
        resample(&percent, options.target_points)
    };
    Timeline {
        cpu: run.main.cpu(),
        source: run
            .source
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default(),
        series,
    }
}

/// One table per resource channel, rows grouped by CPU type then model.
pub fn report(
    runs: &[PerformanceRun],
    labels: &LabelConfig,
    options: UsageOptions,
    sink: &mut dyn TableSink,
) -> Result<()> {
    let timelines: Vec<Timeline> = runs.iter().map(|run| timeline(run, options)).collect();
    let by_cpu = group_by(&timelines, |timeline| timeline.cpu.clone());
    let axis = if options.raw {
        "elapsed_time"
    } else {
        "elapsed_time_percent"
    };

    for &channel in USAGE_CHANNELS {
        let mut table = Table::new(
            format!("{channel}_over_time"),
            &["cpu", "cpu_label", "model", "model_label", "source", axis, channel],
        );
        for (cpu, group) in &by_cpu {
            let mut group = group.clone();
            group.sort_by(|a, b| a.series.label.cmp(&b.series.label));
            for timeline in group {
                let model = timeline.series.label.as_str();
                for sample in &timeline.series.samples {
                    let Some(value) = sample.channel(channel) else {
                        continue;
                    };
                    table.push(vec![
                        cpu.as_str().into(),
                        labels.cpu_label(cpu).into(),
                        model.into(),
                        labels.model_label(model).into(),
                        timeline.source.as_str().into(),
                        sample.elapsed_time.into(),
                        value.into(),
                    ]);
                }
            }
        }
        if table.is_empty() {
            tracing::debug!(channel, "no samples carry this channel");
        }
        sink.emit(&table)?;
    }

    tracing::debug!(runs = timelines.len(), raw = options.raw, "usage timelines built");
    Ok(())
}
