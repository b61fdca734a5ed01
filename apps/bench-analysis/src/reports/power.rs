use crate::aggregate::{group_by, power_distribution};
use crate::config::{AnalysisConfig, LabelConfig};
use crate::model::{PerformanceRun, ELAPSED_TIME, POWER_WATT};
use crate::resample::truncate_window;
use crate::sink::{Table, TableSink};
use anyhow::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct PowerOptions {
    /// Drop power samples recorded after this many milliseconds.
    pub max_elapsed_ms: Option<f64>,
}

pub fn run(config: &AnalysisConfig, options: PowerOptions, sink: &mut dyn TableSink) -> Result<()> {
    let runs = super::load_performance_runs(config);
    report(&runs, &config.labels, options, sink)
}

/// Emits the windowed power time series and the per (cpu, model) watt distribution.
///
/// The distribution always covers the full recording; the window only trims the series.
pub fn report(
    runs: &[PerformanceRun],
    labels: &LabelConfig,
    options: PowerOptions,
    sink: &mut dyn TableSink,
) -> Result<()> {
    let mut table = Table::new(
        "power_usage_over_time",
        &["cpu", "cpu_label", "model", "model_label", "source", ELAPSED_TIME, POWER_WATT],
    );
    for (cpu, group) in group_by(runs, |run| run.main.cpu()) {
        let mut group = group;
        group.sort_by_key(|run| run.main.model());
        for run in group {
            let model = run.main.model();
            let source = run
                .source
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            for sample in truncate_window(&run.power_usage, options.max_elapsed_ms) {
                let Some(watt) = sample.channel(POWER_WATT) else {
                    continue;
                };
                table.push(vec![
                    cpu.as_str().into(),
                    labels.cpu_label(&cpu).into(),
                    model.as_str().into(),
                    labels.model_label(&model).into(),
                    source.as_str().into(),
                    sample.elapsed_time.into(),
                    watt.into(),
                ]);
            }
        }
    }
    tracing::debug!(
        rows = table.rows.len(),
        window_ms = ?options.max_elapsed_ms,
        "power series built"
    );
    sink.emit(&table)?;

    let mut table = Table::new(
        "power_usage_distribution",
        &[
            "cpu",
            "cpu_label",
            "model",
            "model_label",
            "count",
            "lower_whisker",
            "q1",
            "median",
            "q3",
            "upper_whisker",
        ],
    );
    for ((cpu, model), summary) in power_distribution(runs) {
        table.push(vec![
            cpu.as_str().into(),
            labels.cpu_label(&cpu).into(),
            model.as_str().into(),
            labels.model_label(&model).into(),
            summary.count.into(),
            summary.lower_whisker.into(),
            summary.q1.into(),
            summary.median.into(),
            summary.q3.into(),
            summary.upper_whisker.into(),
        ]);
    }
    sink.emit(&table)?;
    Ok(())
}
