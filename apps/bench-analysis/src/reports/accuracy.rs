use crate::aggregate::{detection_breakdown, score_distribution, summarize_detections};
use crate::config::{AnalysisConfig, LabelConfig};
use crate::model::AccuracyRun;
use crate::sink::{Table, TableSink};
use anyhow::Result;
use std::io::Write;

pub fn run(config: &AnalysisConfig, sink: &mut dyn TableSink, out: &mut dyn Write) -> Result<()> {
    let runs = super::load_accuracy_runs(config);
    report(&runs, &config.labels, sink, out)
}

/// Prints the per-model detection summary and emits the accuracy tables.
pub fn report(
    runs: &[AccuracyRun],
    labels: &LabelConfig,
    sink: &mut dyn TableSink,
    out: &mut dyn Write,
) -> Result<()> {
    let summaries = summarize_detections(runs);
    for summary in &summaries {
        writeln!(out, "{summary}")?;
    }

    let mut table = Table::new(
        "accuracy_summary",
        &[
            "model",
            "model_label",
            "detections",
            "avg_detection_time",
            "detection_time_std",
            "accuracy",
            "avg_score",
            "score_std",
            "fps",
        ],
    );
    for summary in &summaries {
        table.push(vec![
            summary.model.as_str().into(),
            labels.model_label(&summary.model).into(),
            summary.detections.into(),
            summary.mean_time.into(),
            summary.time_std.into(),
            summary.accuracy.into(),
            summary.mean_score.into(),
            summary.score_std.into(),
            summary.fps.into(),
        ]);
    }
    sink.emit(&table)?;

    let mut table = Table::new(
        "correct_vs_incorrect_detections",
        &["model", "model_label", "correct", "incorrect", "correct_pct", "incorrect_pct"],
    );
    for row in detection_breakdown(runs) {
        table.push(vec![
            row.model.as_str().into(),
            labels.model_label(&row.model).into(),
            row.correct.into(),
            row.incorrect.into(),
            row.correct_pct.into(),
            row.incorrect_pct.into(),
        ]);
    }
    sink.emit(&table)?;

    let mut table = Table::new(
        "score_distribution",
        &["model", "model_label", "count", "lower_whisker", "q1", "median", "q3", "upper_whisker"],
    );
    for (model, summary) in score_distribution(runs) {
        table.push(vec![
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
