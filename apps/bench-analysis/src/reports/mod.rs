//! Batch analyses: discover workbooks, extract them, aggregate, and hand tables to a sink.
//!
//! Extraction failures are fail-soft: the offending file is logged and skipped so one bad
//! workbook never taints the others.

pub mod accuracy;
pub mod performance;
pub mod power;
pub mod usage;

use crate::config::AnalysisConfig;
use crate::discovery::find_files;
use crate::error::ExtractResult;
use crate::extract::{extract_accuracy, extract_performance};
use crate::model::{AccuracyRun, PerformanceRun};
use std::path::{Path, PathBuf};

pub fn load_accuracy_runs(config: &AnalysisConfig) -> Vec<AccuracyRun> {
    let files = find_files(&config.data_dir, &config.accuracy_suffix);
    load_all(&files, extract_accuracy)
}

pub fn load_performance_runs(config: &AnalysisConfig) -> Vec<PerformanceRun> {
    let files = find_files(&config.data_dir, &config.performance_suffix);
    load_all(&files, extract_performance)
}

fn load_all<T>(files: &[PathBuf], extract: impl Fn(&Path) -> ExtractResult<T>) -> Vec<T> {
    let mut runs = Vec::with_capacity(files.len());
    let mut skipped = 0usize;
    for path in files {
        match extract(path) {
            Ok(run) => runs.push(run),
            Err(err) => {
                skipped += 1;
                tracing::warn!(path = %err.path().display(), error = %err, "skipping workbook");
            }
        }
    }
    tracing::info!(
        discovered = files.len(),
        loaded = runs.len(),
        skipped,
        "workbooks loaded"
    );
    runs
}
