use crate::resample::DEFAULT_TARGET_POINTS;
use crate::sink::OutputFormat;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "BENCH_ANALYSIS_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "bench-analysis.toml";

const DEFAULT_CPU_LABELS: &[(&str, &str)] = &[
    ("Intel(R) Core(TM) i5-4200H CPU @ 2.80GHz", "PC1"),
    ("Intel(R) Core(TM) i5-6300U CPU @ 2.40GHz", "PC2"),
    ("AMD Ryzen 5 5600 6-Core Processor", "PC3"),
    ("AMD Ryzen 5 2600 Six-Core Processor", "PC4"),
];

const DEFAULT_MODEL_LABELS: &[(&str, &str)] = &[
    ("yolov8s", "yolo v8 s"),
    ("ssd_mobilenet_v2_fpnlite_320x320", "mobile net v2"),
    ("efficient_det_lite1", "efficient det lite 1"),
    ("efficient_det_lite2", "efficient det lite 2"),
    ("efficient_det_lite3", "efficient det lite 3"),
    ("faster_rcnn_resnet101_v1_640x640", "faster rcnn"),
];

/// Display labels for raw CPU and model identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub cpus: BTreeMap<String, String>,
    pub models: BTreeMap<String, String>,
}

impl Default for LabelConfig {
    fn default() -> Self {
        let to_map = |pairs: &[(&str, &str)]| -> BTreeMap<String, String> {
            pairs
                .iter()
                .map(|(raw, label)| (raw.to_string(), label.to_string()))
                .collect()
        };
        Self {
            cpus: to_map(DEFAULT_CPU_LABELS),
            models: to_map(DEFAULT_MODEL_LABELS),
        }
    }
}

impl LabelConfig {
    /// Falls back to the raw name when no label is configured.
    pub fn cpu_label<'a>(&'a self, raw: &'a str) -> &'a str {
        self.cpus.get(raw).map(String::as_str).unwrap_or(raw)
    }

    pub fn model_label<'a>(&'a self, raw: &'a str) -> &'a str {
        self.models.get(raw).map(String::as_str).unwrap_or(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub data_dir: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub output_format: OutputFormat,
    pub accuracy_suffix: String,
    pub performance_suffix: String,
    pub target_points: usize,
    /// Keep only power samples with `elapsed_time` at or below this many milliseconds.
    pub power_window_ms: Option<f64>,
    pub labels: LabelConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: None,
            output_format: OutputFormat::Csv,
            accuracy_suffix: "_accuracy.xlsx".to_string(),
            performance_suffix: "_performance.xlsx".to_string(),
            target_points: DEFAULT_TARGET_POINTS,
            power_window_ms: None,
            labels: LabelConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Defaults, then the TOML file, then environment overrides.
    ///
    /// An explicitly requested file (argument or `BENCH_ANALYSIS_CONFIG`) must exist; the
    /// default `bench-analysis.toml` is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let requested = explicit
            .map(Path::to_path_buf)
            .or_else(|| env_optional(CONFIG_ENV).map(PathBuf::from));

        let mut config = match requested {
            Some(path) => {
                if !path.exists() {
                    return Err(anyhow!("config file {} does not exist", path.display()));
                }
                Self::from_file(&path)?
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(dir) = env_optional("BENCH_ANALYSIS_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = env_optional("BENCH_ANALYSIS_OUTPUT_DIR") {
            self.output_dir = Some(PathBuf::from(dir));
        }
        if let Some(raw) = env_optional("BENCH_ANALYSIS_TARGET_POINTS") {
            self.target_points = raw
                .parse::<usize>()
                .context("invalid BENCH_ANALYSIS_TARGET_POINTS")?;
        }
        if let Some(raw) = env_optional("BENCH_ANALYSIS_POWER_WINDOW_MS") {
            self.power_window_ms = Some(
                raw.parse::<f64>()
                    .context("invalid BENCH_ANALYSIS_POWER_WINDOW_MS")?,
            );
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_points == 0 {
            return Err(anyhow!("target_points must be at least 1"));
        }
        if self.accuracy_suffix.is_empty() || self.performance_suffix.is_empty() {
            return Err(anyhow!("file suffixes must not be empty"));
        }
        if let Some(window) = self.power_window_ms {
            if !window.is_finite() {
                return Err(anyhow!("power_window_ms must be a finite number"));
            }
        }
        Ok(())
    }
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_historical_layout() {
        let config = AnalysisConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.target_points, 240);
        assert_eq!(config.accuracy_suffix, "_accuracy.xlsx");
        assert_eq!(config.labels.cpu_label("AMD Ryzen 5 5600 6-Core Processor"), "PC3");
        assert_eq!(config.labels.model_label("yolov8s"), "yolo v8 s");
    }

    #[test]
    fn unknown_identifiers_keep_raw_name() {
        let labels = LabelConfig::default();
        assert_eq!(labels.cpu_label("Apple M2"), "Apple M2");
        assert_eq!(labels.model_label("detr"), "detr");
    }

    #[test]
    fn toml_overrides_selected_fields() {
        let config = AnalysisConfig::from_toml(
            r#"
            data_dir = "runs"
            target_points = 120
            power_window_ms = 200.0
            output_format = "json"

            [labels.models]
            detr = "DETR"
            "#,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("runs"));
        assert_eq!(config.target_points, 120);
        assert_eq!(config.power_window_ms, Some(200.0));
        assert_eq!(config.output_format, OutputFormat::Json);
        assert_eq!(config.labels.model_label("detr"), "DETR");
        assert_eq!(config.performance_suffix, "_performance.xlsx");
        assert_eq!(config.labels.model_label("yolov8s"), "yolov8s");
        assert_eq!(config.labels.cpu_label("AMD Ryzen 5 5600 6-Core Processor"), "PC3");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = AnalysisConfig::load(Some(&temp.path().join("missing.toml"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn zero_target_points_is_rejected() {
        let config = AnalysisConfig {
            target_points: 0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
