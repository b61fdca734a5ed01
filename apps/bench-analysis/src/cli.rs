use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AnalysisConfig;
use crate::reports::power::PowerOptions;
use crate::reports::usage::UsageOptions;
use crate::sink::OutputFormat;

#[derive(Parser)]
#[command(
    name = "bench-analysis",
    version,
    about = "Summarise object-detection benchmark workbooks"
)]
pub struct Cli {
    /// TOML config file (defaults to ./bench-analysis.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    /// Write one file per table here instead of printing to stdout.
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,
    #[arg(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Accuracy,
    Performance,
    Usage(UsageArgs),
    Power(PowerArgs),
    All,
}

#[derive(Args, Default)]
pub struct UsageArgs {
    #[arg(long)]
    pub target_points: Option<usize>,
    #[arg(long, default_value_t = false)]
    pub raw: bool,
}

#[derive(Args, Default)]
pub struct PowerArgs {
    #[arg(long)]
    pub max_elapsed_ms: Option<f64>,
}

impl Cli {
    /// CLI flags win over file and environment settings.
    pub fn apply_overrides(&self, config: &mut AnalysisConfig) {
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if let Some(format) = self.format {
            config.output_format = format;
        }
    }
}

impl UsageArgs {
    pub fn options(&self, config: &AnalysisConfig) -> Result<UsageOptions> {
        let target_points = self.target_points.unwrap_or(config.target_points);
        if target_points == 0 {
            return Err(anyhow!("--target-points must be at least 1"));
        }
        Ok(UsageOptions {
            target_points,
            raw: self.raw,
        })
    }
}

impl PowerArgs {
    pub fn options(&self, config: &AnalysisConfig) -> PowerOptions {
        PowerOptions {
            max_elapsed_ms: self.max_elapsed_ms.or(config.power_window_ms),
        }
    }
}
