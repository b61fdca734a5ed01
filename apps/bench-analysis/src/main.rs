use anyhow::Result;
use clap::Parser;
use std::io;

use bench_analysis::cli::{Cli, Commands, PowerArgs, UsageArgs};
use bench_analysis::config::AnalysisConfig;
use bench_analysis::reports;
use bench_analysis::sink::build_sink;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AnalysisConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    tracing::debug!(data_dir = %config.data_dir.display(), "configuration loaded");

    let mut sink = build_sink(config.output_dir.as_deref(), config.output_format)?;
    let mut stdout = io::stdout();
    match cli.command {
        Commands::Accuracy => reports::accuracy::run(&config, sink.as_mut(), &mut stdout),
        Commands::Performance => reports::performance::run(&config, sink.as_mut()),
        Commands::Usage(args) => {
            reports::usage::run(&config, args.options(&config)?, sink.as_mut())
        }
        Commands::Power(args) => reports::power::run(&config, args.options(&config), sink.as_mut()),
        Commands::All => {
            reports::accuracy::run(&config, sink.as_mut(), &mut stdout)?;
            reports::performance::run(&config, sink.as_mut())?;
            let usage = UsageArgs::default().options(&config)?;
            reports::usage::run(&config, usage, sink.as_mut())?;
            reports::power::run(&config, PowerArgs::default().options(&config), sink.as_mut())
        }
    }
}
