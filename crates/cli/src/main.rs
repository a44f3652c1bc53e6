mod args;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bfbatch_core::{
    load_config, load_config_from_env, output_path_for, validate_config, BatchReport, Config,
    ConversionDriver, LoggingObserver,
};

use args::Args;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run() -> Result<BatchReport> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = read_config(&args.config)?;
    args.apply(&mut config);
    validate_config(&config).context("Configuration validation failed")?;

    info!("Converter directory is {}", config.converter.tool_dir.display());
    info!("Running at most {} conversions at once", config.scheduler.admission_limit);

    let mut driver = ConversionDriver::preflighted(
        config.converter.clone(),
        config.scheduler.clone(),
        &config.preflight,
    )
    .await
    .context("Converter environment is not usable")?
    .with_observer(Arc::new(LoggingObserver));

    tokio::fs::create_dir_all(&args.output_dir)
        .await
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    for input in &args.inputs {
        let output = output_path_for(input, &args.output_dir, &config.output)
            .await
            .with_context(|| format!("Failed to name output for {}", input.display()))?;
        driver.register(input, output)?;
    }

    let report = driver.run_batch().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(report)
}

/// Loads the config file if present, otherwise starts from defaults.
fn read_config(path: &Path) -> Result<Config> {
    if path.exists() {
        info!("Loading configuration from {:?}", path);
        load_config(path).with_context(|| format!("Failed to load config from {:?}", path))
    } else {
        warn!("No configuration at {:?}, using defaults", path);
        load_config_from_env().context("Failed to read configuration from the environment")
    }
}

fn print_summary(report: &BatchReport) {
    println!(
        "{} converted ({} already present), {} failed in {:.1}s",
        report.converted.len(),
        report.already_converted.len(),
        report.failed.len(),
        report.elapsed_secs()
    );
    for (input, reason) in &report.failed {
        println!("  FAILED {}: {}", input.display(), reason);
    }
}
