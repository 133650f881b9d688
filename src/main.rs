mod cli;

use std::cell::Cell;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

use cli::{Cli, Command};
use statusfile::config::StatusConfig;
use statusfile::harness::{self, ChurnOptions, DemoOptions, WriteMode};
use statusfile::ui::{self, StatusProgress};
use statusfile::{StatusFile, StatusRecord};

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

// Flags win over the config file.
fn status_file(config: &StatusConfig, file: Option<PathBuf>, staging_dir: Option<PathBuf>) -> StatusFile {
    let file = StatusFile::new(file.unwrap_or_else(|| config.status_file.clone()));
    match staging_dir.or_else(|| config.staging_dir.clone()) {
        Some(dir) => file.with_staging_dir(dir),
        None => file,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => StatusConfig::load_from(path)?,
        None => StatusConfig::load()?,
    };
    info!("loaded config: {config:?}");

    match cli.command {
        Command::Write {
            status,
            message,
            file,
            staging_dir,
        } => {
            let file = status_file(&config, file, staging_dir);
            let record = StatusRecord::new(status, message);
            file.publish(&record)
                .with_context(|| format!("could not publish {record}"))?;
            println!("Published {record} to {}", file.path().display());
        }
        Command::Read { file } => {
            let file = status_file(&config, file, None);
            let record = file.load()?;
            ui::print_record(record.as_ref());
        }
        Command::Watch { file } => {
            let file = status_file(&config, file, None);
            let choices = config.choices();
            let stop = Arc::new(AtomicBool::new(false));
            {
                let stop = Arc::clone(&stop);
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        stop.store(true, Ordering::Release);
                    }
                });
            }

            let stats = tokio::task::spawn_blocking(move || {
                harness::watch(&file, &choices, &stop, ui::print_observed)
            })
            .await
            .context("reader task panicked")??;
            println!(
                "Stopped after {} reads, {} misses, {} changes",
                stats.reads, stats.misses, stats.changes
            );
        }
        Command::Churn { file, count } => {
            let file = status_file(&config, file, None);
            let opts = ChurnOptions {
                count,
                max_interval: Duration::from_millis(config.max_interval_ms),
                mode: WriteMode::Atomic,
            };
            let progress = StatusProgress::start(count);
            let choices = config.choices();
            let written = Cell::new(0u64);
            let mut rng = StdRng::from_os_rng();

            tokio::select! {
                res = harness::churn(&file, &choices, &opts, &mut rng, |record| {
                    progress.wrote(record);
                    written.set(written.get() + 1);
                }) => {
                    res?;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("writer interrupted");
                }
            }
            progress.finish_churn(written.get());
        }
        Command::Demo {
            count,
            readers,
            in_place,
        } => {
            let file = status_file(&config, None, None);
            let opts = DemoOptions {
                count,
                readers,
                max_interval: Duration::from_millis(config.max_interval_ms),
                mode: if in_place {
                    WriteMode::InPlace
                } else {
                    WriteMode::Atomic
                },
            };
            let progress = StatusProgress::start(Some(count));
            let reader_progress = progress.clone();
            let choices = config.choices();
            let mut rng = StdRng::from_os_rng();

            let report = harness::run_demo(
                &file,
                &choices,
                &opts,
                &mut rng,
                |record| progress.wrote(record),
                move |id, record| reader_progress.read(id, record),
            )
            .await?;
            progress.finish_demo(&report);

            if !report.is_clean() {
                bail!("{} reader(s) saw a torn or unexpected status", report.failures());
            }
        }
    }

    Ok(())
}
