pub mod appointment;
pub mod book;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod grid;
pub mod input;
pub mod render;
pub mod storage;

use std::ffi::OsString;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(verbose = cli.verbose, quiet = cli.quiet, "starting daygrid CLI");

    let cfg = config::Config::load(cli.config.as_deref())?;
    let data_dir = config::resolve_data_dir(&cfg, cli.data.as_deref())
        .context("failed to resolve data directory")?;

    let storage = storage::FileStorage::open(&data_dir)
        .with_context(|| format!("failed to open storage at {}", data_dir.display()))?;
    let mut book = book::AppointmentBook::open(storage)?;

    let today = Local::now().date_naive();
    if book.seed_demo(today)? {
        debug!("seeded demo appointments on first run");
    }

    let mut renderer = render::Renderer::new(&cfg)?;
    let command = cli
        .command
        .unwrap_or(cli::Command::Show { month: None });

    commands::dispatch(&mut book, &mut renderer, command)?;

    info!("done");
    Ok(())
}
