//! fastbuild CLI Binary
//!
//! `fastbuild <root> <cache-dir>`: fingerprint `root` and persist the index
//! into `cache-dir`. All tuning lives in configuration, not flags.

use anyhow::Context;
use clap::Parser;
use fastbuild::config::{ConfigLoader, HashingConfig};
use fastbuild::hashing::{BatchHasher, CommandHasher, LocalHasher};
use fastbuild::logging::init_logging;
use fastbuild::reconcile::{DirectStamp, ShellRunner};
use fastbuild::vcs::GitCli;
use fastbuild::Pipeline;
use std::path::PathBuf;
use std::process;
use tracing::error;

#[derive(Parser, Debug)]
#[command(
    name = "fastbuild",
    version,
    about = "Incremental content fingerprinting for build caches"
)]
struct Cli {
    /// Directory tree to fingerprint
    root: PathBuf,

    /// Directory holding the persisted index
    cache_dir: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        error!("Run failed: {:#}", e);
        eprintln!("fastbuild: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = ConfigLoader::load(&cli.cache_dir).context("loading configuration")?;
    init_logging(Some(&config.logging)).context("initializing logging")?;

    let hasher = select_hasher(&config.hashing);
    let git = GitCli::new();
    let writer = DirectStamp;
    let runner = ShellRunner::default();

    let report = Pipeline::new(&config, hasher.as_ref(), &writer, &runner)
        .with_vcs(&git)
        .run(&cli.root, &cli.cache_dir)?;

    println!("{}", report);
    Ok(())
}

/// External checksum command when configured, in-process BLAKE3 otherwise.
fn select_hasher(config: &HashingConfig) -> Box<dyn BatchHasher> {
    match config
        .command
        .as_deref()
        .and_then(CommandHasher::from_command_line)
    {
        Some(command) => Box::new(command),
        None => Box::new(LocalHasher),
    }
}
