//! Writes the consolidated catalog artifact.
//!
//! One document holds every category and every app with its full metadata,
//! a name slug, and a git-derived `lastUpdated`. Entries without a category
//! land in "Uncategorized". Exits non-zero only when the catalog cannot be
//! written.

use anyhow::Result;
use app_catalog::cli_support::{CommonArgs, init_logging};
use app_catalog::{TimestampResolver, build_consolidated};
use chrono::Utc;
use clap::Parser;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "build-catalog")]
#[command(about = "Aggregate app metadata into one consolidated catalog.json")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.common.verbose);
    if let Err(err) = run(&cli) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let paths = cli.common.catalog_paths()?;
    info!(root = %paths.root.display(), "building consolidated catalog");

    let now = Utc::now();
    let resolver = TimestampResolver::git(&paths.root, now);
    let summary = build_consolidated(&paths, &resolver, now, cli.common.dry_run)?;

    info!(
        categories = summary.categories,
        apps = summary.apps,
        skipped = summary.skipped.len(),
        "catalog complete"
    );
    if cli.common.dry_run {
        println!("{}", summary.output.display());
    }
    Ok(())
}
