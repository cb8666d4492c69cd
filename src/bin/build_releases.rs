//! Writes one release file per category plus the categories index.
//!
//! Release files drop internal fields (commit, owner, repo, path, ...) and
//! carry an `owner/repo/name` slug. Files for categories that no longer exist
//! are pruned. Failing to write a single release file is logged and the run
//! continues; failing to write the index exits non-zero.

use anyhow::Result;
use app_catalog::cli_support::{CommonArgs, init_logging};
use app_catalog::{CategoryTimestamps, ReleaseOptions, TimestampResolver, build_releases};
use chrono::Utc;
use clap::Parser;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "build-releases")]
#[command(about = "Emit per-category release JSON and the categories index")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Keep release files for categories that no longer exist
    #[arg(long)]
    no_prune: bool,

    /// Source of each category's lastUpdated value
    #[arg(long, value_enum, default_value_t = CategoryTimestamps::Members)]
    category_timestamps: CategoryTimestamps,
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
    info!(root = %paths.root.display(), "building category releases");

    let resolver = TimestampResolver::git(&paths.root, Utc::now());
    let options = ReleaseOptions {
        prune: !cli.no_prune,
        dry_run: cli.common.dry_run,
        category_timestamps: cli.category_timestamps,
    };
    let summary = build_releases(&paths, &resolver, options)?;

    for failure in &summary.failed {
        warn!(path = %failure.path.display(), "release file not updated");
    }
    info!(
        categories = summary.categories,
        apps = summary.apps,
        written = summary.written.len(),
        failed = summary.failed.len(),
        pruned = summary.pruned.removed.len(),
        skipped = summary.skipped.len(),
        "releases complete"
    );
    if cli.common.dry_run {
        for path in summary.written.iter().chain([&summary.index_file]) {
            println!("{}", path.display());
        }
        for path in &summary.pruned.removed {
            println!("remove {}", path.display());
        }
    }
    Ok(())
}
