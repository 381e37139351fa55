use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use gitmit::{telemetry, GitTimes};

/// Per-file commit times from git history
///
/// Walks the commit graph from HEAD and reports, for every tracked file,
/// the commit time of the newest commit that changed it. Useful wherever
/// file timestamps should follow content history rather than checkout time:
/// reproducible builds, rsync-style syncing, static-site generators.
///
/// The result is printed to stdout as a JSON object mapping paths (relative
/// to --consider) to epoch seconds.
#[derive(Parser)]
#[command(name = "gitmit")]
#[command(version, about)]
struct Cli {
    /// Root of the git repository
    #[arg(long, default_value = ".")]
    root_folder: PathBuf,

    /// Subtree to restrict the output to; paths are reported relative to it
    #[arg(long, default_value = ".")]
    consider: String,

    /// Only report paths matching at least one of these globs (repeatable)
    #[arg(long = "timestamps-for", value_name = "GLOB")]
    timestamps_for: Vec<String>,

    /// Whitelist globs; paths must match one when any are given (repeatable)
    #[arg(long, value_name = "GLOB")]
    include: Vec<String>,

    /// Drop paths matching these globs; wins over --include (repeatable)
    #[arg(long, value_name = "GLOB")]
    exclude: Vec<String>,

    /// Skip reading and writing the commit-times cache
    #[arg(long)]
    no_cache: bool,

    /// Verbose logging on stderr
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.debug);

    let times = GitTimes::new(cli.root_folder, cli.consider)
        .timestamps_for(cli.timestamps_for)
        .include(cli.include)
        .exclude(cli.exclude)
        .with_cache(!cli.no_cache)
        .find()?;

    println!("{}", serde_json::to_string_pretty(&times)?);
    Ok(())
}
