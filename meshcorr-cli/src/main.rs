//! meshcorr - vertex correspondence between meshes
//!
//! Usage:
//!   meshcorr match --source flame.obj --target scan.off --policy unique-threshold --k 10000 --max-distance 0.0025
//!   meshcorr match --config run.toml --source flame.obj --target scan.off
//!   meshcorr convert --input flame.obj --output flame.off

mod config;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use config::{Overrides, RunConfig};
use meshcorr_algorithms::{CorrespondenceSolver, KdTree, MatchPolicy};
use meshcorr_io::{read_vertices, write_vertices, RunOutputs};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "meshcorr")]
#[command(author, version, about = "Vertex correspondence between meshes", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Match source vertices to target vertices and write the result tables
    Match(MatchArgs),
    /// Convert a vertex list between OBJ and OFF/COFF
    Convert {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct MatchArgs {
    /// Source vertex list (points mapped from)
    #[arg(short, long)]
    source: PathBuf,

    /// Target vertex list (points mapped to)
    #[arg(short, long)]
    target: PathBuf,

    /// Matching policy: plain or unique-threshold
    #[arg(long)]
    policy: Option<MatchPolicy>,

    /// Candidate breadth for unique-threshold
    #[arg(long)]
    k: Option<usize>,

    /// Strict distance cutoff for unique-threshold
    #[arg(long)]
    max_distance: Option<f64>,

    /// Run plain queries in parallel
    #[arg(long)]
    parallel: bool,

    /// TOML run file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Output file prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Drop pairs further apart than this from the pair files and summary
    #[arg(long)]
    filter_distance: Option<f64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "meshcorr=debug" } else { "meshcorr=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Match(args) => run_match(args),
        Command::Convert { input, output } => run_convert(&input, &output),
    }
}

fn run_match(args: MatchArgs) -> Result<()> {
    let mut run = match &args.config {
        Some(path) => {
            info!("Loading run file {:?}", path);
            RunConfig::load(path)?
        }
        None => RunConfig::default(),
    };
    run.apply(Overrides {
        policy: args.policy,
        k: args.k,
        max_distance: args.max_distance,
        parallel: args.parallel,
        dir: args.out_dir,
        prefix: args.prefix,
        filter_distance: args.filter_distance,
    });
    let solver_config = run.correspondence_config()?;
    let filter_distance = run.filter_distance()?;

    let source = read_vertices(&args.source)
        .with_context(|| format!("Failed to read source {}", args.source.display()))?;
    let target = read_vertices(&args.target)
        .with_context(|| format!("Failed to read target {}", args.target.display()))?;
    info!(
        source = source.len(),
        target = target.len(),
        target_colors = target.colors.is_some(),
        "Loaded vertex lists"
    );

    let start = Instant::now();
    let index = KdTree::new(&target.positions).context("Failed to index target vertices")?;
    let solver = CorrespondenceSolver::new(&index, solver_config)?;
    let set = solver.solve(&source.positions)?;
    info!("Matching took {:.2?}", start.elapsed());

    let outputs = RunOutputs {
        set: &set,
        source: &source.positions,
        target: &target.positions,
        target_colors: target.colors(),
        filter_distance,
    };
    let kept = outputs.kept()?;
    match kept.stats() {
        Some(stats) => info!(
            matched = set.matched_count(),
            kept = stats.count,
            unmatched = set.unmatched_count(),
            mean = stats.mean_distance,
            max = stats.max_distance,
            "Correspondence summary"
        ),
        None => warn!("No source vertex was matched within the filter distance"),
    }
    if set.policy == MatchPolicy::UniqueThreshold && !set.is_complete() {
        warn!(
            "{} of {} source vertices are unmatched",
            set.unmatched_count(),
            set.source_len
        );
    }

    let written = outputs
        .save(&run.output.dir, &run.output.prefix)
        .with_context(|| format!("Failed to write results to {}", run.output.dir.display()))?;
    for path in written {
        info!("Wrote {}", path.display());
    }

    Ok(())
}

fn run_convert(input: &Path, output: &Path) -> Result<()> {
    let vertices =
        read_vertices(input).with_context(|| format!("Failed to read {}", input.display()))?;
    write_vertices(&vertices, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(
        vertices = vertices.len(),
        "Converted {} to {}",
        input.display(),
        output.display()
    );
    Ok(())
}
