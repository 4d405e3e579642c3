use cachesim_collect::config::CollectConfig;
use cachesim_collect::file_map::SimulationFileMap;
use cachesim_collect::merger::Merger;
use cachesim_collect::record::IdentifierMode;
use cachesim_collect::CollectError;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cachesim_collect")]
#[command(about = "Merge raw cachesim results into the collected result files", long_about = None)]
struct Cli {
    /// JSON config describing roots and data-set families
    #[arg(short, long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Results root used when no config file is given
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    root: PathBuf,

    /// Key blocks by label and cache size instead of label only
    #[arg(long)]
    with_size: bool,
}

fn main() -> Result<(), CollectError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CollectConfig::load(path)?,
        None => CollectConfig::default_for(cli.root.clone()),
    };
    if cli.with_size {
        config.identifier_mode = IdentifierMode::LabelAndSize;
    }

    println!("[collect] Results root: {}", config.results_root.display());
    println!("[collect] Finalized root: {}", config.finalized_root.display());

    let file_map = SimulationFileMap::build(&config)?;
    if file_map.is_empty() {
        println!("[collect] No raw result files found");
        return Ok(());
    }
    println!("[collect] Found {} raw result file(s)", file_map.len());

    let merger = Merger::from_config(&config);
    let report = merger.merge_all(&file_map);
    let totals = report.totals();

    println!(
        "[collect] Merged {} file(s): {} replaced, {} added, {} carried over",
        report.merged.len(),
        totals.replaced,
        totals.added,
        totals.carried
    );
    if !report.skipped.is_empty() {
        println!("[collect] Skipped {} missing raw file(s)", report.skipped.len());
    }
    for (raw, err) in &report.failed {
        eprintln!("[collect] Failed {}: {}", raw.display(), err);
    }

    Ok(())
}
