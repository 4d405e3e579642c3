use cachesim_collect::report::{self, collect_files, mean_delta};
use cachesim_collect::table_print::{format_curves, format_delta};
use cachesim_collect::CollectError;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "result_report")]
#[command(about = "Summarize collected cachesim results", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Miss ratio against cache size, one series per `# name` section
    Curves {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Averaged miss ratio difference between two algorithms
    Delta {
        /// Result files or directories of result files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(long, default_value = "S3FIFO")]
        baseline: String,
        #[arg(long, default_value = "S4FIFO")]
        candidate: String,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), CollectError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Curves { file, json } => {
            let text = fs::read_to_string(&file)?;
            let curves = report::parse_curves(&text);
            if json {
                println!("{}", serde_json::to_string_pretty(&curves)?);
            } else if curves.is_empty() {
                println!("[report] No result lines in {}", file.display());
            } else {
                print!("{}", format_curves(&curves));
            }
        }
        Commands::Delta { inputs, baseline, candidate, json } => {
            let files = collect_files(&inputs)?;
            let points = report::delta(&files, &baseline, &candidate)?;
            if json {
                let out = json!({
                    "baseline": baseline,
                    "candidate": candidate,
                    "files": files.len(),
                    "mean_delta": mean_delta(&points),
                    "points": points,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("[report] {} file(s), {} vs {}", files.len(), candidate, baseline);
                print!("{}", format_delta(&points, &baseline, &candidate));
            }
        }
    }

    Ok(())
}
