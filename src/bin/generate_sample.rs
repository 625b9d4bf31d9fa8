use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use autodash::data::export::{write_csv, write_parquet};
use autodash::data::generate::{generate_sales, GeneratorConfig};
use autodash::data::loader::to_json;

/// Write a synthetic automotive sales dataset to disk.
#[derive(Debug, Parser)]
#[command(name = "generate_sample")]
struct Args {
    /// Number of sales to generate
    #[arg(long, default_value_t = GeneratorConfig::default().rows)]
    rows: usize,

    /// Random seed; the same seed always yields the same file
    #[arg(long, default_value_t = GeneratorConfig::default().seed)]
    seed: u64,

    /// Output file: .csv, .json or .parquet
    #[arg(long, short, default_value = "sample_sales.parquet")]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = GeneratorConfig {
        rows: args.rows,
        seed: args.seed,
        ..GeneratorConfig::default()
    };
    let records = generate_sales(&config);

    let ext = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "parquet" | "pq" => write_parquet(&records, &args.output)
            .with_context(|| format!("writing {}", args.output.display()))?,
        "csv" => std::fs::write(&args.output, write_csv(&records)?)
            .with_context(|| format!("writing {}", args.output.display()))?,
        "json" => std::fs::write(&args.output, to_json(&records)?)
            .with_context(|| format!("writing {}", args.output.display()))?,
        other => bail!("Unsupported output extension: .{other}"),
    }

    println!(
        "Wrote {} sales (seed {}) to {}",
        records.len(),
        config.seed,
        args.output.display()
    );
    Ok(())
}
