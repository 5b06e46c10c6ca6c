//! Imputation Benchmark Example
//!
//! Runs the baseline imputers over three synthetic series, prints the
//! per-condition verdicts and optionally exports the report.
//!
//! Run with: cargo run --example imputation_benchmark [config.json] [out_dir]
//!
//! Set `RUST_LOG=trueno_gapbench=debug` for per-cell diagnostics.

use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use trueno_gapbench::experiment::ExperimentConfig;
use trueno_gapbench::metrics::Metric;
use trueno_gapbench::{Benchmark, Dataset};

fn synthetic_datasets(len: usize) -> Vec<Dataset> {
    vec![
        Dataset::new(
            "seasonal",
            (0..len)
                .map(|i| (i as f64 / 12.0).sin().mul_add(5.0, 50.0))
                .collect::<Vec<_>>(),
        ),
        Dataset::new(
            "trend",
            (0..len).map(|i| 0.3f64.mul_add(i as f64, 10.0)).collect::<Vec<_>>(),
        ),
        Dataset::new(
            "steps",
            (0..len).map(|i| ((i / 40) % 3) as f64 + 1.0).collect::<Vec<_>>(),
        ),
    ]
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let config_path = args.next();
    let out_dir = args.next().map(PathBuf::from);

    println!("=== Trueno-Gapbench Imputation Benchmark ===\n");

    // -------------------------------------------------------------------------
    // 1. Configuration
    // -------------------------------------------------------------------------
    println!("1. Loading configuration...");

    let config = match &config_path {
        Some(path) => ExperimentConfig::from_json_file(path)
            .with_context(|| format!("loading config from {path}"))?,
        None => ExperimentConfig::builder()
            .proportions(vec![0.05, 0.1, 0.2])
            .gap_widths(vec![1, 5, 10])
            .replicates(10)
            .seed(42)
            .build()?,
    };
    println!("   Proportions: {:?}", config.proportions());
    println!("   Gap widths:  {:?}", config.gap_widths());
    println!("   Replicates:  {}", config.replicates());
    println!("   Seed:        {}", config.seed());

    // -------------------------------------------------------------------------
    // 2. Datasets and algorithms
    // -------------------------------------------------------------------------
    println!("\n2. Preparing datasets...");

    let datasets = synthetic_datasets(400);
    for dataset in &datasets {
        println!("   {} ({} points)", dataset.name(), dataset.series().len());
    }

    let benchmark = Benchmark::baseline();
    let algorithms: Vec<String> = benchmark
        .registry()
        .ids()
        .iter()
        .map(ToString::to_string)
        .collect();
    println!("   Algorithms: {}", algorithms.join(", "));

    // -------------------------------------------------------------------------
    // 3. Run
    // -------------------------------------------------------------------------
    println!("\n3. Running benchmark...");

    let report = benchmark.run(&datasets, &config).context("benchmark run failed")?;
    println!("   Status:   {:?}", report.run.status());
    println!("   Cells:    {}", report.run.cells());
    println!("   Failures: {}", report.run.failed_cells());
    println!("   Warnings: {}", report.warnings.len());
    if let Some(duration) = report.run.duration() {
        println!("   Duration: {} ms", duration.num_milliseconds());
    }

    // -------------------------------------------------------------------------
    // 4. Verdicts
    // -------------------------------------------------------------------------
    println!("\n4. Best algorithm per condition:");

    for verdict in &report.summary {
        match &verdict.winner {
            Some(winner) => println!(
                "   {:<32} {:<16} ({}/{} metrics)",
                verdict.condition.to_string(),
                winner.algorithm,
                verdict.wins,
                verdict.decided
            ),
            None => println!("   {:<32} no decision", verdict.condition.to_string()),
        }
    }

    println!("\n   RMSE winners:");
    for best in report.best.iter().filter(|b| b.metric == Metric::Rmse) {
        if let (Some(winner), Some(value)) = (&best.winner, best.value.value()) {
            println!(
                "   {:<32} {:<16} {value:.4}",
                best.condition.to_string(),
                winner.algorithm
            );
        }
    }

    // -------------------------------------------------------------------------
    // 5. Export
    // -------------------------------------------------------------------------
    if let Some(dir) = out_dir {
        println!("\n5. Exporting report to {}...", dir.display());
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join("report.json"), report.to_json()?)?;
        report.write_parquet_dir(&dir)?;
        println!("   Wrote report.json, evaluations.parquet, best.parquet, summary.parquet");
    }

    println!("\n=== Done ===");
    Ok(())
}
