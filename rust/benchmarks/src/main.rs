//! `axiom-bench`: score every axiom against numbers with known factors.

use anyhow::Context;
use benchmarks::{run_benchmarks, BenchConfig};
use clap::Parser;
use factoring_core::Algorithm;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "axiom-bench", about = "Benchmark the five factorization axioms")]
struct Cli {
    /// JSON configuration file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the JSON report here
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Comma-separated axiom keys (axiom1..axiom5)
    #[arg(short, long, value_delimiter = ',')]
    axioms: Vec<String>,

    /// Number of random semiprimes to add
    #[arg(long)]
    random_count: Option<usize>,

    /// Bit size of the random semiprimes
    #[arg(long)]
    random_bits: Option<u32>,

    /// Seed for the random semiprimes
    #[arg(long)]
    seed: Option<u64>,
}

fn load_config(cli: &Cli) -> anyhow::Result<BenchConfig> {
    let mut config = match &cli.config {
        Some(path) => BenchConfig::from_json_file(path).unwrap_or_else(|e| {
            log::warn!("could not load {}: {}; using defaults", path.display(), e);
            BenchConfig::default()
        }),
        None => BenchConfig::default(),
    };

    if !cli.axioms.is_empty() {
        config.axioms = cli
            .axioms
            .iter()
            .map(|key| Algorithm::from_key(key.trim()).with_context(|| format!("unknown axiom '{}'", key)))
            .collect::<anyhow::Result<_>>()?;
    }
    if let Some(count) = cli.random_count {
        config.random_count = count;
    }
    if let Some(bits) = cli.random_bits {
        config.random_bits = bits;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if cli.output.is_some() {
        config.output = cli.output.clone();
    }
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    println!("==================================================");
    println!("  Prime Axioms Factorizer Benchmarks");
    println!("==================================================");
    println!("Test cases: {} (+{} random {}-bit)", config.numbers.len(), config.random_count, config.random_bits);
    println!();

    let report = run_benchmarks(&config);

    // Per-number view, in target order.
    let mut by_number: BTreeMap<usize, (u64, Vec<String>)> = BTreeMap::new();
    for bench in &report.axioms {
        for (i, result) in bench.results.iter().enumerate() {
            let entry = by_number.entry(i).or_insert_with(|| (result.n, Vec::new()));
            let mark = if result.success { "ok" } else { "--" };
            entry.1.push(format!("{} {} ({:.4}s)", bench.axiom.key(), mark, result.seconds));
        }
    }
    for (n, marks) in by_number.values() {
        println!("n = {:>20}: {}", n, marks.join("  "));
    }
    println!();
    println!("Total benchmark time: {:.2}s", report.total_seconds);
    println!();
    println!("{}", report.render());

    if let Some(path) = &config.output {
        report
            .write_json(path)
            .with_context(|| format!("writing report to {}", path.display()))?;
        log::info!("report written to {}", path.display());
        println!("Report saved to: {}", path.display());
    }
    Ok(())
}
