//! `factorize <NUMBER>`: print the prime factors of a non-negative integer.

use anyhow::Context;
use clap::Parser;
use factoring_core::parse_number;
use factorizer::{factorize, format_factors};

/// Prime factorization utility
#[derive(Parser)]
#[command(name = "factorize", version, about, long_about = None)]
struct Cli {
    /// Integer to factor
    #[arg(allow_hyphen_values = true)]
    number: String,

    /// Log progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let n = parse_number(&cli.number).with_context(|| format!("cannot factor '{}'", cli.number))?;
    let result = factorize(&n);
    log::info!(
        "factored {} with {} in {:?} ({} factors)",
        result.n,
        result.algorithm,
        result.duration,
        result.factors.len()
    );
    if !result.complete {
        log::warn!("factorization of {} may be incomplete", result.n);
    }

    println!("{}", format_factors(&result.factors));
    Ok(())
}
