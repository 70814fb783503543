//! Benchmark harness for the five factorization axioms.
//!
//! Every axiom crate exposes a divisor scorer that enumerates the divisors of
//! `n` up to `√n` and picks the one its heuristic likes best. A run counts as
//! a success when that pick is among the factors the test case lists, so the
//! numbers here measure how well each heuristic *recognizes* a factor, not how
//! fast it finds one.

use factoring_core::{generate_semiprime, Algorithm};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Numbers with known factorizations benchmarked by default.
pub const DEFAULT_CASES: [(u64, &[u64]); 20] = [
    (15, &[3, 5]),
    (21, &[3, 7]),
    (35, &[5, 7]),
    (77, &[7, 11]),
    (91, &[7, 13]),
    (143, &[11, 13]),
    (323, &[17, 19]),
    (391, &[17, 23]),
    (667, &[23, 29]),
    (899, &[29, 31]),
    (1147, &[31, 37]),
    (1517, &[37, 41]),
    (2021, &[43, 47]),
    (2491, &[47, 53]),
    (3127, &[53, 59]),
    (4087, &[61, 67]),
    (2047, &[23, 89]),
    (4181, &[37, 113]),
    (1364, &[2, 682]),
    (6765, &[3, 5, 11, 41]),
];

/// Errors raised while loading configuration or writing reports.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Signature shared by every axiom's `score_divisors`.
pub type DivisorScorer = fn(u64) -> Option<(u64, f64)>;

/// The divisor scorer for an axiom; `None` for the classical algorithms.
pub fn scorer_for(axiom: Algorithm) -> Option<DivisorScorer> {
    match axiom {
        Algorithm::PrimeOntology => Some(prime_ontology::score_divisors),
        Algorithm::FibonacciFlow => Some(fibonacci_flow::score_divisors),
        Algorithm::SpectralDuality => Some(spectral_duality::score_divisors),
        Algorithm::ObserverEffect => Some(observer_effect::score_divisors),
        Algorithm::SelfReference => Some(self_reference::score_divisors),
        Algorithm::TrialDivision | Algorithm::PollardRhoBrent => None,
    }
}

/// What to benchmark. Every field has a default, so a JSON file only needs
/// the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Numbers paired with the factors that count as a hit
    pub numbers: Vec<(u64, Vec<u64>)>,
    /// Axioms to run, in report order
    pub axioms: Vec<Algorithm>,
    /// Bit size of generated semiprimes
    pub random_bits: u32,
    /// How many random semiprimes to add to `numbers`
    pub random_count: usize,
    /// Seed for the semiprime generator
    pub seed: u64,
    /// Where to write the JSON report
    pub output: Option<PathBuf>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            numbers: DEFAULT_CASES.iter().map(|&(n, f)| (n, f.to_vec())).collect(),
            axioms: Algorithm::AXIOMS.to_vec(),
            random_bits: 32,
            random_count: 0,
            seed: 42,
            output: None,
        }
    }
}

impl BenchConfig {
    /// Load and validate a JSON configuration.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, BenchError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BenchError> {
        if self.axioms.is_empty() {
            return Err(BenchError::InvalidConfig("no axioms selected".into()));
        }
        if let Some(axiom) = self.axioms.iter().find(|a| scorer_for(**a).is_none()) {
            return Err(BenchError::InvalidConfig(format!("{} is not an axiom", axiom)));
        }
        if self.numbers.is_empty() && self.random_count == 0 {
            return Err(BenchError::InvalidConfig("nothing to benchmark".into()));
        }
        if let Some((n, _)) = self.numbers.iter().find(|(n, factors)| *n < 2 || factors.is_empty()) {
            return Err(BenchError::InvalidConfig(format!("{} needs n >= 2 and known factors", n)));
        }
        if self.random_count > 0 && !(4..=62).contains(&self.random_bits) {
            return Err(BenchError::InvalidConfig(format!(
                "random_bits must be in 4..=62, got {}",
                self.random_bits
            )));
        }
        Ok(())
    }

    /// The configured numbers followed by `random_count` seeded semiprimes.
    pub fn targets(&self) -> Vec<(u64, Vec<u64>)> {
        let mut targets = self.numbers.clone();
        let mut rng = StdRng::seed_from_u64(self.seed);
        for _ in 0..self.random_count {
            if let Some((n, p, q)) = generate_semiprime(self.random_bits, &mut rng).to_u64() {
                targets.push((n, vec![p, q]));
            }
        }
        targets
    }
}

/// One axiom scored against one number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub axiom: Algorithm,
    pub n: u64,
    pub success: bool,
    pub seconds: f64,
    pub factor_found: Option<u64>,
    pub score: Option<f64>,
}

/// Aggregate over every number an axiom was run on. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxiomBenchmark {
    pub axiom: Algorithm,
    pub total_runs: usize,
    pub successes: usize,
    pub failures: usize,
    pub avg_time: f64,
    pub min_time: f64,
    pub max_time: f64,
    pub success_rate: f64,
    pub results: Vec<BenchmarkResult>,
}

impl AxiomBenchmark {
    pub fn from_results(axiom: Algorithm, results: Vec<BenchmarkResult>) -> Self {
        let total_runs = results.len();
        let successes = results.iter().filter(|r| r.success).count();
        let times: Vec<f64> = results.iter().map(|r| r.seconds).collect();
        let (avg_time, min_time, max_time) = if times.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                times.iter().sum::<f64>() / times.len() as f64,
                times.iter().copied().fold(f64::INFINITY, f64::min),
                times.iter().copied().fold(0.0, f64::max),
            )
        };
        Self {
            axiom,
            total_runs,
            successes,
            failures: total_runs - successes,
            avg_time,
            min_time,
            max_time,
            success_rate: if total_runs == 0 { 0.0 } else { successes as f64 / total_runs as f64 },
            results,
        }
    }

    fn fastest_and_slowest_success(&self) -> Option<(&BenchmarkResult, &BenchmarkResult)> {
        let successes = || self.results.iter().filter(|r| r.success);
        let fastest = successes().min_by(|a, b| a.seconds.total_cmp(&b.seconds))?;
        let slowest = successes().max_by(|a, b| a.seconds.total_cmp(&b.seconds))?;
        Some((fastest, slowest))
    }
}

/// Everything one benchmark run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub axioms: Vec<AxiomBenchmark>,
    pub total_seconds: f64,
}

impl BenchmarkReport {
    pub fn total_tests(&self) -> usize {
        self.axioms.iter().map(|a| a.total_runs).sum()
    }

    pub fn total_successes(&self) -> usize {
        self.axioms.iter().map(|a| a.successes).sum()
    }

    pub fn axiom(&self, axiom: Algorithm) -> Option<&AxiomBenchmark> {
        self.axioms.iter().find(|a| a.axiom == axiom)
    }

    /// Human-readable summary with per-axiom statistics and rankings.
    pub fn render(&self) -> String {
        self.to_string()
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), BenchError> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total_tests();
        let overall = if total == 0 { 0.0 } else { self.total_successes() as f64 / total as f64 };

        writeln!(f, "Prime Axioms Factorizer - Benchmark Report")?;
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(f)?;
        writeln!(f, "Overall Statistics:")?;
        writeln!(f, "  Total Tests: {}", total)?;
        writeln!(f, "  Total Successes: {}", self.total_successes())?;
        writeln!(f, "  Overall Success Rate: {:.2}%", overall * 100.0)?;
        writeln!(f)?;

        for bench in &self.axioms {
            writeln!(f, "{} ({}) Results:", bench.axiom.key().to_uppercase(), bench.axiom)?;
            writeln!(
                f,
                "  Success Rate: {:.2}% ({}/{})",
                bench.success_rate * 100.0,
                bench.successes,
                bench.total_runs
            )?;
            writeln!(f, "  Average Time: {:.4}s", bench.avg_time)?;
            writeln!(f, "  Time Range: {:.4}s - {:.4}s", bench.min_time, bench.max_time)?;
            if let Some((fastest, slowest)) = bench.fastest_and_slowest_success() {
                let factor = |r: &BenchmarkResult| r.factor_found.map_or("-".to_string(), |d| d.to_string());
                writeln!(f, "  Fastest Success: {:.4}s (factor: {})", fastest.seconds, factor(fastest))?;
                writeln!(f, "  Slowest Success: {:.4}s (factor: {})", slowest.seconds, factor(slowest))?;
            }
            writeln!(f)?;
        }

        let mut by_success: Vec<&AxiomBenchmark> = self.axioms.iter().collect();
        by_success.sort_by(|a, b| b.success_rate.total_cmp(&a.success_rate));
        writeln!(f, "Axiom Performance Ranking:")?;
        for (i, bench) in by_success.iter().enumerate() {
            writeln!(
                f,
                "  {}. {}: {:.2}% success, {:.4}s avg",
                i + 1,
                bench.axiom.key(),
                bench.success_rate * 100.0,
                bench.avg_time
            )?;
        }
        writeln!(f)?;

        let mut by_speed = by_success;
        by_speed.sort_by(|a, b| a.avg_time.total_cmp(&b.avg_time));
        writeln!(f, "Speed Ranking (Average Time):")?;
        for (i, bench) in by_speed.iter().enumerate() {
            writeln!(f, "  {}. {}: {:.4}s avg", i + 1, bench.axiom.key(), bench.avg_time)?;
        }
        Ok(())
    }
}

fn run_one(axiom: Algorithm, scorer: DivisorScorer, n: u64, factors: &[u64]) -> BenchmarkResult {
    let start = Instant::now();
    let best = scorer(n);
    let seconds = start.elapsed().as_secs_f64();
    let success = best.is_some_and(|(d, _)| factors.contains(&d));
    log::debug!("{} on {}: {:?} ({})", axiom.key(), n, best, if success { "hit" } else { "miss" });
    BenchmarkResult {
        axiom,
        n,
        success,
        seconds,
        factor_found: best.map(|(d, _)| d),
        score: best.map(|(_, s)| s),
    }
}

/// Score every target with every configured axiom, in parallel.
///
/// Axioms without a scorer are skipped; results keep target order.
pub fn run_benchmarks(config: &BenchConfig) -> BenchmarkReport {
    let start = Instant::now();
    let targets = config.targets();
    log::info!("benchmarking {} axioms on {} numbers", config.axioms.len(), targets.len());

    let axioms = config
        .axioms
        .iter()
        .filter_map(|&axiom| match scorer_for(axiom) {
            Some(scorer) => Some((axiom, scorer)),
            None => {
                log::warn!("skipping {}: no divisor scorer", axiom);
                None
            }
        })
        .map(|(axiom, scorer)| {
            let results: Vec<BenchmarkResult> = targets
                .par_iter()
                .map(|(n, factors)| run_one(axiom, scorer, *n, factors))
                .collect();
            AxiomBenchmark::from_results(axiom, results)
        })
        .collect();

    BenchmarkReport {
        axioms,
        total_seconds: start.elapsed().as_secs_f64(),
    }
}
