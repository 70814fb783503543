//! End-to-end runs of the axiom benchmark over real configs and report files.

use benchmarks::{run_benchmarks, scorer_for, BenchConfig, BenchError, BenchmarkReport};
use factoring_core::Algorithm;
use std::io::Write;

const SEMIPRIMES: [(u64, u64, u64); 6] = [
    (143, 11, 13),
    (323, 17, 19),
    (899, 29, 31),
    (2021, 43, 47),
    (4087, 61, 67),
    (8051, 83, 97),
];

fn semiprime_config() -> BenchConfig {
    BenchConfig {
        numbers: SEMIPRIMES.iter().map(|&(n, p, q)| (n, vec![p, q])).collect(),
        ..BenchConfig::default()
    }
}

#[test]
fn test_every_axiom_recognizes_balanced_semiprimes() {
    let report = run_benchmarks(&semiprime_config());
    assert_eq!(report.axioms.len(), 5);
    for bench in &report.axioms {
        assert_eq!(bench.success_rate, 1.0, "{} missed a factor: {:?}", bench.axiom, bench.results);
        let found: Vec<_> = bench.results.iter().map(|r| r.factor_found).collect();
        let expected: Vec<_> = SEMIPRIMES.iter().map(|&(_, p, _)| Some(p)).collect();
        assert_eq!(found, expected);
    }
}

#[test]
fn test_default_cases_run_to_completion() {
    let report = run_benchmarks(&BenchConfig::default());
    assert_eq!(report.total_tests(), 100);
    for bench in &report.axioms {
        // The 18 two-prime cases have a single divisor below the root.
        assert!(bench.successes >= 18, "{} only hit {}", bench.axiom, bench.successes);
        assert_eq!(bench.successes + bench.failures, 20);
    }
}

#[test]
fn test_json_report_round_trip() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("report.json");
    let report = run_benchmarks(&semiprime_config());
    report.write_json(&path).expect("report written");

    let text = std::fs::read_to_string(&path).expect("report readable");
    let value: serde_json::Value = serde_json::from_str(&text).expect("valid JSON");
    assert_eq!(value["axioms"][0]["axiom"], "prime_ontology");
    assert_eq!(value["axioms"][4]["results"][5]["factor_found"], 83);

    let parsed: BenchmarkReport = serde_json::from_str(&text).expect("report deserializes");
    assert_eq!(parsed.total_successes(), report.total_successes());
}

#[test]
fn test_partial_config_file_uses_defaults() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, r#"{{"numbers": [[899, [29, 31]]], "axioms": ["spectral_duality"], "seed": 9}}"#).unwrap();

    let config = BenchConfig::from_json_file(file.path()).expect("config loads");
    assert_eq!(config.numbers, vec![(899, vec![29, 31])]);
    assert_eq!(config.axioms, vec![Algorithm::SpectralDuality]);
    assert_eq!(config.seed, 9);
    assert_eq!(config.random_bits, BenchConfig::default().random_bits);

    let report = run_benchmarks(&config);
    assert_eq!(report.axiom(Algorithm::SpectralDuality).map(|b| b.successes), Some(1));
    assert!(report.axiom(Algorithm::PrimeOntology).is_none());
}

#[test]
fn test_config_errors() {
    let missing = BenchConfig::from_json_file("/nonexistent/bench.json");
    assert!(matches!(missing, Err(BenchError::Io(_))));

    let mut garbage = tempfile::NamedTempFile::new().expect("temp file");
    write!(garbage, "{{ not json").unwrap();
    assert!(matches!(BenchConfig::from_json_file(garbage.path()), Err(BenchError::Json(_))));

    let mut classical = tempfile::NamedTempFile::new().expect("temp file");
    write!(classical, r#"{{"axioms": ["pollard_rho_brent"]}}"#).unwrap();
    assert!(matches!(
        BenchConfig::from_json_file(classical.path()),
        Err(BenchError::InvalidConfig(_))
    ));
}

#[test]
fn test_random_semiprimes_are_benchmarked() {
    let config = BenchConfig {
        numbers: vec![],
        axioms: vec![Algorithm::ObserverEffect],
        random_count: 3,
        random_bits: 20,
        seed: 1,
        output: None,
    };
    let report = run_benchmarks(&config);
    let bench = report.axiom(Algorithm::ObserverEffect).expect("axiom ran");
    assert_eq!(bench.total_runs, 3);
    for result in &bench.results {
        assert!(result.factor_found.is_some(), "{} should have a divisor below its root", result.n);
    }
    assert!(scorer_for(Algorithm::TrialDivision).is_none());
}
