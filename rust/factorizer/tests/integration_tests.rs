use factoring_core::is_probably_prime;
use factorizer::{factorize_number, format_factors};
use num_bigint::BigUint;
use num_traits::One;
use std::process::Command;

fn run(arg: &str) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_factorize"))
        .arg(arg)
        .output()
        .expect("factorize binary runs")
}

#[test]
fn test_cli_prints_factors() {
    for (input, expected) in [("2", "2"), ("97", "97"), ("15", "3 * 5"), ("84", "2 * 2 * 3 * 7"), ("1", "1")] {
        let output = run(input);
        assert!(output.status.success(), "factorize {} failed", input);
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), expected);
    }
}

#[test]
fn test_cli_rejects_invalid_input() {
    for input in ["abc", "-5", "12.5"] {
        let output = run(input);
        assert_eq!(output.status.code(), Some(1), "input {:?}", input);
        assert!(output.stdout.is_empty());
        assert!(!output.stderr.is_empty());
    }
}

#[test]
fn test_product_of_factors_is_input() {
    for n in [2u64, 360, 561, 1_001, 65_536, 999_983 * 1_000_003, 600_851_475_143] {
        let n = BigUint::from(n);
        let factors = factorize_number(&n);
        let product = factors.iter().fold(BigUint::one(), |acc, f| acc * f);
        assert_eq!(product, n, "factors {}", format_factors(&factors));
        assert!(factors.windows(2).all(|w| w[0] <= w[1]));
        assert!(factors.iter().all(|f| is_probably_prime(f, 20)));
    }
}
