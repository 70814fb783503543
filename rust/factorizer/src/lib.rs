//! Complete prime factorization of arbitrary-precision integers.
//!
//! Small prime factors are removed by trial division over an Eratosthenes
//! sieve up to `min(⌊√n⌋ + 1, SIEVE_LIMIT)`. A composite cofactor left over
//! (only possible when `√n` exceeds the sieve) is split with Pollard's rho
//! in Brent's form and the pieces are factored recursively.

use factoring_core::{is_probably_prime, pollard_rho_brent, trial_division, Algorithm, FactorResult};
use num_bigint::BigUint;
use num_traits::{One, ToPrimitive};
use std::time::Instant;

/// Largest trial divisor.
pub const SIEVE_LIMIT: u64 = 10_000_000;

const PRIMALITY_ROUNDS: u32 = 20;

/// Prime factors of `n` with multiplicity, ascending. Empty for `n < 2`.
pub fn factorize_number(n: &BigUint) -> Vec<BigUint> {
    factorize(n).factors
}

/// [`factorize_number`] with timing and the method that finished the job.
///
/// `complete` is false only when Pollard's rho failed to split a composite
/// cofactor, which is then reported as a single factor.
pub fn factorize(n: &BigUint) -> FactorResult {
    let start = Instant::now();
    let mut factors = Vec::new();
    let mut algorithm = Algorithm::TrialDivision;
    let mut complete = true;

    if *n > BigUint::one() {
        let bound = (n.sqrt() + 1u32).to_u64().unwrap_or(u64::MAX).min(SIEVE_LIMIT);
        let (small, remaining) = trial_division(n, bound);
        factors = small;

        if remaining > BigUint::one() {
            if is_probably_prime(&remaining, PRIMALITY_ROUNDS) {
                factors.push(remaining);
            } else {
                log::debug!("splitting cofactor {} with Pollard-Brent", remaining);
                algorithm = Algorithm::PollardRhoBrent;
                complete = split_cofactor(remaining, &mut factors);
            }
        }
        factors.sort();
    }

    FactorResult {
        n: n.clone(),
        factors,
        algorithm,
        duration: start.elapsed(),
        complete,
    }
}

/// Push the prime factors of the composite `m`; false when some piece could not be split.
fn split_cofactor(m: BigUint, factors: &mut Vec<BigUint>) -> bool {
    if is_probably_prime(&m, PRIMALITY_ROUNDS) {
        factors.push(m);
        return true;
    }
    match pollard_rho_brent(&m) {
        Some(d) => {
            let rest = &m / &d;
            let left = split_cofactor(d, factors);
            let right = split_cofactor(rest, factors);
            left && right
        }
        None => {
            log::warn!("could not split {}", m);
            factors.push(m);
            false
        }
    }
}

/// Factors joined by `" * "`, or `"1"` when there are none.
pub fn format_factors(factors: &[BigUint]) -> String {
    if factors.is_empty() {
        return "1".to_string();
    }
    factors.iter().map(|f| f.to_string()).collect::<Vec<_>>().join(" * ")
}
