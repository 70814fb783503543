//! Axiom 1: prime ontology.
//!
//! Numbers are located by their residues over a small prime basis. The
//! "pull" of a position rewards shared zero residues with `n`, and geodesic
//! walks climb that pull toward a prime factor.

pub mod cascade;
pub mod coordinate_index;
pub mod geodesic;

pub use cascade::PrimeCascade;
pub use coordinate_index::PrimeCoordinateIndex;
pub use geodesic::PrimeGeodesic;

use factoring_core::divisors_up_to_sqrt;

/// Rank the divisors of `n` up to `√n` by pull and return the strongest.
///
/// Ties keep the smaller divisor. `None` when `n` has no such divisor.
pub fn score_divisors(n: u64) -> Option<(u64, f64)> {
    let mut index = PrimeCoordinateIndex::create_optimized(n);
    let mut best: Option<(u64, f64)> = None;
    for d in divisors_up_to_sqrt(n) {
        let pull = index.pull(d, n);
        if best.map_or(true, |(_, s)| pull > s) {
            best = Some((d, pull));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_divisors_semiprimes() {
        for (n, p) in [(143u64, 11u64), (323, 17), (899, 29), (2021, 43), (4087, 61)] {
            let (d, pull) = score_divisors(n).expect("semiprime has a divisor below its root");
            assert_eq!(d, p, "n = {}", n);
            assert!(pull >= 2.0, "divisor pull for {} should carry the bonus, got {}", n, pull);
        }
    }

    #[test]
    fn test_score_divisors_prime() {
        assert!(score_divisors(97).is_none());
        assert!(score_divisors(1).is_none());
    }

    #[test]
    fn test_score_prefers_shared_small_primes() {
        // 6765 = 3 * 5 * 11 * 41; 15 shares two basis primes with n.
        let (d, _) = score_divisors(6765).unwrap();
        assert_eq!(d, 15);
    }
}
