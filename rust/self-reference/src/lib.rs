//! Axiom 5: self-reference.
//!
//! The earlier axioms are turned on themselves. Positions are reflected
//! through the spectral signature of `n` ([`SpectralMirror`]), coherence
//! fields are iterated until they settle ([`RecursiveCoherence`]), the
//! observers are observed ([`MetaObserver`]), axioms are blended into hybrid
//! scorers ([`AxiomSynthesizer`]) and failed positions are remembered so
//! later candidates avoid them ([`FailureMemory`]).

pub mod failure;
pub mod meta;
pub mod mirror;
pub mod recursive;
pub mod synthesis;

pub use failure::{
    adaptive_strategy, analyze_failure_patterns, detect_spectral_nulls, failure_gradient, inverse_failure_search,
    Failure, FailureMemory, PositionTraits,
};
pub use meta::{
    analyze_axiom_interference, detect_blind_spots, meta_coherence_field, AxiomPerformanceProfile, MetaObserver,
    ObservationEvent, ObservationPatterns,
};
pub use mirror::{
    create_mirror_field, detect_mirror_symmetries, find_mirror_points, inverse_spectral_map, recursive_mirror,
    spectral_modulated_search, SpectralMirror,
};
pub use recursive::{
    find_coherence_attractors, fractal_coherence_pattern, golden_ratio_recursion, meta_coherence,
    recursive_fixed_point_search, CoherenceField, RecursiveCoherence,
};
pub use synthesis::{
    cross_axiom_resonance, emergent_patterns, hybrid_method, pattern_fusion, synthesize_from_failures, AxiomSynthesizer,
    AxiomWeights, Scorer, SuccessPattern,
};

use factoring_core::{divisors_up_to_sqrt, isqrt};
use spectral_duality::coherence;

/// `coherence(x, n/x, n)` for a divisor, `coherence(x, x, n)` otherwise.
pub(crate) fn position_coherence(n: u64, x: u64) -> f64 {
    if x > 0 && n % x == 0 {
        coherence(x, n / x, n)
    } else {
        coherence(x, x, n)
    }
}

/// Rank the divisors of `n` up to `√n` by recursive coherence plus the
/// coherence at their mirror point, and return the strongest.
///
/// The field starts at 0.5 over the divisors and `2..=min(√n, 19)` and is
/// iterated three levels deep.
pub fn score_divisors(n: u64) -> Option<(u64, f64)> {
    let divisors = divisors_up_to_sqrt(n);
    if divisors.is_empty() {
        return None;
    }

    let initial: CoherenceField = divisors
        .iter()
        .copied()
        .chain(2..(isqrt(n) + 1).min(20))
        .map(|x| (x, 0.5))
        .collect();
    let mut recursive = RecursiveCoherence::new(n);
    recursive.iterate(initial, 3);
    let field = recursive.final_field()?;

    let mut mirror = SpectralMirror::new(n);
    let mut best: Option<(u64, f64)> = None;
    for d in divisors {
        let at = |x: u64| field.get(&x).copied().unwrap_or(0.0);
        let score = at(d) + at(mirror.find_mirror_point(d));
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((d, score));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_divisors_semiprimes() {
        for (n, p) in [(143u64, 11u64), (323, 17), (899, 29), (2021, 43), (4087, 61), (8051, 83)] {
            let (d, score) = score_divisors(n).expect("semiprime has a divisor below its root");
            assert_eq!(d, p, "n = {}", n);
            assert!(score >= 0.8285 - 1e-12, "score of {} in {} = {}", p, n, score);
        }
    }

    #[test]
    fn test_score_divisors_none() {
        assert!(score_divisors(97).is_none());
        assert!(score_divisors(1).is_none());
        assert!(score_divisors(0).is_none());
    }

    #[test]
    fn test_score_divisors_counts_mirror_in_field() {
        // 143: root 11 is both the only divisor and inside the field, and
        // every divisor mirrors onto the root, so the mirror adds its value.
        let (_, score) = score_divisors(143).expect("143 = 11 * 13");
        assert!((score - 2.0 * 0.8285).abs() < 1e-9, "score = {}", score);
    }

    #[test]
    fn test_position_coherence() {
        assert_eq!(position_coherence(143, 11), coherence(11, 13, 143));
        assert_eq!(position_coherence(143, 10), coherence(10, 10, 143));
        assert_eq!(position_coherence(143, 0), coherence(0, 0, 143));
    }
}
