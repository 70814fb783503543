//! Axiom 2: Fibonacci flow.
//!
//! Candidate divisors are scored by their proximity to the Fibonacci
//! sequence: exact Fibonacci values, golden-ratio "vortex" positions around
//! them, points on a golden spiral, and how closely a divisor and its
//! cofactor both track the sequence.

pub mod entanglement;
pub mod resonance_map;
pub mod sequence;
pub mod vortices;

pub use entanglement::{min_fibonacci_distance, FibonacciEntanglement};
pub use resonance_map::FibonacciResonanceMap;
pub use sequence::{
    fib, fib_wave, fibonacci_numbers, is_fibonacci, lucas, nearest_fibonacci_index, GOLDEN_ANGLE,
    MAX_FIB_INDEX, PHI, PSI, SQRT5,
};
pub use vortices::{fib_vortices, fibonacci_lattice_points, golden_spiral_positions};

use factoring_core::divisors_up_to_sqrt;

/// Errors from exact Fibonacci/Lucas evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("Fibonacci index must be non-negative, got {0}")]
    NegativeIndex(i64),

    #[error("Fibonacci index {0} exceeds the u128 range (max {max})", max = MAX_FIB_INDEX)]
    IndexTooLarge(i64),
}

/// Points on the golden spiral sampled for scoring.
const SPIRAL_POINTS: usize = 20;

/// Fibonacci affinity of divisor `d` of `n`, given the precomputed vortex and spiral positions.
///
/// 2.0 for a Fibonacci divisor, 1.5 for a vortex position, 1.0 for a spiral
/// position, plus the pair's alignment score and a 0.5 base.
pub fn divisor_score(
    n: u64,
    d: u64,
    vortices: &[u64],
    spiral: &[u64],
    entanglement: &FibonacciEntanglement,
) -> f64 {
    let mut score = 0.5;
    if is_fibonacci(d) {
        score += 2.0;
    }
    if vortices.binary_search(&d).is_ok() {
        score += 1.5;
    }
    if spiral.contains(&d) {
        score += 1.0;
    }
    score + entanglement.fibonacci_alignment_score(d, n / d)
}

/// Rank the divisors of `n` up to `√n` by Fibonacci affinity and return the strongest.
pub fn score_divisors(n: u64) -> Option<(u64, f64)> {
    let vortices = fib_vortices(n, None);
    let spiral = golden_spiral_positions(n, SPIRAL_POINTS);
    let entanglement = FibonacciEntanglement::new(n);

    let mut best: Option<(u64, f64)> = None;
    for d in divisors_up_to_sqrt(n) {
        let score = divisor_score(n, d, &vortices, &spiral, &entanglement);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((d, score));
        }
    }
    best
}
