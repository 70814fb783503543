//! Axiom 3: spectral duality.
//!
//! Every integer carries a spectral signature built from its bits, residues,
//! digits and golden-ratio harmonics. A true factor pair `(p, q)` of `n`
//! tends to satisfy `S(p) + S(q) ≈ 2·S(n)`; coherence, fold energy and the
//! prime/Fibonacci interference pattern all measure that duality.

pub mod coherence;
pub mod fold;
pub mod interference;
pub mod signature_cache;
pub mod spectrum;

pub use coherence::{coherence, triple_coherence, CoherenceCache};
pub use fold::{find_energy_valleys, fold_energy, sharp_fold_candidates, FoldTopology};
pub use interference::{
    identify_resonance_source, interference_extrema, interference_gradient, prime_fib_interference,
    resonance_strength,
};
pub use signature_cache::{SpectralAnalysis, SpectralSignatureCache};
pub use spectrum::{
    binary_spectrum, digital_spectrum, harmonic_spectrum, modular_spectrum, spectral_vector,
    SPECTRAL_LEN,
};

use factoring_core::divisors_up_to_sqrt;

/// Rank the divisors of `n` up to `√n` by `coherence(d, n/d, n)` and return the strongest.
pub fn score_divisors(n: u64) -> Option<(u64, f64)> {
    let mut cache = SpectralSignatureCache::create_optimized(n);
    let mut best: Option<(u64, f64)> = None;
    for d in divisors_up_to_sqrt(n) {
        let c = cache.coherence(d, n / d, n);
        if best.map_or(true, |(_, s)| c > s) {
            best = Some((d, c));
        }
    }
    best
}
