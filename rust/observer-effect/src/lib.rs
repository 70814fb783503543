//! Axiom 4: the observer effect.
//!
//! Coherence is observed at several scales at once, and the observation
//! itself shapes the search: candidate sets collapse toward heavy positions,
//! gradients are climbed, stalled walks jump along harmonics, and successful
//! resonances are remembered for the next number.
//!
//! Observers implement [`Observe`]. [`CachedObserver`] wraps any observer with
//! an [`ObserverCache`] and is what the search functions use.

pub mod cache;
pub mod memory;
pub mod navigation;
pub mod observer;
pub mod quantum;
pub mod search;

pub use cache::{CachedObserver, ObserverCache, QuantumState};
pub use memory::{analyze_resonance_landscape, resonance_guided_search, ResonanceMemory, Success};
pub use navigation::{
    coherence_flow_lines, coherence_gradient, find_coherence_peaks, gradient_ascent, harmonic_jump,
    multi_path_search, navigate_to_factor,
};
pub use observer::{
    coherence_gradient_field, collapse_wavefunction, generate_superposition, MultiScaleObserver, Observe, Scales,
};
pub use quantum::{entangle_positions, harmonic_amplify, superposition_collapse, QuantumTunnel, SpectralFolder};
pub use search::{integrated_search, observer_factor};

use factoring_core::divisors_up_to_sqrt;

/// Rank the divisors of `n` up to `√n` by multi-scale observation and return the strongest.
pub fn score_divisors(n: u64) -> Option<(u64, f64)> {
    let mut observer = MultiScaleObserver::new(n);
    let mut best: Option<(u64, f64)> = None;
    for d in divisors_up_to_sqrt(n) {
        let score = observer.observe(d);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((d, score));
        }
    }
    best
}
