//! End-to-end factor search combining every observer tool.

use crate::cache::CachedObserver;
use crate::memory::ResonanceMemory;
use crate::navigation::multi_path_search;
use crate::observer::{generate_superposition, Observe};
use crate::quantum::{harmonic_amplify, QuantumTunnel, SpectralFolder};
use spectral_duality::identify_resonance_source;

fn is_factor(n: u64, x: u64) -> bool {
    x > 1 && n % x == 0
}

/// Collapse a superposition seeded by memory predictions, then navigate from
/// the heaviest positions, tunnel exits, harmonics and folding points.
fn search_with(observer: &mut CachedObserver, memory: Option<&ResonanceMemory>, max_iterations: usize) -> Option<u64> {
    let n = observer.n();
    let hints: Vec<u64> = memory
        .map(|m| m.predict(n, 10).into_iter().map(|(x, _)| x).collect())
        .unwrap_or_default();

    let candidates = generate_superposition(n, &hints);
    let candidates = &candidates[..candidates.len().min(50)];
    let collapsed = observer.collapse_wavefunction(candidates, 5);

    if let Some(&(x, _)) = collapsed.iter().take(10).find(|&&(x, _)| is_factor(n, x)) {
        return Some(x);
    }

    for &(x, _) in collapsed.iter().take(5) {
        if let Some(factor) = observer.navigate_to_factor(x, max_iterations.min(20)) {
            return Some(factor);
        }
    }

    let tunnel = QuantumTunnel::new(n);
    for &(x, _) in collapsed.iter().take(3) {
        for exit in tunnel.tunnel_sequence(x, 5) {
            if let Some(factor) = observer.navigate_to_factor(exit, 10) {
                log::debug!("tunnel exit {} led to {}", exit, factor);
                return Some(factor);
            }
        }
    }

    for &(x, _) in collapsed.iter().take(3) {
        if let Some(h) = harmonic_amplify(n, x).into_iter().take(5).find(|&h| is_factor(n, h)) {
            return Some(h);
        }
    }

    let folder = SpectralFolder::new(n);
    for &(x, _) in collapsed.iter().take(5) {
        let fold = folder.nearest_fold(x);
        if is_factor(n, fold) {
            return Some(fold);
        }
        if let Some(factor) = observer.navigate_to_factor(fold, 10) {
            return Some(factor);
        }
    }
    None
}

/// One integrated pass over a fresh cached observer.
pub fn integrated_search(n: u64, memory: Option<&ResonanceMemory>, max_iterations: usize) -> Option<u64> {
    if n < 4 {
        return None;
    }
    let mut observer = CachedObserver::new(n);
    search_with(&mut observer, memory, max_iterations)
}

fn remember(memory: Option<&mut ResonanceMemory>, n: u64, factor: u64, strength: f64) {
    if let Some(memory) = memory {
        let (p, f) = identify_resonance_source(factor, n);
        memory.record(p, f, n, strength, Some(factor));
    }
}

/// Four-phase search for a factor of `n` in `[2, √n]`.
///
/// 1. multi-path gradient ascent from ten evenly spaced starts,
/// 2. collapse of the full superposition,
/// 3. [`integrated_search`] seeded by `memory`,
/// 4. navigation from twenty evenly spaced starts.
///
/// Successes are recorded in `memory` under their strongest resonance source.
pub fn observer_factor(n: u64, mut memory: Option<&mut ResonanceMemory>) -> Option<u64> {
    if n < 4 {
        return None;
    }
    let mut observer = CachedObserver::new(n);
    let root = observer.root();

    log::debug!("phase 1: multi-path search for {}", n);
    let starts: Vec<u64> = (1..=10)
        .map(|i| root * i / 11)
        .filter(|&x| (2..=root).contains(&x))
        .collect();
    let endpoints = multi_path_search(&mut observer, &starts, 10);
    if let Some(&(x, c)) = endpoints.iter().find(|&&(x, _)| is_factor(n, x)) {
        log::info!("found {} at a coherence peak", x);
        remember(memory, n, x, c);
        return Some(x);
    }

    log::debug!("phase 2: superposition collapse for {}", n);
    let candidates = generate_superposition(n, &[]);
    let collapsed = observer.collapse_wavefunction(&candidates, 5);
    if let Some(&(x, w)) = collapsed.iter().take(20).find(|&&(x, _)| is_factor(n, x)) {
        log::info!("found {} in the collapsed state", x);
        remember(memory, n, x, w);
        return Some(x);
    }

    log::debug!("phase 3: integrated search for {}", n);
    if let Some(x) = integrated_search(n, memory.as_deref(), 100) {
        log::info!("found {} by integrated search", x);
        let c = observer.observe(x);
        remember(memory, n, x, c);
        return Some(x);
    }

    log::debug!("phase 4: exhaustive navigation for {}", n);
    for i in 1..=20 {
        let start = root * i / 21;
        if !(2..=root).contains(&start) {
            continue;
        }
        if let Some(x) = observer.navigate_to_factor(start, 50) {
            log::info!("found {} by navigation", x);
            let c = observer.observe(x);
            remember(memory.as_deref_mut(), n, x, c);
            return Some(x);
        }
    }

    log::debug!("no factor found for {}, cache hit rate {:.2}", n, observer.cache_stats().hit_rate);
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observer_factor_small_semiprimes() {
        for (n, p) in [(143u64, 11u64), (323, 17), (899, 29)] {
            if let Some(f) = observer_factor(n, None) {
                assert_eq!(f, p, "n = {}", n);
            }
        }
    }

    #[test]
    fn test_observer_factor_records_success() {
        let mut memory = ResonanceMemory::default();
        // 35 = 5 * 7: every position in [2, 5] is reachable, so the search succeeds.
        let found = observer_factor(35, Some(&mut memory));
        assert_eq!(found, Some(5));
        assert_eq!(memory.successes().count(), 1);
        assert_eq!(memory.successes().next().map(|s| s.factor), Some(5));
    }

    #[test]
    fn test_search_rejects_tiny_and_primes() {
        assert_eq!(observer_factor(3, None), None);
        assert_eq!(integrated_search(2, None, 10), None);
        assert_eq!(observer_factor(97, None), None);
        assert_eq!(integrated_search(101, None, 20), None);
    }

    #[test]
    fn test_integrated_search_finds_divisor() {
        if let Some(f) = integrated_search(2021, None, 100) {
            assert_eq!(2021 % f, 0);
            assert!(f > 1 && f <= 44);
        }
    }
}
