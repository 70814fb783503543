//! Hybrid scorers built from weighted axiom combinations, and candidate
//! positions derived from what earlier attempts found or missed.

use crate::meta::ObservationEvent;
use crate::position_coherence;
use factoring_core::{isqrt, primes_up_to, Algorithm};
use fibonacci_flow::{fibonacci_numbers, PHI};
use observer_effect::{MultiScaleObserver, Observe};
use std::collections::{BTreeMap, BTreeSet};

/// Weight per axiom.
pub type AxiomWeights = BTreeMap<Algorithm, f64>;

/// A hybrid position scorer.
pub type Scorer = Box<dyn FnMut(u64) -> f64>;

/// Axioms that contributed to finding a factor at `position`.
#[derive(Debug, Clone, PartialEq)]
pub struct SuccessPattern {
    pub axioms: Vec<Algorithm>,
    pub position: u64,
    pub description: String,
    /// Credit per axiom, `1 / axioms.len()`.
    pub weight: f64,
}

fn prime_score(x: u64) -> f64 {
    primes_up_to(x.min(20))
        .into_iter()
        .map(|p| {
            if x % p == 0 {
                1.0 / p as f64
            } else if x.abs_diff(p) <= 2 {
                0.5 / (1 + x.abs_diff(p)) as f64
            } else {
                0.0
            }
        })
        .sum()
}

fn fibonacci_score(x: u64) -> f64 {
    fibonacci_numbers()
        .skip(1)
        .take_while(|&f| f < x as u128 + 5)
        .map(|f| x.abs_diff(f as u64))
        .filter(|&d| d <= 2)
        .map(|d| 1.0 / (1 + d) as f64)
        .sum()
}

/// `⌊(a + b) / 2⌋` without overflow.
fn midpoint(a: u64, b: u64) -> u64 {
    a / 2 + b / 2 + (a & b & 1)
}

#[derive(Debug, Clone)]
pub struct AxiomSynthesizer {
    n: u64,
    root: u64,
    successes: Vec<SuccessPattern>,
}

impl AxiomSynthesizer {
    pub fn new(n: u64) -> Self {
        Self {
            n,
            root: isqrt(n),
            successes: Vec::new(),
        }
    }

    pub fn root(&self) -> u64 {
        self.root
    }

    pub fn successes(&self) -> &[SuccessPattern] {
        &self.successes
    }

    /// Credit each of `axioms` equally for a factor at `position`. A success
    /// with no axioms is ignored.
    pub fn record_success(&mut self, axioms: &[Algorithm], position: u64, description: &str) {
        if axioms.is_empty() {
            log::debug!("ignoring success at {} with no contributing axiom", position);
            return;
        }
        self.successes.push(SuccessPattern {
            axioms: axioms.to_vec(),
            position,
            description: description.to_string(),
            weight: 1.0 / axioms.len() as f64,
        });
    }

    /// Weighted sum of per-axiom position scores.
    ///
    /// - prime ontology: `1/p` for small primes dividing `x`, `0.5/(1+d)` for primes within 2,
    /// - Fibonacci flow: `1/(1+d)` for Fibonacci numbers within 2,
    /// - spectral duality: position coherence,
    /// - observer effect: multi-scale observation.
    ///
    /// Axioms without a weight do not contribute.
    pub fn synthesize(&self, weights: &AxiomWeights) -> Scorer {
        let n = self.n;
        let weight = |axiom: Algorithm| weights.get(&axiom).copied();
        let prime = weight(Algorithm::PrimeOntology);
        let fibonacci = weight(Algorithm::FibonacciFlow);
        let spectral = weight(Algorithm::SpectralDuality);
        let mut observer = weight(Algorithm::ObserverEffect).map(|w| (w, MultiScaleObserver::new(n)));

        Box::new(move |x: u64| {
            let mut score = 0.0;
            if let Some(w) = prime {
                score += w * prime_score(x);
            }
            if let Some(w) = fibonacci {
                score += w * fibonacci_score(x);
            }
            if let Some(w) = spectral {
                score += w * position_coherence(n, x);
            }
            if let Some((w, observer)) = observer.as_mut() {
                score += *w * observer.observe(x);
            }
            score
        })
    }

    /// Each axiom's share of the recorded credit; equal weights over the
    /// first four axioms when nothing has been recorded.
    pub fn learn_weights(&self) -> AxiomWeights {
        let mut credit = AxiomWeights::new();
        for pattern in &self.successes {
            for &axiom in &pattern.axioms {
                *credit.entry(axiom).or_insert(0.0) += pattern.weight;
            }
        }
        let total: f64 = credit.values().sum();
        if total > 0.0 {
            credit.values_mut().for_each(|w| *w /= total);
            credit
        } else {
            Algorithm::AXIOMS[..4].iter().map(|&a| (a, 0.25)).collect()
        }
    }
}

/// Recorded positions plus the arithmetic mean, geometric mean and golden
/// mixture `a·φ + b/φ` of every ordered pair that falls in `[2, √n]`.
pub fn pattern_fusion(patterns: &[SuccessPattern], n: u64) -> Vec<u64> {
    let root = isqrt(n);
    let in_range = |x: u64| (2..=root).contains(&x);
    let positions: Vec<u64> = patterns.iter().map(|p| p.position).collect();
    let mut fused: BTreeSet<u64> = positions.iter().copied().collect();

    for (i, &a) in positions.iter().enumerate() {
        for &b in &positions[i + 1..] {
            let (af, bf) = (a as f64, b as f64);
            let candidates = [midpoint(a, b), (af * bf).sqrt() as u64, (af * PHI + bf / PHI) as u64];
            fused.extend(candidates.into_iter().filter(|&x| in_range(x)));
        }
    }
    fused.into_iter().collect()
}

/// A synthesized scorer weighted by how often each axiom appears in `combinations`.
pub fn hybrid_method(combinations: &[(Algorithm, Algorithm)], n: u64) -> Scorer {
    let mut counts = AxiomWeights::new();
    for &(a, b) in combinations {
        *counts.entry(a).or_insert(0.0) += 1.0;
        *counts.entry(b).or_insert(0.0) += 1.0;
    }
    let total = 2.0 * combinations.len() as f64;
    counts.values_mut().for_each(|c| *c /= total);
    AxiomSynthesizer::new(n).synthesize(&counts)
}

/// Positions proposed by at least 60% of the axioms, counting neighbours at
/// distance 1 and 2 as half and quarter votes. Strongest first.
pub fn cross_axiom_resonance(n: u64, axiom_results: &BTreeMap<Algorithm, Vec<u64>>) -> Vec<u64> {
    let root = isqrt(n);
    let mut scores: BTreeMap<u64, f64> = BTreeMap::new();

    for positions in axiom_results.values() {
        for &x in positions {
            *scores.entry(x).or_insert(0.0) += 1.0;
            for offset in 1..=2u64 {
                let vote = 0.5 / offset as f64;
                for neighbour in [x.checked_sub(offset), x.checked_add(offset)].into_iter().flatten() {
                    if (2..=root).contains(&neighbour) {
                        *scores.entry(neighbour).or_insert(0.0) += vote;
                    }
                }
            }
        }
    }

    let threshold = axiom_results.len() as f64 * 0.6;
    let mut resonant: Vec<(u64, f64)> = scores.into_iter().filter(|&(_, s)| s >= threshold).collect();
    resonant.sort_by(|a, b| b.1.total_cmp(&a.1));
    resonant.into_iter().map(|(x, _)| x).collect()
}

/// Positions that emerge from combining what different axioms observed:
/// midpoints of nearby prime-ontology and Fibonacci observations, golden
/// extensions of gaps between spectral observations, and positions the
/// observer effect returned to at least three times.
pub fn emergent_patterns(n: u64, history: &[ObservationEvent]) -> Vec<u64> {
    let root = isqrt(n);
    let mut by_axiom: BTreeMap<Algorithm, Vec<u64>> = BTreeMap::new();
    for event in history {
        by_axiom.entry(event.axiom).or_default().push(event.position);
    }
    let positions = |axiom: Algorithm| by_axiom.get(&axiom).map(Vec::as_slice).unwrap_or(&[]);
    let mut emergent = BTreeSet::new();

    let primes: BTreeSet<u64> = positions(Algorithm::PrimeOntology).iter().copied().collect();
    let fibs: BTreeSet<u64> = positions(Algorithm::FibonacciFlow).iter().copied().collect();
    for &p in &primes {
        for &f in fibs.iter().filter(|&&f| f.abs_diff(p) <= 2) {
            emergent.insert(midpoint(p, f));
        }
    }

    let mut peaks = positions(Algorithm::SpectralDuality).to_vec();
    peaks.sort_unstable();
    for w in peaks.windows(2) {
        let extension = ((w[1] - w[0]) as f64 * PHI) as u64;
        if let Some(next) = w[0].checked_add(extension).filter(|x| (2..=root).contains(x)) {
            emergent.insert(next);
        }
    }

    let mut visits: BTreeMap<u64, usize> = BTreeMap::new();
    for &x in positions(Algorithm::ObserverEffect) {
        *visits.entry(x).or_insert(0) += 1;
    }
    emergent.extend(visits.into_iter().filter(|&(_, c)| c >= 3).map(|(x, _)| x));

    emergent.into_iter().collect()
}

/// Midpoints of gaps wider than `√n/20` between failed positions and, when
/// failures are mostly even, the untried odd positions below `min(√n, 100)`.
/// The twenty smallest.
pub fn synthesize_from_failures(n: u64, failed: &[u64]) -> Vec<u64> {
    if failed.is_empty() {
        return Vec::new();
    }
    let root = isqrt(n);
    let failed_set: BTreeSet<u64> = failed.iter().copied().collect();
    let mut candidates = BTreeSet::new();

    let mut sorted = failed.to_vec();
    sorted.sort_unstable();
    for w in sorted.windows(2) {
        if w[1] - w[0] > root / 20 {
            let mid = midpoint(w[0], w[1]);
            if !failed_set.contains(&mid) && (2..=root).contains(&mid) {
                candidates.insert(mid);
            }
        }
    }

    let even = failed.iter().filter(|&&x| x % 2 == 0).count();
    let odd = failed.len() - even;
    if even > odd * 2 {
        candidates.extend((3..root.min(100)).step_by(2).filter(|x| !failed_set.contains(x)));
    }
    candidates.into_iter().take(20).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::MetaObserver;
    use factoring_core::Algorithm::{FibonacciFlow as A2, ObserverEffect as A4, PrimeOntology as A1, SpectralDuality as A3};

    fn weights(pairs: &[(Algorithm, f64)]) -> AxiomWeights {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_prime_and_fibonacci_components() {
        let synthesizer = AxiomSynthesizer::new(10_000);

        let mut prime = synthesizer.synthesize(&weights(&[(A1, 1.0)]));
        // 1/2 + 1/3 + 0.5/2 for the prime 5 one away
        assert!((prime(6) - (0.5 + 1.0 / 3.0 + 0.25)).abs() < 1e-12);
        assert_eq!(prime(1), 0.0);

        let mut fibonacci = synthesizer.synthesize(&weights(&[(A2, 1.0)]));
        assert!((fibonacci(8) - 1.0).abs() < 1e-12);
        // 2, 3 and 5 are within 2 of 4
        assert!((fibonacci(4) - (1.0 / 3.0 + 0.5 + 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_spectral_and_observer_components() {
        let synthesizer = AxiomSynthesizer::new(143);
        let mut spectral = synthesizer.synthesize(&weights(&[(A3, 2.0)]));
        assert!((spectral(11) - 2.0 * position_coherence(143, 11)).abs() < 1e-12);

        let mut observed = synthesizer.synthesize(&weights(&[(A4, 1.0)]));
        let mut observer = MultiScaleObserver::new(143);
        assert!((observed(11) - observer.observe(11)).abs() < 1e-12);

        let mut nothing = synthesizer.synthesize(&AxiomWeights::new());
        assert_eq!(nothing(11), 0.0);
    }

    #[test]
    fn test_learn_weights() {
        let mut synthesizer = AxiomSynthesizer::new(143);
        let defaults = synthesizer.learn_weights();
        assert_eq!(defaults.len(), 4);
        assert!(defaults.values().all(|&w| w == 0.25));
        assert!(!defaults.contains_key(&Algorithm::SelfReference));

        synthesizer.record_success(&[A1, A2], 11, "prime and Fibonacci agree");
        synthesizer.record_success(&[A1], 13, "");
        synthesizer.record_success(&[], 7, "ignored");
        assert_eq!(synthesizer.successes().len(), 2);

        let learned = synthesizer.learn_weights();
        assert!((learned[&A1] - 0.75).abs() < 1e-12);
        assert!((learned[&A2] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_pattern_fusion() {
        let mut synthesizer = AxiomSynthesizer::new(10_000);
        synthesizer.record_success(&[A1], 10, "");
        synthesizer.record_success(&[A2], 20, "");
        // mean 15, √200 = 14, 10φ + 20/φ = 28
        assert_eq!(pattern_fusion(synthesizer.successes(), 10_000), vec![10, 14, 15, 20, 28]);
        assert!(pattern_fusion(&[], 10_000).is_empty());
    }

    #[test]
    fn test_positions_near_u64_max() {
        assert_eq!(midpoint(u64::MAX, u64::MAX - 2), u64::MAX - 1);
        assert_eq!(midpoint(7, 10), 8);

        let mut synthesizer = AxiomSynthesizer::new(143);
        synthesizer.record_success(&[A1], u64::MAX - 1, "");
        synthesizer.record_success(&[A3], u64::MAX - 3, "");
        // Every fused candidate lies far beyond the root of 143.
        assert_eq!(pattern_fusion(synthesizer.successes(), 143), vec![u64::MAX - 3, u64::MAX - 1]);

        let mut observer = MetaObserver::new(10_000);
        observer.record_observation(u64::MAX - 1, 0.5, A1, false);
        observer.record_observation(u64::MAX, 0.5, A2, false);
        observer.record_observation(u64::MAX - 5, 0.5, A3, false);
        observer.record_observation(u64::MAX, 0.5, A3, false);
        assert_eq!(emergent_patterns(10_000, observer.history()), vec![u64::MAX - 1]);

        let suggestions = synthesize_from_failures(10_000, &[4, u64::MAX - 1]);
        assert!(suggestions.iter().all(|&x| (2..=100).contains(&x)));
    }

    #[test]
    fn test_hybrid_method_weights() {
        let mut hybrid = hybrid_method(&[(A1, A2), (A1, A3)], 2021);
        let mut expected = AxiomSynthesizer::new(2021).synthesize(&weights(&[(A1, 0.5), (A2, 0.25), (A3, 0.25)]));
        for x in [5u64, 11, 43] {
            assert!((hybrid(x) - expected(x)).abs() < 1e-12, "x = {}", x);
        }
    }

    #[test]
    fn test_cross_axiom_resonance() {
        let results: BTreeMap<Algorithm, Vec<u64>> =
            [(A1, vec![10]), (A2, vec![10, 30]), (A3, vec![11])].into_iter().collect();
        // 10: two votes plus half from 11; 11: one vote plus two halves from 10.
        assert_eq!(cross_axiom_resonance(10_000, &results), vec![10, 11]);
        assert!(cross_axiom_resonance(10_000, &BTreeMap::new()).is_empty());
    }

    #[test]
    fn test_emergent_patterns() {
        let mut observer = MetaObserver::new(10_000);
        observer.record_observation(11, 0.5, A1, false);
        observer.record_observation(13, 0.5, A2, false);
        observer.record_observation(20, 0.5, A3, false);
        observer.record_observation(30, 0.5, A3, false);
        for _ in 0..3 {
            observer.record_observation(50, 0.5, A4, false);
        }
        observer.record_observation(60, 0.5, A4, false);
        // (11 + 13)/2, 20 + ⌊10φ⌋, and 50 seen three times
        assert_eq!(emergent_patterns(10_000, observer.history()), vec![12, 36, 50]);
    }

    #[test]
    fn test_synthesize_from_failures() {
        let candidates = synthesize_from_failures(10_000, &[2, 4, 6, 8, 40]);
        assert_eq!(candidates.len(), 20);
        assert_eq!(&candidates[..4], &[3, 5, 7, 9]);
        assert!(candidates.contains(&24), "midpoint of the 8..40 gap");
        assert!(candidates.iter().all(|x| ![2, 4, 6, 8, 40].contains(x)));

        assert!(synthesize_from_failures(10_000, &[]).is_empty());
        // Balanced parity and small gaps: nothing to suggest.
        assert!(synthesize_from_failures(10_000, &[10, 11, 12, 13]).is_empty());
    }
}
