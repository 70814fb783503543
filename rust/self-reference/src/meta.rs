//! Observation of the observers: which axiom looked where, how coherent it
//! was, and which regions nobody has looked at.

use factoring_core::{isqrt, Algorithm};
use serde::Serialize;
use spectral_duality::spectral_vector;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Coherence below which an unsuccessful observation marks a blind spot.
const BLIND_SPOT_COHERENCE: f64 = 0.1;

/// Success and failure counts per axiom and number characteristic.
#[derive(Debug, Clone, Default)]
pub struct AxiomPerformanceProfile {
    successes: BTreeMap<Algorithm, BTreeMap<String, usize>>,
    failures: BTreeMap<Algorithm, BTreeMap<String, usize>>,
    timings: BTreeMap<Algorithm, Vec<Duration>>,
}

impl AxiomPerformanceProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size class, bit-length decade, residues mod 3, 5 and 7, digital root
    /// and bit density of `n`.
    pub fn characterize(n: u64) -> BTreeSet<String> {
        let size = match n {
            0..=99 => "small",
            100..=9_999 => "medium",
            _ => "large",
        };
        let bits = u64::BITS - n.leading_zeros();
        let droot = if n > 0 { 1 + (n - 1) % 9 } else { 0 };
        let density = if spectral_vector(n).first().is_some_and(|&d| d > 0.5) {
            "high_density"
        } else {
            "low_density"
        };

        [
            size.to_string(),
            format!("bits_{}0s", bits / 10),
            format!("mod3_{}", n % 3),
            format!("mod5_{}", n % 5),
            format!("mod7_{}", n % 7),
            format!("droot_{}", droot),
            density.to_string(),
        ]
        .into_iter()
        .collect()
    }

    pub fn record_attempt(&mut self, axiom: Algorithm, n: u64, success: bool, elapsed: Duration) {
        let table = if success { &mut self.successes } else { &mut self.failures };
        let counts = table.entry(axiom).or_default();
        for trait_name in Self::characterize(n) {
            *counts.entry(trait_name).or_insert(0) += 1;
        }
        if !elapsed.is_zero() {
            self.timings.entry(axiom).or_default().push(elapsed);
        }
    }

    pub fn average_time(&self, axiom: Algorithm) -> Option<Duration> {
        let times = self.timings.get(&axiom).filter(|t| !t.is_empty())?;
        Some(times.iter().sum::<Duration>() / times.len() as u32)
    }

    /// Axiom with the best mean success ratio over the characteristics of
    /// `n`, among axioms that have succeeded at least once. Prime ontology
    /// when nothing is known.
    pub fn best_axiom(&self, n: u64) -> Algorithm {
        let traits = Self::characterize(n);
        let mut best: Option<(Algorithm, f64)> = None;

        for (&axiom, successes) in &self.successes {
            let failures = self.failures.get(&axiom);
            let ratios: Vec<f64> = traits
                .iter()
                .filter_map(|t| {
                    let s = successes.get(t).copied().unwrap_or(0);
                    let f = failures.and_then(|f| f.get(t)).copied().unwrap_or(0);
                    (s + f > 0).then(|| s as f64 / (s + f) as f64)
                })
                .collect();
            if ratios.is_empty() {
                continue;
            }
            let score = ratios.iter().sum::<f64>() / ratios.len() as f64;
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((axiom, score));
            }
        }
        best.map_or(Algorithm::PrimeOntology, |(axiom, _)| axiom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObservationEvent {
    pub position: u64,
    pub coherence: f64,
    pub axiom: Algorithm,
    pub found: bool,
    /// Index of the event in the observer's history.
    pub timestamp: usize,
}

/// Regions of interest found in an observation history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObservationPatterns {
    /// Positions observed more than twice as often as the average position.
    pub high_activity: Vec<u64>,
    /// Positions whose coherence beat both the previous and next observation.
    pub coherence_peaks: Vec<u64>,
    /// Positions where the observing axiom changed.
    pub axiom_boundaries: Vec<u64>,
    /// Positions revisited after more than two other observations.
    pub repetition_cycles: Vec<u64>,
}

#[derive(Debug, Clone)]
pub struct MetaObserver {
    n: u64,
    root: u64,
    history: Vec<ObservationEvent>,
    blind_spots: BTreeSet<u64>,
}

impl MetaObserver {
    pub fn new(n: u64) -> Self {
        Self {
            n,
            root: isqrt(n),
            history: Vec::new(),
            blind_spots: BTreeSet::new(),
        }
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn root(&self) -> u64 {
        self.root
    }

    pub fn history(&self) -> &[ObservationEvent] {
        &self.history
    }

    pub fn blind_spots(&self) -> &BTreeSet<u64> {
        &self.blind_spots
    }

    pub fn record_observation(&mut self, position: u64, coherence: f64, axiom: Algorithm, found: bool) {
        self.history.push(ObservationEvent {
            position,
            coherence,
            axiom,
            found,
            timestamp: self.history.len(),
        });
        if !found && coherence < BLIND_SPOT_COHERENCE {
            self.blind_spots.insert(position);
        }
    }

    /// `exp(−variance)` of the coherences observed within `max(1, √n/20)` of
    /// `position`, plus 0.5 per success within 2, capped at 1. Zero with fewer
    /// than two nearby observations.
    pub fn meta_coherence(&self, position: u64) -> f64 {
        let window = (self.root / 20).max(1);
        let nearby: Vec<f64> = self
            .history
            .iter()
            .filter(|e| e.position.abs_diff(position) <= window)
            .map(|e| e.coherence)
            .collect();
        if nearby.len() < 2 {
            return 0.0;
        }
        let mean = nearby.iter().sum::<f64>() / nearby.len() as f64;
        let variance = nearby.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / nearby.len() as f64;

        let boost = 0.5
            * self
                .history
                .iter()
                .filter(|e| e.found && e.position.abs_diff(position) <= 2)
                .count() as f64;
        ((-variance).exp() + boost).min(1.0)
    }

    /// Patterns in the history; empty until ten observations have been made.
    pub fn detect_patterns(&self) -> ObservationPatterns {
        let mut patterns = ObservationPatterns::default();
        if self.history.len() < 10 {
            return patterns;
        }

        let mut counts: BTreeMap<u64, usize> = BTreeMap::new();
        for event in &self.history {
            *counts.entry(event.position).or_insert(0) += 1;
        }
        let average = self.history.len() as f64 / counts.len() as f64;
        patterns.high_activity = counts
            .iter()
            .filter(|&(_, &c)| c as f64 > 2.0 * average)
            .map(|(&x, _)| x)
            .collect();

        patterns.coherence_peaks = self
            .history
            .windows(3)
            .filter(|w| w[1].coherence > w[0].coherence && w[1].coherence > w[2].coherence)
            .map(|w| w[1].position)
            .collect();

        patterns.axiom_boundaries = self
            .history
            .windows(2)
            .filter(|w| w[0].axiom != w[1].axiom)
            .map(|w| w[1].position)
            .collect();

        let mut last_seen: BTreeMap<u64, usize> = BTreeMap::new();
        for (i, event) in self.history.iter().enumerate() {
            if let Some(previous) = last_seen.insert(event.position, i) {
                if i - previous > 2 {
                    patterns.repetition_cycles.push(event.position);
                }
            }
        }
        patterns
    }
}

/// Centers of windows of width `max(1, √n/20)` covered below
/// `coverage_threshold`, together with the observer's low-coherence
/// positions. Ascending, without repeats.
pub fn detect_blind_spots(observer: &MetaObserver, coverage_threshold: f64) -> Vec<u64> {
    let root = observer.root();
    let observed: BTreeSet<u64> = observer.history().iter().map(|e| e.position).collect();

    let window = (root / 20).max(1);
    let step = (window / 2).max(1) as usize;
    let mut spots: BTreeSet<u64> = observer.blind_spots().clone();

    for start in (2..=root.saturating_sub(window)).step_by(step) {
        let covered = observed.range(start..start + window).count();
        if (covered as f64 / window as f64) < coverage_threshold {
            spots.insert(start + window / 2);
        }
    }
    spots.into_iter().collect()
}

/// Mean positive meta-coherence across observers at every position in `[2, √n]`.
pub fn meta_coherence_field(n: u64, observers: &[MetaObserver]) -> BTreeMap<u64, f64> {
    (2..=isqrt(n))
        .map(|x| {
            let values: Vec<f64> = observers
                .iter()
                .map(|o| o.meta_coherence(x))
                .filter(|&m| m > 0.0)
                .collect();
            let value = if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            };
            (x, value)
        })
        .collect()
}

/// Mean coherence jump at each change of axiom, keyed by the ordered axiom pair.
pub fn analyze_axiom_interference(observers: &[MetaObserver]) -> BTreeMap<(Algorithm, Algorithm), f64> {
    let mut totals: BTreeMap<(Algorithm, Algorithm), (f64, usize)> = BTreeMap::new();
    for observer in observers {
        for w in observer.history().windows(2) {
            let (prev, curr) = (&w[0], &w[1]);
            if prev.axiom == curr.axiom {
                continue;
            }
            let pair = (prev.axiom.min(curr.axiom), prev.axiom.max(curr.axiom));
            let entry = totals.entry(pair).or_insert((0.0, 0));
            entry.0 += (curr.coherence - prev.coherence).abs();
            entry.1 += 1;
        }
    }
    totals
        .into_iter()
        .map(|(pair, (sum, count))| (pair, sum / count as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripted_observer() -> MetaObserver {
        use factoring_core::Algorithm::{FibonacciFlow as A2, PrimeOntology as A1, SpectralDuality as A3};
        let mut observer = MetaObserver::new(10_000);
        let script = [
            (10, 0.1, A1),
            (20, 0.5, A1),
            (10, 0.2, A1),
            (30, 0.6, A2),
            (10, 0.3, A2),
            (40, 0.7, A2),
            (50, 0.4, A3),
            (10, 0.8, A3),
            (60, 0.5, A3),
            (70, 0.9, A3),
        ];
        for (x, c, axiom) in script {
            observer.record_observation(x, c, axiom, false);
        }
        observer
    }

    #[test]
    fn test_characterize() {
        let traits = AxiomPerformanceProfile::characterize(143);
        let expected = ["medium", "bits_00s", "mod3_2", "mod5_3", "mod7_3", "droot_8", "high_density"];
        for t in expected {
            assert!(traits.contains(t), "143 should have trait {}", t);
        }
        assert_eq!(traits.len(), expected.len());
        assert!(AxiomPerformanceProfile::characterize(1 << 20).contains("large"));
    }

    #[test]
    fn test_best_axiom() {
        let mut profile = AxiomPerformanceProfile::new();
        assert_eq!(profile.best_axiom(143), Algorithm::PrimeOntology);

        profile.record_attempt(Algorithm::SpectralDuality, 143, true, Duration::from_millis(2));
        profile.record_attempt(Algorithm::SpectralDuality, 323, false, Duration::from_millis(4));
        profile.record_attempt(Algorithm::ObserverEffect, 143, true, Duration::ZERO);
        profile.record_attempt(Algorithm::ObserverEffect, 323, true, Duration::ZERO);
        profile.record_attempt(Algorithm::FibonacciFlow, 143, false, Duration::ZERO);

        assert_eq!(profile.best_axiom(143), Algorithm::ObserverEffect);
        assert_eq!(profile.average_time(Algorithm::SpectralDuality), Some(Duration::from_millis(3)));
        assert_eq!(profile.average_time(Algorithm::ObserverEffect), None);
    }

    #[test]
    fn test_meta_coherence() {
        let mut observer = MetaObserver::new(10_000);
        observer.record_observation(50, 0.2, Algorithm::ObserverEffect, false);
        observer.record_observation(52, 0.4, Algorithm::ObserverEffect, false);
        observer.record_observation(54, 0.6, Algorithm::ObserverEffect, false);

        let expected = (-0.08f64 / 3.0).exp();
        assert!((observer.meta_coherence(52) - expected).abs() < 1e-9);
        assert_eq!(observer.meta_coherence(40), 0.0, "nothing observed within 5 of 40");

        observer.record_observation(54, 0.6, Algorithm::SelfReference, true);
        assert_eq!(observer.meta_coherence(52), 1.0);
    }

    #[test]
    fn test_blind_spots_from_low_coherence() {
        let mut observer = MetaObserver::new(10_000);
        observer.record_observation(33, 0.05, Algorithm::PrimeOntology, false);
        observer.record_observation(34, 0.05, Algorithm::PrimeOntology, true);
        assert_eq!(observer.blind_spots().iter().copied().collect::<Vec<_>>(), vec![33]);
    }

    #[test]
    fn test_detect_patterns() {
        let patterns = scripted_observer().detect_patterns();
        assert_eq!(patterns.high_activity, vec![10]);
        assert_eq!(patterns.coherence_peaks, vec![20, 30, 40, 10]);
        assert_eq!(patterns.axiom_boundaries, vec![30, 50]);
        assert_eq!(patterns.repetition_cycles, vec![10]);

        let json = serde_json::to_string(&patterns).expect("patterns serialize");
        assert!(json.contains("\"high_activity\":[10]"));

        assert_eq!(MetaObserver::new(100).detect_patterns(), ObservationPatterns::default());
    }

    #[test]
    fn test_detect_blind_spots() {
        let mut observer = MetaObserver::new(10_000);
        let spots = detect_blind_spots(&observer, 0.8);
        // Windows of 5 starting at 2, 4, ..., 94.
        assert_eq!(spots.len(), 47);
        assert_eq!(spots.first(), Some(&4));
        assert_eq!(spots.last(), Some(&96));

        for x in 2..=100 {
            observer.record_observation(x, 0.5, Algorithm::SpectralDuality, false);
        }
        assert!(detect_blind_spots(&observer, 0.8).is_empty());
        observer.record_observation(33, 0.01, Algorithm::SpectralDuality, false);
        assert_eq!(detect_blind_spots(&observer, 0.8), vec![33]);
    }

    #[test]
    fn test_meta_coherence_field() {
        let observer = scripted_observer();
        let field = meta_coherence_field(10_000, &[observer.clone(), MetaObserver::new(10_000)]);
        assert_eq!(field.len(), 99);
        assert!((field[&10] - observer.meta_coherence(10)).abs() < 1e-12);
        assert_eq!(field[&90], 0.0);
    }

    #[test]
    fn test_axiom_interference() {
        let interference = analyze_axiom_interference(&[scripted_observer()]);
        assert_eq!(interference.len(), 2);
        let a12 = interference[&(Algorithm::PrimeOntology, Algorithm::FibonacciFlow)];
        let a23 = interference[&(Algorithm::FibonacciFlow, Algorithm::SpectralDuality)];
        assert!((a12 - 0.4).abs() < 1e-9);
        assert!((a23 - 0.3).abs() < 1e-9);
    }
}
