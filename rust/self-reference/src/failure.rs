//! Memory of positions that did not yield a factor, used to steer later
//! candidates away from dead ends.

use crate::position_coherence;
use factoring_core::{isqrt, Algorithm};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

pub const DEFAULT_FAILURE_MEMORY: usize = 100;
/// Coherence below which a failed position counts as a spectral null.
const NULL_COHERENCE: f64 = 0.1;
/// Widest span of failures grouped into one dead end.
const DEAD_END_SPAN: u64 = 10;

/// Simple arithmetic traits of a candidate position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionTraits {
    pub even: bool,
    pub divisible_by_3: bool,
    pub divisible_by_5: bool,
    /// Within 5 of `√n`.
    pub near_sqrt: bool,
    pub power_of_2: bool,
    /// More than half of the bits are set.
    pub high_bit_count: bool,
}

impl PositionTraits {
    pub fn of(position: u64, n: u64) -> Self {
        let bits = u64::BITS - position.leading_zeros();
        Self {
            even: position % 2 == 0,
            divisible_by_3: position % 3 == 0,
            divisible_by_5: position % 5 == 0,
            near_sqrt: position.abs_diff(isqrt(n)) <= 5,
            power_of_2: position.is_power_of_two(),
            high_bit_count: position.count_ones() > bits / 2,
        }
    }

    /// Named traits, in a fixed order.
    pub fn named(&self) -> [(&'static str, bool); 6] {
        [
            ("even", self.even),
            ("divisible_by_3", self.divisible_by_3),
            ("divisible_by_5", self.divisible_by_5),
            ("near_sqrt", self.near_sqrt),
            ("power_of_2", self.power_of_2),
            ("high_bit_count", self.high_bit_count),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub n: u64,
    pub position: u64,
    pub method: Algorithm,
    pub coherence: f64,
    pub traits: PositionTraits,
}

#[derive(Debug, Clone)]
pub struct FailureMemory {
    memory_size: usize,
    failures: VecDeque<Failure>,
    failed_positions: BTreeMap<u64, BTreeMap<Algorithm, f64>>,
    dead_ends: Vec<(u64, u64)>,
    spectral_nulls: Vec<u64>,
}

impl Default for FailureMemory {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_MEMORY)
    }
}

impl FailureMemory {
    pub fn new(memory_size: usize) -> Self {
        Self {
            memory_size,
            failures: VecDeque::new(),
            failed_positions: BTreeMap::new(),
            dead_ends: Vec::new(),
            spectral_nulls: Vec::new(),
        }
    }

    /// Remember that `method` found nothing at `position`.
    ///
    /// Only the latest `memory_size` failures are kept in full; the set of
    /// failed positions and the spectral nulls are never trimmed.
    pub fn record_failure(&mut self, n: u64, position: u64, method: Algorithm, coherence: f64) {
        self.failures.push_back(Failure {
            n,
            position,
            method,
            coherence,
            traits: PositionTraits::of(position, n),
        });
        while self.failures.len() > self.memory_size {
            self.failures.pop_front();
        }

        self.failed_positions.entry(position).or_default().insert(method, coherence);

        if coherence < NULL_COHERENCE && !self.spectral_nulls.contains(&position) {
            self.spectral_nulls.push(position);
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &Failure> {
        self.failures.iter()
    }

    pub fn is_failed(&self, position: u64) -> bool {
        self.failed_positions.contains_key(&position)
    }

    /// Coherence recorded per method at a failed position.
    pub fn failed_methods(&self, position: u64) -> Option<&BTreeMap<Algorithm, f64>> {
        self.failed_positions.get(&position)
    }

    pub fn spectral_nulls(&self) -> &[u64] {
        &self.spectral_nulls
    }

    pub fn dead_ends(&self) -> &[(u64, u64)] {
        &self.dead_ends
    }

    fn in_dead_end(&self, position: u64) -> bool {
        self.dead_ends.iter().any(|&(lo, hi)| (lo..=hi).contains(&position))
    }

    /// Regions where at least `threshold` failed positions lie within 10 of
    /// the region's first failure. Replaces the stored dead ends.
    pub fn identify_dead_ends(&mut self, threshold: usize) -> &[(u64, u64)] {
        let sorted: Vec<u64> = self.failed_positions.keys().copied().collect();
        let mut dead_ends = Vec::new();
        let mut i = 0;

        while i < sorted.len() {
            let start = sorted[i];
            let count = sorted[i..].iter().take_while(|&&x| x - start <= DEAD_END_SPAN).count();
            if count >= threshold.max(1) {
                dead_ends.push((start, sorted[i + count - 1]));
                i += count;
            } else {
                i += 1;
            }
        }

        log::debug!("{} dead ends among {} failed positions", dead_ends.len(), sorted.len());
        self.dead_ends = dead_ends;
        &self.dead_ends
    }

    /// 0.9 at a failed position, 0.8 inside a dead end, `0.6/(1+d)` within
    /// distance 2 of a failure, 0.1 otherwise.
    pub fn failure_probability(&self, position: u64) -> f64 {
        if self.is_failed(position) {
            return 0.9;
        }
        if self.in_dead_end(position) {
            return 0.8;
        }
        match self.failed_positions.keys().map(|&x| x.abs_diff(position)).min() {
            Some(d) if d < 3 => 0.6 / (1 + d) as f64,
            _ => 0.1,
        }
    }
}

/// Failure rates per method (`method_<key>_fail_rate`) and per position
/// trait (`char_<trait>_fail_rate`), and `avg_failure_coherence`, over the
/// remembered failures. Empty when nothing has failed.
pub fn analyze_failure_patterns(memory: &FailureMemory) -> BTreeMap<String, f64> {
    let total = memory.failures.len();
    if total == 0 {
        return BTreeMap::new();
    }

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for failure in memory.failures() {
        *counts.entry(format!("method_{}_fail_rate", failure.method.key())).or_insert(0) += 1;
        for (name, _) in failure.traits.named().into_iter().filter(|&(_, set)| set) {
            *counts.entry(format!("char_{}_fail_rate", name)).or_insert(0) += 1;
        }
    }

    let mut patterns: BTreeMap<String, f64> = counts
        .into_iter()
        .map(|(key, count)| (key, count as f64 / total as f64))
        .collect();
    let average = memory.failures().map(|f| f.coherence).sum::<f64>() / total as f64;
    patterns.insert("avg_failure_coherence".to_string(), average);
    patterns
}

/// Failed positions with coherence below `threshold`, and their immediate
/// neighbours whose own coherence is also below it. Ascending.
pub fn detect_spectral_nulls(n: u64, memory: &FailureMemory, threshold: f64) -> Vec<u64> {
    let nulls: BTreeSet<u64> = memory
        .failures()
        .filter(|f| f.coherence < threshold)
        .map(|f| f.position)
        .collect();

    let mut expanded = nulls.clone();
    for &x in &nulls {
        for neighbour in [x.checked_sub(1), x.checked_add(1)].into_iter().flatten() {
            if neighbour >= 2 && position_coherence(n, neighbour) < threshold {
                expanded.insert(neighbour);
            }
        }
    }
    expanded.into_iter().collect()
}

fn trait_rate(patterns: &BTreeMap<String, f64>, name: &str) -> Option<f64> {
    patterns.get(&format!("char_{}_fail_rate", name)).copied()
}

/// Drop candidates likely to fail. When fewer than half survive, top up with
/// untried positions below `min(√n + 1, 100)` that avoid every parity or
/// small-divisor trait failing more than 60% of the time. Ascending.
pub fn adaptive_strategy(n: u64, memory: &FailureMemory, base_candidates: &[u64]) -> Vec<u64> {
    let root = isqrt(n);
    let mut adapted: BTreeSet<u64> = base_candidates
        .iter()
        .copied()
        .filter(|&x| memory.failure_probability(x) < 0.5)
        .collect();

    let kept = base_candidates.iter().filter(|&&x| memory.failure_probability(x) < 0.5).count();
    if kept < base_candidates.len() / 2 {
        let patterns = analyze_failure_patterns(memory);
        let failing = |name: &str| trait_rate(&patterns, name).is_some_and(|r| r > 0.6);
        let (avoid_even, avoid_3, avoid_5) = (failing("even"), failing("divisible_by_3"), failing("divisible_by_5"));

        let alternatives = (2..(root + 1).min(100))
            .filter(|&x| !(avoid_even && x % 2 == 0))
            .filter(|&x| !(avoid_3 && x % 3 == 0))
            .filter(|&x| !(avoid_5 && x % 5 == 0))
            .filter(|&x| !memory.is_failed(x))
            .take((base_candidates.len() / 4).max(5));
        adapted.extend(alternatives);
    }
    adapted.into_iter().collect()
}

/// Untried positions below `min(√n + 1, 200)` scored against the failure
/// profile: +2 outside dead ends, +1 per missing trait that fails more than
/// 60% of the time, +0.5 per present trait failing less than 40%. The twenty
/// best scoring above 2.
pub fn inverse_failure_search(n: u64, memory: &FailureMemory) -> Vec<u64> {
    let root = isqrt(n);
    let patterns = analyze_failure_patterns(memory);
    let mut scored: Vec<(u64, f64)> = Vec::new();

    for x in (2..(root + 1).min(200)).filter(|&x| !memory.is_failed(x)) {
        let mut score = 0.0;
        for (name, set) in PositionTraits::of(x, n).named() {
            let rate = trait_rate(&patterns, name).unwrap_or(0.5);
            if rate > 0.6 && !set {
                score += 1.0;
            } else if rate < 0.4 && set {
                score += 0.5;
            }
        }
        if !memory.in_dead_end(x) {
            score += 2.0;
        }
        if score > 2.0 {
            scored.push((x, score));
        }
    }

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.into_iter().take(20).map(|(x, _)| x).collect()
}

/// Distance to the nearest failure over `√n` (capped at 1) for every
/// position in `[2, √n]`, scaled by 0.1 inside dead ends.
pub fn failure_gradient(n: u64, memory: &FailureMemory) -> BTreeMap<u64, f64> {
    let root = isqrt(n);
    (2..=root)
        .map(|x| {
            let distance = memory
                .failed_positions
                .keys()
                .map(|&f| f.abs_diff(x))
                .min()
                .unwrap_or(root)
                .min(root);
            let mut value = distance as f64 / root as f64;
            if memory.in_dead_end(x) {
                value *= 0.1;
            }
            (x, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use factoring_core::Algorithm::{ObserverEffect as A4, PrimeOntology as A1, SpectralDuality as A3};

    fn memory_with(positions: &[u64], coherence: f64) -> FailureMemory {
        let mut memory = FailureMemory::default();
        for &x in positions {
            memory.record_failure(10_000, x, A1, coherence);
        }
        memory
    }

    #[test]
    fn test_position_traits() {
        let eight = PositionTraits::of(8, 100);
        assert!(eight.even && eight.near_sqrt && eight.power_of_2);
        assert!(!eight.divisible_by_3 && !eight.divisible_by_5 && !eight.high_bit_count);

        let seven = PositionTraits::of(7, 10_000);
        assert!(seven.high_bit_count, "0b111 has three of three bits set");
        assert!(!seven.even && !seven.near_sqrt && !seven.power_of_2);
        assert!(!PositionTraits::of(0, 100).power_of_2);
    }

    #[test]
    fn test_record_failure_bounds_and_nulls() {
        let mut memory = FailureMemory::new(3);
        for (x, c) in [(2u64, 0.05), (3, 0.5), (4, 0.01), (5, 0.3), (6, 0.2)] {
            memory.record_failure(10_000, x, A3, c);
        }
        memory.record_failure(10_000, 4, A4, 0.02);

        assert_eq!(memory.failures().count(), 3);
        assert!((2..=6).all(|x| memory.is_failed(x)));
        assert_eq!(memory.spectral_nulls(), &[2, 4]);
        assert_eq!(memory.failed_methods(4).map(|m| m.len()), Some(2));
    }

    #[test]
    fn test_dead_ends_and_probability() {
        let mut memory = memory_with(&[10, 11, 13, 14, 15, 50], 0.3);
        assert_eq!(memory.identify_dead_ends(5), &[(10, 15)]);

        assert_eq!(memory.failure_probability(11), 0.9);
        assert_eq!(memory.failure_probability(12), 0.8);
        assert!((memory.failure_probability(16) - 0.3).abs() < 1e-12);
        assert!((memory.failure_probability(52) - 0.2).abs() < 1e-12);
        assert_eq!(memory.failure_probability(80), 0.1);
        assert_eq!(FailureMemory::default().failure_probability(5), 0.1);
    }

    #[test]
    fn test_analyze_failure_patterns() {
        let mut memory = FailureMemory::default();
        memory.record_failure(10_000, 10, A3, 0.05);
        memory.record_failure(10_000, 12, A3, 0.3);
        memory.record_failure(10_000, 15, A4, 0.2);
        memory.record_failure(10_000, 20, A3, 0.45);

        let patterns = analyze_failure_patterns(&memory);
        let rate = |key: &str| patterns.get(key).copied().unwrap_or(-1.0);
        assert_eq!(rate("method_axiom3_fail_rate"), 0.75);
        assert_eq!(rate("method_axiom4_fail_rate"), 0.25);
        assert_eq!(rate("char_even_fail_rate"), 0.75);
        assert_eq!(rate("char_divisible_by_3_fail_rate"), 0.5);
        assert_eq!(rate("char_divisible_by_5_fail_rate"), 0.75);
        assert_eq!(rate("char_high_bit_count_fail_rate"), 0.25);
        assert!(!patterns.contains_key("char_near_sqrt_fail_rate"));
        assert!((rate("avg_failure_coherence") - 0.25).abs() < 1e-12);

        assert!(analyze_failure_patterns(&FailureMemory::default()).is_empty());
    }

    #[test]
    fn test_detect_spectral_nulls() {
        let memory = memory_with(&[30], 0.05);
        let nulls = detect_spectral_nulls(10_000, &memory, 0.1);
        assert!(nulls.contains(&30));
        assert!(nulls.iter().all(|&x| (29..=31).contains(&x)));
        assert!(detect_spectral_nulls(10_000, &memory, 0.0).is_empty());
    }

    #[test]
    fn test_adaptive_strategy() {
        let memory = memory_with(&[2, 4, 6, 8, 10], 0.2);
        // 9 is one away from a failure (0.3), 40 and 41 are clear.
        assert_eq!(adaptive_strategy(10_000, &memory, &[2, 4, 6, 9, 40, 41]), vec![9, 40, 41]);
        // Everything filtered: fall back to untried odd positions.
        assert_eq!(adaptive_strategy(10_000, &memory, &[2, 4, 6, 8]), vec![3, 5, 7, 9, 11]);
    }

    #[test]
    fn test_inverse_failure_search() {
        let memory = memory_with(&[2, 4, 6, 8, 10], 0.2);
        let positions = inverse_failure_search(10_000, &memory);
        assert_eq!(positions.len(), 20);
        // Odd multiples of 15 with dense bits collect every bonus.
        assert_eq!(&positions[..3], &[15, 45, 75]);
        assert!(positions.iter().all(|&x| !memory.is_failed(x)));
        assert!(!positions.contains(&16));
    }

    #[test]
    fn test_failure_gradient() {
        let memory = memory_with(&[50], 0.2);
        let gradient = failure_gradient(10_000, &memory);
        assert_eq!(gradient.len(), 99);
        assert_eq!(gradient[&50], 0.0);
        assert!((gradient[&2] - 0.48).abs() < 1e-12);
        assert!((gradient[&100] - 0.5).abs() < 1e-12);

        let empty = failure_gradient(10_000, &FailureMemory::default());
        assert!(empty.values().all(|&g| g == 1.0));
    }
}
