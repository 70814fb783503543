//! Memory of successful (prime, Fibonacci) resonances, rescaled to predict
//! factor positions for new numbers.

use factoring_core::isqrt;
use fibonacci_flow::PHI;
use std::collections::{BTreeMap, VecDeque};

pub const DEFAULT_MEMORY_SIZE: usize = 100;
const DECAY: f64 = 0.7;

/// A resonance that led to a factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Success {
    pub prime: u64,
    pub fibonacci: u64,
    pub n: u64,
    pub factor: u64,
}

#[derive(Debug, Clone)]
pub struct ResonanceMemory {
    memory_size: usize,
    graph: BTreeMap<(u64, u64), f64>,
    successes: VecDeque<Success>,
}

impl Default for ResonanceMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_SIZE)
    }
}

impl ResonanceMemory {
    pub fn new(memory_size: usize) -> Self {
        Self {
            memory_size,
            graph: BTreeMap::new(),
            successes: VecDeque::new(),
        }
    }

    /// Blend `strength` into the (p, f) pattern with an exponential moving
    /// average; remember the success when a factor above 1 is given.
    pub fn record(&mut self, p: u64, f: u64, n: u64, strength: f64, factor: Option<u64>) {
        let entry = self.graph.entry((p, f)).or_insert(0.0);
        *entry = DECAY * *entry + (1.0 - DECAY) * strength;

        if let Some(factor) = factor.filter(|&x| x > 1) {
            self.successes.push_back(Success {
                prime: p,
                fibonacci: f,
                n,
                factor,
            });
            self.truncate();
        }
    }

    fn truncate(&mut self) {
        while self.successes.len() > self.memory_size {
            self.successes.pop_front();
        }
    }

    pub fn successes(&self) -> impl Iterator<Item = &Success> {
        self.successes.iter()
    }

    /// Predicted positions in `[2, √n]` with weights, strongest first.
    ///
    /// Past factors are rescaled by `n / n_prev` (and by φ^±1), weighted by
    /// how far the scale is from 1. Graph patterns close to a past success
    /// contribute `p·f mod √n` at half their strength.
    pub fn predict(&self, n: u64, top_k: usize) -> Vec<(u64, f64)> {
        let root = isqrt(n);
        let in_range = |x: u64| (2..=root).contains(&x);
        let mut predictions: BTreeMap<u64, f64> = BTreeMap::new();
        let mut offer = |x: u64, weight: f64| {
            let w = predictions.entry(x).or_insert(0.0);
            *w = w.max(weight);
        };

        for success in self.successes.iter().filter(|s| s.n > 0) {
            let scale = n as f64 / success.n as f64;
            let base = success.factor as f64 * scale;
            for (position, weight, s) in [
                (base, 0.8, scale),
                (base * PHI, 0.6, scale * PHI),
                (base / PHI, 0.6, scale / PHI),
            ] {
                let x = position as u64;
                if in_range(x) {
                    offer(x, weight / (1.0 + s.ln().abs()));
                }
            }
        }

        if root > 0 {
            for (&(p2, f2), &strength) in &self.graph {
                let similar = self
                    .successes
                    .iter()
                    .any(|s| p2.abs_diff(s.prime) <= 2 && f2.abs_diff(s.fibonacci) <= 1);
                if !similar {
                    continue;
                }
                let x = match ((p2 as u128 * f2 as u128) % root as u128) as u64 {
                    0 => p2,
                    x => x,
                };
                if in_range(x) {
                    offer(x, strength * 0.5);
                }
            }
        }

        let mut ranked: Vec<(u64, f64)> = predictions.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(top_k);
        ranked
    }

    pub fn pattern_strength(&self, p: u64, f: u64) -> f64 {
        self.graph.get(&(p, f)).copied().unwrap_or(0.0)
    }

    /// Other patterns within `tolerance` of (p, f) in both components, strongest first.
    pub fn find_similar_patterns(&self, p: u64, f: u64, tolerance: u64) -> Vec<((u64, u64), f64)> {
        let mut similar: Vec<((u64, u64), f64)> = self
            .graph
            .iter()
            .filter(|(&(p2, f2), _)| {
                (p2, f2) != (p, f) && p2.abs_diff(p) <= tolerance && f2.abs_diff(f) <= tolerance
            })
            .map(|(&key, &strength)| (key, strength))
            .collect();
        similar.sort_by(|a, b| b.1.total_cmp(&a.1));
        similar
    }

    /// Fraction of patterns with strength above 0.5.
    pub fn success_rate(&self) -> f64 {
        if self.graph.is_empty() {
            return 0.0;
        }
        let strong = self.graph.values().filter(|&&s| s > 0.5).count();
        strong as f64 / self.graph.len() as f64
    }

    /// Take the stronger of each shared pattern and append the other's successes.
    pub fn merge(&mut self, other: &ResonanceMemory) {
        for (&key, &strength) in &other.graph {
            let entry = self.graph.entry(key).or_insert(0.0);
            *entry = entry.max(strength);
        }
        self.successes.extend(other.successes.iter().copied());
        self.truncate();
    }

    pub fn clear(&mut self) {
        self.graph.clear();
        self.successes.clear();
    }

    pub fn pattern_count(&self) -> usize {
        self.graph.len()
    }
}

/// Predicted positions, with a Gaussian spread of radius `max(1, 0.02·√n)`
/// around predictions weighted above 0.5.
pub fn analyze_resonance_landscape(n: u64, memory: &ResonanceMemory, resolution: usize) -> BTreeMap<u64, f64> {
    let root = isqrt(n);
    let mut landscape = BTreeMap::new();

    for (x, weight) in memory.predict(n, resolution) {
        landscape.insert(x, weight);
        if weight <= 0.5 {
            continue;
        }
        let spread = ((root as f64 * 0.02) as i64).max(1);
        for offset in -spread..=spread {
            let neighbour = x as i64 + offset;
            if neighbour < 2 || neighbour as u64 > root {
                continue;
            }
            let falloff = (-((offset * offset) as f64) / (2.0 * (spread * spread) as f64)).exp();
            landscape.entry(neighbour as u64).or_insert(weight * falloff);
        }
    }
    landscape
}

/// Try the predicted positions, then the neighbourhoods of strong top-5 predictions.
pub fn resonance_guided_search(n: u64, memory: &ResonanceMemory, max_attempts: usize) -> Option<u64> {
    let predictions = memory.predict(n, max_attempts);
    if let Some(&(x, _)) = predictions.iter().find(|&&(x, _)| x > 1 && n % x == 0) {
        return Some(x);
    }

    let root = isqrt(n);
    for &(x, weight) in predictions.iter().take(5).filter(|p| p.1 > 0.5) {
        let radius = ((weight * 10.0) as u64).max(1);
        let lo = x.saturating_sub(radius).max(2);
        let hi = (x + radius).min(root);
        if let Some(found) = (lo..=hi).find(|&pos| n % pos == 0) {
            return Some(found);
        }
    }
    None
}
