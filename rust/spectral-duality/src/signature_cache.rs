//! LRU acceleration layer over spectral vectors, coherence, interference and fold energy.

use crate::coherence::spectral_distance;
use crate::interference::{pattern_extrema, prime_fib_interference};
use crate::spectrum::spectral_vector;
use factoring_core::{isqrt, BoundedCache, CacheStats, SMALL_PRIMES};
use fibonacci_flow::fib;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_CACHE_SIZE: usize = 10_000;

/// Fold energies stored per `n` before the map is trimmed.
const FOLD_MAP_LIMIT: usize = 1_000;
/// Lowest-energy positions kept when a fold map is trimmed.
const FOLD_MAP_KEEP: usize = 500;

/// Interference pattern and its extrema for one `n`.
pub type InterferencePattern = (Vec<f64>, Vec<u64>);

/// Memoized spectral computations with one shared hit/miss counter.
#[derive(Debug, Clone)]
pub struct SpectralSignatureCache {
    cache_size: usize,
    spectral: BoundedCache<u64, Vec<f64>>,
    coherence: BoundedCache<(u64, u64, u64), f64>,
    interference: BoundedCache<u64, InterferencePattern>,
    fold_maps: BoundedCache<u64, HashMap<u64, f64>>,
    hits: u64,
    misses: u64,
}

impl Default for SpectralSignatureCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

/// Summary of one `n` drawn from a freshly sized cache.
#[derive(Debug, Clone, Serialize)]
pub struct SpectralAnalysis {
    pub n: u64,
    pub spectral_vector: Vec<f64>,
    pub sharp_folds: Vec<u64>,
    pub interference_extrema: Vec<u64>,
    /// Coherence of the divisors among the leading folds and extrema.
    pub coherence_samples: BTreeMap<u64, f64>,
    pub cache_stats: CacheStats,
}

impl SpectralSignatureCache {
    /// Cache holding at most `cache_size` entries per table, seeded with the
    /// spectra of small Fibonacci numbers, small primes and powers of two.
    pub fn new(cache_size: usize) -> Self {
        let mut cache = Self {
            cache_size,
            spectral: BoundedCache::lru(cache_size),
            coherence: BoundedCache::lru(cache_size),
            interference: BoundedCache::lru(cache_size),
            fold_maps: BoundedCache::lru(cache_size),
            hits: 0,
            misses: 0,
        };
        cache.precompute_priority_numbers();
        cache
    }

    /// Size by magnitude of `n` (5 000 below 10⁴, 10 000 below 10⁶, else
    /// 20 000) and cache the spectrum of `n` itself.
    pub fn create_optimized(n: u64) -> Self {
        let cache_size = match n {
            0..=9_999 => 5_000,
            10_000..=999_999 => 10_000,
            _ => 20_000,
        };
        let mut cache = Self::new(cache_size);
        cache.precompute_for(n);
        cache
    }

    pub fn cache_size(&self) -> usize {
        self.cache_size
    }

    fn precompute_priority_numbers(&mut self) {
        let fibs = (1..12).filter_map(|k| fib(k).ok()).map(|f| f as u64);
        let powers = (0..10).map(|i| 1u64 << i);
        for x in fibs.chain(SMALL_PRIMES).chain(powers) {
            if !self.spectral.contains(&x) {
                self.spectral.insert(x, spectral_vector(x));
            }
        }
    }

    pub fn spectral_vector(&mut self, n: u64) -> Vec<f64> {
        if let Some(v) = self.spectral.get(&n) {
            self.hits += 1;
            return v.clone();
        }
        self.misses += 1;
        let v = spectral_vector(n);
        self.spectral.insert(n, v.clone());
        v
    }

    /// Coherence through the cache; `(a, b)` order does not matter.
    pub fn coherence(&mut self, a: u64, b: u64, n: u64) -> f64 {
        let key = (a.min(b), a.max(b), n);
        if let Some(&c) = self.coherence.get(&key) {
            self.hits += 1;
            return c;
        }
        self.misses += 1;

        let (sa, sb, sn) = (self.spectral_vector(a), self.spectral_vector(b), self.spectral_vector(n));
        let c = (-spectral_distance(&[&sa, &sb], &sn)).exp();
        self.coherence.insert(key, c);
        c
    }

    /// `(prime_fib_interference(n), its 30 strongest extrema)`.
    pub fn interference_pattern(&mut self, n: u64) -> InterferencePattern {
        if let Some(entry) = self.interference.get(&n) {
            self.hits += 1;
            return entry.clone();
        }
        self.misses += 1;
        let pattern = prime_fib_interference(n);
        let extrema = pattern_extrema(&pattern, 30);
        self.interference.insert(n, (pattern.clone(), extrema.clone()));
        (pattern, extrema)
    }

    /// Fold energy through the per-`n` map; infinite outside `1..=n`.
    pub fn fold_energy(&mut self, n: u64, x: u64) -> f64 {
        if let Some(&e) = self.fold_maps.peek(&n).and_then(|m| m.get(&x)) {
            self.hits += 1;
            return e;
        }
        self.misses += 1;

        let energy = if x == 0 || x > n {
            f64::INFINITY
        } else {
            let (sx, sy, sn) = (self.spectral_vector(x), self.spectral_vector(n / x), self.spectral_vector(n));
            spectral_distance(&[&sx, &sy], &sn)
        };

        if !self.fold_maps.contains(&n) {
            self.fold_maps.insert(n, HashMap::new());
        }
        if let Some(map) = self.fold_maps.get_mut(&n) {
            map.insert(x, energy);
            if map.len() > FOLD_MAP_LIMIT {
                let mut kept: Vec<(u64, f64)> = map.drain().collect();
                kept.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
                kept.truncate(FOLD_MAP_KEEP);
                map.extend(kept);
                log::debug!("trimmed fold map for {} to {} positions", n, FOLD_MAP_KEEP);
            }
        }
        energy
    }

    /// Ten lowest finite fold energies for `n`, filling `2..min(√n + 1, 100)`
    /// first when fewer than ten positions are known.
    pub fn sharp_folds(&mut self, n: u64) -> Vec<u64> {
        let known = self.fold_maps.peek(&n).map_or(0, HashMap::len);
        if known < 10 {
            for x in 2..(isqrt(n) + 1).min(100) {
                self.fold_energy(n, x);
            }
        }

        let Some(map) = self.fold_maps.peek(&n) else {
            return Vec::new();
        };
        let mut energies: Vec<(u64, f64)> = map
            .iter()
            .filter(|(_, e)| e.is_finite())
            .map(|(&x, &e)| (x, e))
            .collect();
        energies.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        energies.into_iter().take(10).map(|(x, _)| x).collect()
    }

    pub fn precompute_for(&mut self, n: u64) {
        self.spectral_vector(n);
    }

    /// Coherence of each divisor candidate with its cofactor; non-divisors score zero.
    pub fn coherence_field(&mut self, n: u64, candidates: &[u64]) -> BTreeMap<u64, f64> {
        candidates
            .iter()
            .map(|&x| {
                let c = if x != 0 && n % x == 0 {
                    self.coherence(x, n / x, n)
                } else {
                    0.0
                };
                (x, c)
            })
            .collect()
    }

    /// Spectrum, sharp folds, interference extrema and divisor coherence samples of `n`.
    pub fn analyze(&mut self, n: u64) -> SpectralAnalysis {
        let spectral_vector = self.spectral_vector(n);
        let sharp_folds = self.sharp_folds(n);
        let (_, extrema) = self.interference_pattern(n);

        let mut coherence_samples = BTreeMap::new();
        for &x in sharp_folds.iter().take(5).chain(extrema.iter().take(5)) {
            if n % x == 0 {
                let c = self.coherence(x, n / x, n);
                coherence_samples.insert(x, c);
            }
        }

        SpectralAnalysis {
            n,
            spectral_vector,
            sharp_folds,
            interference_extrema: extrema.into_iter().take(10).collect(),
            coherence_samples,
            cache_stats: self.cache_stats(),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats::new(self.hits, self.misses)
            .with_entries("spectral", self.spectral.len())
            .with_entries("coherence", self.coherence.len())
            .with_entries("interference", self.interference.len())
            .with_entries("fold_maps", self.fold_maps.len())
    }

    pub fn clear(&mut self) {
        self.spectral.clear();
        self.coherence.clear();
        self.interference.clear();
        self.fold_maps.clear();
        self.hits = 0;
        self.misses = 0;
    }
}
