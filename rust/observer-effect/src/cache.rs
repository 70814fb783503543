//! Memoized observations, gradients, collapse states and navigation paths.
//!
//! [`ObserverCache`] is keyed by `n`, so one cache can serve several numbers.
//! [`CachedObserver`] routes every observation and gradient of an inner
//! observer through it.

use crate::navigation::navigate;
use crate::observer::{collapse_from, MultiScaleObserver, Observe};
use factoring_core::{isqrt, primes_up_to, BoundedCache, CacheStats};
use fibonacci_flow::{fibonacci_numbers, PHI};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const DEFAULT_OBSERVER_CACHE_SIZE: usize = 10_000;
const MIN_CACHE_SIZE: usize = 1000;

/// Collapse state after one iteration: `(position, weight)`, heaviest first.
pub type QuantumState = Vec<(u64, f64)>;

#[derive(Debug, Clone)]
pub struct ObserverCache {
    cache_size: usize,
    observations: BoundedCache<(u64, u64), f64>,
    gradients: BoundedCache<(u64, u64, u64), f64>,
    states: HashMap<(u64, usize), QuantumState>,
    paths: BoundedCache<(u64, u64, u64), Vec<u64>>,
    precomputed_fibonacci: BTreeSet<u64>,
    precomputed_primes: BTreeSet<u64>,
    precomputed_sqrt: BTreeSet<u64>,
    precomputed_gradients: BTreeSet<(u64, Vec<u64>)>,
}

impl Default for ObserverCache {
    fn default() -> Self {
        Self::new(DEFAULT_OBSERVER_CACHE_SIZE)
    }
}

fn in_range(x: u64, root: u64) -> bool {
    (2..=root).contains(&x)
}

impl ObserverCache {
    pub fn new(cache_size: usize) -> Self {
        Self {
            cache_size,
            observations: BoundedCache::lru(cache_size),
            gradients: BoundedCache::lru(cache_size),
            states: HashMap::new(),
            paths: BoundedCache::lru(cache_size),
            precomputed_fibonacci: BTreeSet::new(),
            precomputed_primes: BTreeSet::new(),
            precomputed_sqrt: BTreeSet::new(),
            precomputed_gradients: BTreeSet::new(),
        }
    }

    /// Size the cache from `√n`: 10·r below 1e3, 5·r below 1e5, 2·r below
    /// 1e7 and r beyond, capped at 2k/5k/10k/20k and never below 1000.
    pub fn create_optimized(n: u64) -> Self {
        let root = isqrt(n) as usize;
        let size = match n {
            0..=999 => (root * 10).min(2000),
            1000..=99_999 => (root * 5).min(5000),
            100_000..=9_999_999 => (root * 2).min(10_000),
            _ => root.min(20_000),
        };
        Self::new(size.max(MIN_CACHE_SIZE))
    }

    pub fn cache_size(&self) -> usize {
        self.cache_size
    }

    /// Cached `observer.observe(x)`.
    pub fn observation<O: Observe + ?Sized>(&mut self, observer: &mut O, x: u64) -> f64 {
        let key = (observer.n(), x);
        if let Some(&value) = self.observations.get(&key) {
            return value;
        }
        let value = observer.observe(x);
        self.observations.insert(key, value);
        value
    }

    /// Cached central difference at `x`, with observations also served from the cache.
    pub fn gradient<O: Observe + ?Sized>(&mut self, observer: &mut O, x: u64, delta: u64) -> f64 {
        let key = (observer.n(), x, delta);
        if let Some(&value) = self.gradients.get(&key) {
            return value;
        }

        let root = observer.root();
        let value = if !in_range(x, root) || delta == 0 {
            0.0
        } else {
            let plus = self.observation(observer, if x + delta <= root { x + delta } else { x });
            let minus = self.observation(observer, if x >= delta + 2 { x - delta } else { x });
            (plus - minus) / (2 * delta) as f64
        };
        self.gradients.insert(key, value);
        value
    }

    pub fn store_state(&mut self, n: u64, iteration: usize, state: &[(u64, f64)]) {
        self.states.insert((n, iteration), state.to_vec());
    }

    pub fn state(&self, n: u64, iteration: usize) -> Option<&[(u64, f64)]> {
        self.states.get(&(n, iteration)).map(Vec::as_slice)
    }

    pub fn store_path(&mut self, n: u64, start: u64, end: u64, path: &[u64]) {
        self.paths.insert((n, start, end), path.to_vec());
    }

    pub fn path(&mut self, n: u64, start: u64, end: u64) -> Option<Vec<u64>> {
        self.paths.get(&(n, start, end)).cloned()
    }

    /// Observe Fibonacci positions in `[2, √n]` and their φ-scaled neighbours, once per `n`.
    pub fn precompute_fibonacci_positions<O: Observe + ?Sized>(&mut self, observer: &mut O) {
        let (n, root) = (observer.n(), observer.root());
        if !self.precomputed_fibonacci.insert(n) {
            return;
        }
        let fibs: Vec<u64> = fibonacci_numbers()
            .take_while(|&f| f <= root as u128)
            .map(|f| f as u64)
            .filter(|&f| f >= 2)
            .collect();
        for f in fibs {
            self.observation(observer, f);
            for scaled in [(f as f64 * PHI) as u64, (f as f64 / PHI) as u64] {
                if in_range(scaled, root) {
                    self.observation(observer, scaled);
                }
            }
        }
    }

    /// Observe primes up to `min(limit, √n)`, once per `n`.
    pub fn precompute_prime_positions<O: Observe + ?Sized>(&mut self, observer: &mut O, limit: u64) {
        let n = observer.n();
        if !self.precomputed_primes.insert(n) {
            return;
        }
        for p in primes_up_to(limit.min(observer.root())) {
            self.observation(observer, p);
        }
    }

    /// Observe the top `radius + 1` positions below `√n`, once per `n`.
    pub fn precompute_sqrt_neighborhood<O: Observe + ?Sized>(&mut self, observer: &mut O, radius: u64) {
        let (n, root) = (observer.n(), observer.root());
        if !self.precomputed_sqrt.insert(n) {
            return;
        }
        for x in root.saturating_sub(radius).max(2)..=root {
            self.observation(observer, x);
        }
    }

    /// Fibonacci positions, primes up to 100 and the 50 positions below `√n`.
    pub fn precompute_critical_positions<O: Observe + ?Sized>(&mut self, observer: &mut O) {
        self.precompute_fibonacci_positions(observer);
        self.precompute_prime_positions(observer, 100);
        self.precompute_sqrt_neighborhood(observer, 50);
    }

    /// Unit-step gradients at `positions`, once per `(n, position set)`.
    pub fn precompute_gradients<O: Observe + ?Sized>(&mut self, observer: &mut O, positions: &[u64]) {
        let mut key: Vec<u64> = positions.to_vec();
        key.sort_unstable();
        if !self.precomputed_gradients.insert((observer.n(), key)) {
            return;
        }
        for &x in positions {
            self.gradient(observer, x, 1);
        }
    }

    /// Observations at every position.
    pub fn batch_observe<O: Observe + ?Sized>(&mut self, observer: &mut O, positions: &[u64]) -> BTreeMap<u64, f64> {
        let sorted: BTreeSet<u64> = positions.iter().copied().collect();
        sorted.into_iter().map(|x| (x, self.observation(observer, x))).collect()
    }

    /// Small divisor pairs (for n below 10 000), golden and √2 fractions of
    /// the root, and gradients at Fibonacci numbers up to 100 and primes up to 50.
    pub fn warm_cache<O: Observe + ?Sized>(&mut self, observer: &mut O) {
        let (n, root) = (observer.n(), observer.root());

        if n < 10_000 {
            for d in (2..(root + 1).min(100)).filter(|d| n % d == 0) {
                self.observation(observer, d);
                self.observation(observer, n / d);
            }
        }

        for k in [0.5, 0.618, 1.0, 1.414, 1.618, 2.0] {
            let x = (root as f64 * k) as u64;
            if in_range(x, root) {
                self.observation(observer, x);
            }
        }

        let mut critical: Vec<u64> = fibonacci_numbers()
            .take_while(|&f| f <= root.min(100) as u128)
            .map(|f| f as u64)
            .filter(|&f| f >= 2)
            .collect();
        critical.extend(primes_up_to(root.min(50)));
        self.precompute_gradients(observer, &critical);
    }

    /// Numbers with at least one completed precompute pass.
    pub fn precomputed_numbers(&self) -> usize {
        self.precomputed_fibonacci
            .iter()
            .chain(&self.precomputed_primes)
            .chain(&self.precomputed_sqrt)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Combined hits and misses over the observation, gradient and path caches.
    pub fn cache_stats(&self) -> CacheStats {
        let hits = self.observations.hits() + self.gradients.hits() + self.paths.hits();
        let misses = self.observations.misses() + self.gradients.misses() + self.paths.misses();
        CacheStats::new(hits, misses)
            .with_entries("observations", self.observations.len())
            .with_entries("gradients", self.gradients.len())
            .with_entries("states", self.states.len())
            .with_entries("paths", self.paths.len())
    }

    pub fn observation_hits(&self) -> u64 {
        self.observations.hits()
    }

    pub fn gradient_hits(&self) -> u64 {
        self.gradients.hits()
    }

    pub fn clear(&mut self) {
        self.observations.clear();
        self.gradients.clear();
        self.states.clear();
        self.paths.clear();
        self.precomputed_fibonacci.clear();
        self.precomputed_primes.clear();
        self.precomputed_sqrt.clear();
        self.precomputed_gradients.clear();
    }
}

/// An observer whose observations and gradients go through an [`ObserverCache`].
#[derive(Debug, Clone)]
pub struct CachedObserver<O = MultiScaleObserver> {
    observer: O,
    cache: ObserverCache,
}

impl CachedObserver<MultiScaleObserver> {
    /// Multi-scale observer with an optimized cache, precomputed critical positions and a warm cache.
    pub fn new(n: u64) -> Self {
        let mut cached = Self::with_cache(MultiScaleObserver::new(n), ObserverCache::create_optimized(n));
        cached.cache.precompute_critical_positions(&mut cached.observer);
        cached.cache.warm_cache(&mut cached.observer);
        cached
    }
}

impl<O: Observe> CachedObserver<O> {
    pub fn with_cache(observer: O, cache: ObserverCache) -> Self {
        Self { observer, cache }
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn cache(&self) -> &ObserverCache {
        &self.cache
    }

    pub fn into_parts(self) -> (O, ObserverCache) {
        (self.observer, self.cache)
    }

    /// Wavefunction collapse that resumes from the latest cached state for
    /// this `n` and records every new state.
    pub fn collapse_wavefunction(&mut self, candidates: &[u64], iterations: usize) -> Vec<(u64, f64)> {
        let n = self.observer.n();
        let resumed = (0..iterations)
            .rev()
            .find_map(|i| self.cache.state(n, i).filter(|s| !s.is_empty()).map(|s| (i + 1, s.to_vec())));

        let (start, weighted) = match resumed {
            Some(resumed) => resumed,
            None => (0, candidates.iter().map(|&x| (x, self.observe(x))).collect()),
        };
        if start > 0 {
            log::debug!("resuming collapse for {} at iteration {}", n, start);
        }

        let mut states = Vec::new();
        let collapsed = collapse_from(self, candidates.len(), weighted, start, iterations, |i, state| {
            states.push((i, state.to_vec()))
        });
        for (i, state) in states {
            self.cache.store_state(n, i, &state);
        }
        collapsed
    }

    /// Navigation that first replays cached paths ending on a small divisor,
    /// and caches the path of every new success.
    pub fn navigate_to_factor(&mut self, start: u64, max_iterations: usize) -> Option<u64> {
        let (n, root) = (self.observer.n(), self.observer.root());
        let is_factor = |x: u64| x > 1 && n % x == 0;

        for end in (2..(root + 1).min(100)).filter(|&d| n % d == 0) {
            if let Some(path) = self.cache.path(n, start, end) {
                if let Some(found) = path.into_iter().find(|&x| is_factor(x)) {
                    return Some(found);
                }
            }
        }

        let (found, path) = navigate(self, start, max_iterations);
        if let Some(factor) = found {
            self.cache.store_path(n, start, factor, &path);
        }
        found
    }

    /// Cached observations at every position; precomputes critical
    /// positions first for more than ten positions.
    pub fn coherence_field(&mut self, positions: &[u64]) -> BTreeMap<u64, f64> {
        if positions.len() > 10 {
            self.cache.precompute_critical_positions(&mut self.observer);
        }
        positions.iter().map(|&x| (x, self.observe(x))).collect()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.cache_stats()
    }
}

impl<O: Observe> Observe for CachedObserver<O> {
    fn n(&self) -> u64 {
        self.observer.n()
    }

    fn root(&self) -> u64 {
        self.observer.root()
    }

    fn observe(&mut self, x: u64) -> f64 {
        self.cache.observation(&mut self.observer, x)
    }

    fn gradient(&mut self, x: u64, delta: u64) -> f64 {
        self.cache.gradient(&mut self.observer, x, delta)
    }
}
