//! Memoized Fibonacci numbers, vortex point sets, wave values and spiral paths.

use crate::sequence::{fib_u128, fib_wave, GOLDEN_ANGLE, MAX_FIB_INDEX, PHI};
use crate::FlowError;
use factoring_core::{BoundedCache, CacheStats};
use std::collections::BTreeSet;

const VORTEX_CAPACITY: usize = 10_000;
const WAVE_CAPACITY: usize = 100_000;
const SPIRAL_CAPACITY: usize = 1_000;

type SpiralKey = (u64, u64, usize);

/// Caches golden-ratio computations shared by vortex generation and scoring.
#[derive(Debug, Clone)]
pub struct FibonacciResonanceMap {
    max_index: u32,
    fib_cache: BoundedCache<u32, u128>,
    vortex_map: BoundedCache<(u64, u64), BTreeSet<u64>>,
    wave_table: BoundedCache<u64, f64>,
    spiral_paths: BoundedCache<SpiralKey, Vec<(f64, f64)>>,
    hits: u64,
    misses: u64,
}

impl Default for FibonacciResonanceMap {
    fn default() -> Self {
        Self::new(MAX_FIB_INDEX)
    }
}

impl FibonacciResonanceMap {
    /// Map precomputing at most `max_index` Fibonacci numbers.
    pub fn new(max_index: u32) -> Self {
        Self {
            max_index: max_index.min(MAX_FIB_INDEX),
            fib_cache: BoundedCache::fifo(MAX_FIB_INDEX as usize + 1),
            vortex_map: BoundedCache::fifo(VORTEX_CAPACITY),
            wave_table: BoundedCache::fifo(WAVE_CAPACITY),
            spiral_paths: BoundedCache::fifo(SPIRAL_CAPACITY),
            hits: 0,
            misses: 0,
        }
    }

    /// Map sized for `n`: full precompute below 10 000, selective below
    /// 1 000 000, lazy beyond.
    pub fn create_optimized(n: u64) -> Self {
        let above_n = (0..=MAX_FIB_INDEX)
            .find(|&k| fib_u128(k) >= n as u128)
            .unwrap_or(MAX_FIB_INDEX);
        let mut map = Self::new(above_n + 10);

        if n < 10_000 {
            map.precompute_common_values();
        } else if n < 1_000_000 {
            for k in 0..map.max_index.min(50) {
                map.cached_fib(k);
            }
            for k in 0..20 {
                map.wave_value(k as f64);
            }
        }
        map
    }

    pub fn max_index(&self) -> u32 {
        self.max_index
    }

    fn cached_fib(&mut self, k: u32) -> u128 {
        if let Some(&f) = self.fib_cache.peek(&k) {
            self.hits += 1;
            return f;
        }
        self.misses += 1;
        let f = fib_u128(k);
        self.fib_cache.insert(k, f);
        f
    }

    /// F(k) through the cache.
    pub fn fibonacci(&mut self, k: u32) -> Result<u128, FlowError> {
        if k > MAX_FIB_INDEX {
            return Err(FlowError::IndexTooLarge(k as i64));
        }
        Ok(self.cached_fib(k))
    }

    /// Points at Fibonacci, φ-scaled and φ⁻¹-scaled offsets from `center`,
    /// restricted to `[0, 2·center]`.
    pub fn vortex_points(&mut self, center: u64, radius: u64) -> BTreeSet<u64> {
        if let Some(points) = self.vortex_map.peek(&(center, radius)) {
            self.hits += 1;
            return points.clone();
        }
        self.misses += 1;

        let center_i = center as i128;
        let mut offsets = Vec::new();
        // F(93) exceeds every u64 radius, so the walk stays within range.
        for k in 1..=MAX_FIB_INDEX {
            let f = self.cached_fib(k);
            if f > radius as u128 {
                break;
            }
            offsets.push(f as i128);

            let phi_scaled = (f as f64 * PHI) as i128;
            if phi_scaled <= radius as i128 {
                offsets.push(phi_scaled);
            }
            let inv_scaled = (f as f64 / PHI) as i128;
            if inv_scaled > 0 {
                offsets.push(inv_scaled);
            }
        }

        let upper = 2 * center_i;
        let points: BTreeSet<u64> = offsets
            .into_iter()
            .flat_map(|o| [center_i + o, center_i - o])
            .filter(|&p| (0..=upper).contains(&p))
            .map(|p| p as u64)
            .collect();

        self.vortex_map.insert_if_room((center, radius), points.clone());
        points
    }

    /// `fib_wave(x)` through the cache, keyed by the exact bits of `x`.
    pub fn wave_value(&mut self, x: f64) -> f64 {
        let key = x.to_bits();
        if let Some(&v) = self.wave_table.peek(&key) {
            self.hits += 1;
            return v;
        }
        self.misses += 1;
        let v = fib_wave(x);
        self.wave_table.insert_if_room(key, v);
        v
    }

    /// `steps` points of a golden spiral around `(center, center)` growing to `max_radius`.
    pub fn spiral_path(&mut self, center: u64, max_radius: f64, steps: usize) -> Vec<(f64, f64)> {
        let key = (center, max_radius.to_bits(), steps);
        if let Some(path) = self.spiral_paths.peek(&key) {
            self.hits += 1;
            return path.clone();
        }
        self.misses += 1;

        let c = center as f64;
        let path: Vec<(f64, f64)> = (0..steps)
            .map(|k| {
                let angle = k as f64 * GOLDEN_ANGLE;
                let r = max_radius * (k as f64 / steps as f64);
                (c + r * angle.cos(), c + r * angle.sin())
            })
            .collect();

        self.spiral_paths.insert_if_room(key, path.clone());
        path
    }

    /// Fill the caches with small Fibonacci numbers and common wave positions.
    pub fn precompute_common_values(&mut self) {
        for k in 0..self.max_index.min(100) {
            self.cached_fib(k);
        }
        for k in 0..50 {
            self.wave_value(k as f64);
        }
        for k in 0..14 {
            let f = self.cached_fib(k);
            if f < 100 {
                self.wave_value(f as f64);
            }
        }
        for k in 1..20 {
            self.wave_value(k as f64 * PHI);
            self.wave_value(k as f64 / PHI);
        }
        log::debug!(
            "resonance map precomputed {} Fibonacci numbers and {} wave values",
            self.fib_cache.len(),
            self.wave_table.len()
        );
    }

    /// `(k, F(k), |n − F(k)|)` for the Fibonacci number closest to `n`.
    pub fn find_nearest_fibonacci(&mut self, n: u64) -> (u32, u128, u128) {
        let n = n as u128;
        let mut k = 0;
        loop {
            let f = self.cached_fib(k);
            if f >= n {
                if k > 0 {
                    let prev = self.cached_fib(k - 1);
                    if n - prev < f - n {
                        return (k - 1, prev, n - prev);
                    }
                }
                return (k, f, f - n);
            }
            k += 1;
        }
    }

    /// Fibonacci numbers in `lo..=hi`, ascending.
    pub fn fibonacci_range(&mut self, lo: u64, hi: u64) -> Vec<u64> {
        let mut fibs = Vec::new();
        for k in 0..=MAX_FIB_INDEX {
            let f = self.cached_fib(k);
            if f > hi as u128 {
                break;
            }
            if f >= lo as u128 {
                fibs.push(f as u64);
            }
        }
        // F(1) = F(2) = 1 would otherwise repeat.
        fibs.dedup();
        fibs
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats::new(self.hits, self.misses)
            .with_entries("fibonacci", self.fib_cache.len())
            .with_entries("vortices", self.vortex_map.len())
            .with_entries("waves", self.wave_table.len())
            .with_entries("spirals", self.spiral_paths.len())
    }
}
