//! Cached prime coordinates, pull values and successful geodesic paths.
//!
//! A number's prime coordinates are its residues `[n mod p]` over a small
//! fixed prime basis. Two numbers that share zero coordinates share prime
//! factors, which is what the pull field rewards.

use factoring_core::{isqrt, primes_up_to, BoundedCache, CacheStats};

/// Default upper bound on cached coordinates and pull values.
pub const DEFAULT_LIMIT: u64 = 100_000;

/// Default bound for the coordinate prime basis (15 primes).
pub const DEFAULT_PRIME_LIMIT: u64 = 50;

type PathKey = (u64, u64, u64);

/// Accelerates prime-space navigation through precomputation and caching.
#[derive(Debug, Clone)]
pub struct PrimeCoordinateIndex {
    limit: u64,
    primes: Vec<u64>,
    coordinates: BoundedCache<u64, Vec<u64>>,
    pull_field: BoundedCache<(u64, u64), f64>,
    geodesic_paths: BoundedCache<PathKey, Vec<u64>>,
    hits: u64,
    misses: u64,
}

impl Default for PrimeCoordinateIndex {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT, DEFAULT_PRIME_LIMIT)
    }
}

impl PrimeCoordinateIndex {
    /// Index caching coordinates of numbers `<= limit`, over primes `<= prime_limit`.
    pub fn new(limit: u64, prime_limit: u64) -> Self {
        let capacity = usize::try_from(limit).unwrap_or(usize::MAX);
        Self {
            limit,
            primes: primes_up_to(prime_limit),
            // Keys are bounded by `limit`, so this never evicts.
            coordinates: BoundedCache::fifo(capacity.saturating_add(1)),
            pull_field: BoundedCache::fifo(capacity),
            geodesic_paths: BoundedCache::fifo(capacity / 10),
            hits: 0,
            misses: 0,
        }
    }

    /// Index sized for factoring `n`; small inputs get their common coordinates precomputed.
    pub fn create_optimized(n: u64) -> Self {
        let limit = n.clamp(10_000, DEFAULT_LIMIT);
        let mut index = Self::new(limit, DEFAULT_PRIME_LIMIT);
        if n < 10_000 {
            index.precompute_common_coordinates();
        }
        index
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// The coordinate prime basis.
    pub fn primes(&self) -> &[u64] {
        &self.primes
    }

    /// Prime coordinates `[n mod p]` of `n`.
    pub fn coordinates(&mut self, n: u64) -> Vec<u64> {
        if let Some(coords) = self.coordinates.peek(&n) {
            self.hits += 1;
            return coords.clone();
        }
        self.misses += 1;

        let coords: Vec<u64> = self.primes.iter().map(|&p| n % p).collect();
        if n <= self.limit {
            self.coordinates.insert(n, coords.clone());
        }
        coords
    }

    /// Gravitational pull of position `x` toward the factors of `n`.
    ///
    /// Each basis prime dividing both contributes `1/p`, each other shared
    /// residue `0.5/p`, and an exact divisor earns a flat `2.0` on top.
    pub fn pull(&mut self, x: u64, n: u64) -> f64 {
        if x == 0 {
            return 0.0;
        }
        if let Some(&pull) = self.pull_field.peek(&(x, n)) {
            self.hits += 1;
            return pull;
        }
        self.misses += 1;

        let coords_x = self.coordinates(x);
        let coords_n = self.coordinates(n);

        let mut pull = 0.0;
        for ((&p, &cx), &cn) in self.primes.iter().zip(&coords_x).zip(&coords_n) {
            if cx == 0 && cn == 0 {
                pull += 1.0 / p as f64;
            } else if cx == cn {
                pull += 0.5 / p as f64;
            }
        }
        if n % x == 0 {
            pull += 2.0;
        }

        self.pull_field.insert_if_room((x, n), pull);
        pull
    }

    /// A stored path from `start` to `end`, or the reverse of one from `end` to `start`.
    pub fn geodesic_path(&mut self, start: u64, end: u64, n: u64) -> Option<Vec<u64>> {
        if let Some(path) = self.geodesic_paths.peek(&(start, end, n)) {
            self.hits += 1;
            return Some(path.clone());
        }
        if let Some(path) = self.geodesic_paths.peek(&(end, start, n)) {
            self.hits += 1;
            return Some(path.iter().rev().copied().collect());
        }
        None
    }

    /// Remember a successful path while the path store has room.
    pub fn store_geodesic_path(&mut self, start: u64, end: u64, n: u64, path: Vec<u64>) {
        if self.geodesic_paths.insert_if_room((start, end, n), path) {
            log::trace!("stored geodesic {} -> {} for n = {}", start, end, n);
        }
    }

    /// Numbers in `lo..=hi` agreeing with `target` on at least 70% of the coordinates.
    pub fn find_coordinate_matches(&mut self, target: &[u64], lo: u64, hi: u64) -> Vec<u64> {
        let threshold = self.primes.len() as f64 * 0.7;
        let mut matches = Vec::new();
        for x in lo..=hi {
            let coords = self.coordinates(x);
            let agree = coords.iter().zip(target).filter(|(a, b)| a == b).count();
            if agree as f64 >= threshold {
                matches.push(x);
            }
        }
        matches
    }

    /// Fill the coordinate cache for small numbers, powers of two and the first primes.
    pub fn precompute_common_coordinates(&mut self) {
        for x in 2..1000.min(self.limit + 1) {
            self.coordinates(x);
        }

        let mut power = 2u64;
        while power <= self.limit.min(65_536) {
            self.coordinates(power);
            power *= 2;
        }

        let first: Vec<u64> = self.primes.iter().take(20).copied().collect();
        for p in first {
            if p <= self.limit {
                self.coordinates(p);
            }
        }
        log::debug!(
            "precomputed {} prime coordinates (limit {})",
            self.coordinates.len(),
            self.limit
        );
    }

    /// `(index, prime)` pairs whose coordinate of `n` is zero.
    pub fn zero_coordinates(&mut self, n: u64) -> Vec<(usize, u64)> {
        let coords = self.coordinates(n);
        coords
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == 0)
            .map(|(i, _)| (i, self.primes[i]))
            .collect()
    }

    /// Manhattan distance between two numbers in coordinate space.
    pub fn coordinate_distance(&mut self, x: u64, y: u64) -> u64 {
        let cx = self.coordinates(x);
        let cy = self.coordinates(y);
        cx.iter().zip(&cy).map(|(a, b)| a.abs_diff(*b)).sum()
    }

    /// Up to ten positions near `current` worth exploring next when factoring `n`.
    pub fn suggest_exploration_points(&mut self, n: u64, current: u64) -> Vec<u64> {
        let n_coords = self.coordinates(n);
        let root = isqrt(n);

        let log_radius = if n > 0 { ((n as f64).ln() * 10.0) as u64 } else { 0 };
        let radius = (root / 2).min(log_radius).max(10) as i128;
        let threshold = ((self.primes.len() as f64 * 0.2) as usize).max(1);
        let checked = self.primes.len().min(10);

        let mut suggestions = Vec::new();
        for delta in -radius..=radius {
            let candidate = current as i128 + delta;
            if candidate < 2 || candidate > root as i128 {
                continue;
            }
            let candidate = candidate as u64;
            let coords = self.coordinates(candidate);
            let alignments = (0..checked).filter(|&i| coords[i] == n_coords[i]).count();
            if alignments >= threshold {
                suggestions.push(candidate);
            }
        }

        if suggestions.is_empty() {
            for &p in self.primes.iter().take(10) {
                if n % p == 0 && p <= root {
                    suggestions.push(p);
                    if p * 2 <= root {
                        suggestions.push(p * 2);
                    }
                    if p * 3 <= root {
                        suggestions.push(p * 3);
                    }
                }
            }
        }

        // Paths that worked for numbers of similar magnitude, rescaled to this n.
        if n > 0 {
            let ln_n = (n as f64).ln();
            for (&(_, _, cached_n), path) in self.geodesic_paths.iter() {
                if cached_n == 0 || (ln_n - (cached_n as f64).ln()).abs() >= 1.0 {
                    continue;
                }
                let scale = (n as f64).sqrt() / (cached_n as f64).sqrt();
                for &pos in path {
                    let scaled = (pos as f64 * scale) as u64;
                    if (2..=root).contains(&scaled) && !suggestions.contains(&scaled) {
                        suggestions.push(scaled);
                    }
                }
            }
        }

        suggestions.sort_unstable();
        suggestions.dedup();
        suggestions.truncate(10);
        suggestions
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats::new(self.hits, self.misses)
            .with_entries("coordinates", self.coordinates.len())
            .with_entries("paths", self.geodesic_paths.len())
            .with_entries("pull_values", self.pull_field.len())
    }
}
