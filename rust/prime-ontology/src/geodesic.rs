//! Hill-climbing walks through prime coordinate space.
//!
//! A walk moves toward whichever neighbouring position has the strongest
//! pull, mixing several proposal sources:
//! 1. **Multi-scale steps** of ±1, 2, 3, 5, 7, 11
//! 2. **Cascade primes** related to the current position
//! 3. **Index suggestions** within 30 of the current position
//! 4. **Momentum jumps** continuing a run of improvements
//!
//! When no proposal improves on the current pull, the walk tries to escape
//! through prime multiples and quotients before giving up.

use crate::cascade::PrimeCascade;
use crate::coordinate_index::PrimeCoordinateIndex;
use factoring_core::{is_prime, isqrt};

const SCALES: [u64; 6] = [1, 2, 3, 5, 7, 11];
const MAX_WALK: usize = 100;
const SUGGESTION_REACH: u64 = 30;

/// Geodesic navigation toward the prime factors of `n`.
#[derive(Debug, Clone)]
pub struct PrimeGeodesic {
    n: u64,
    root: u64,
    coord: Vec<u64>,
    index: PrimeCoordinateIndex,
    cascade: PrimeCascade,
}

impl PrimeGeodesic {
    /// Geodesic over an index sized by [`PrimeCoordinateIndex::create_optimized`].
    pub fn new(n: u64) -> Self {
        Self::with_index(n, PrimeCoordinateIndex::create_optimized(n))
    }

    /// Geodesic reusing an existing index (and its cached paths).
    pub fn with_index(n: u64, mut index: PrimeCoordinateIndex) -> Self {
        let coord = index.coordinates(n);
        Self {
            n,
            root: isqrt(n),
            coord,
            index,
            cascade: PrimeCascade::new(n),
        }
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    /// Prime coordinates of `n`.
    pub fn coord(&self) -> &[u64] {
        &self.coord
    }

    pub fn index(&self) -> &PrimeCoordinateIndex {
        &self.index
    }

    /// Hand the index back so its caches can serve another walk.
    pub fn into_index(self) -> PrimeCoordinateIndex {
        self.index
    }

    /// Pull of position `x` toward the factors of `n`.
    pub fn pull(&mut self, x: u64) -> f64 {
        self.index.pull(x, self.n)
    }

    fn in_range(&self, x: u64) -> bool {
        (2..=self.root).contains(&x)
    }

    fn is_prime_factor(&self, x: u64) -> bool {
        x != 0 && self.n % x == 0 && is_prime(x)
    }

    fn offset(&self, cur: u64, delta: i64) -> Option<u64> {
        let cand = cur.checked_add_signed(delta)?;
        self.in_range(cand).then_some(cand)
    }

    fn cached_walk(&mut self, start: u64) -> Option<Vec<u64>> {
        let targets: Vec<u64> = self
            .index
            .primes()
            .iter()
            .copied()
            .filter(|&p| p <= self.root)
            .collect();
        for target in targets {
            if let Some(path) = self.index.geodesic_path(start, target, self.n) {
                if path.iter().any(|&pos| self.is_prime_factor(pos)) {
                    return Some(path);
                }
            }
        }
        None
    }

    /// Walk from `start` for at most `min(steps, 100)` moves.
    ///
    /// Returns the visited positions, beginning with `start`. A walk that
    /// reaches a prime factor stops there and is stored in the index.
    pub fn walk(&mut self, start: u64, steps: usize) -> Vec<u64> {
        if let Some(path) = self.cached_walk(start) {
            log::trace!("geodesic from {} served from cache", start);
            return path;
        }

        let mut suggestions = self.index.suggest_exploration_points(self.n, start);
        let mut path = vec![start];
        let mut cur = start;
        let mut momentum: i64 = 0;
        let mut last_direction: i64 = 0;

        for step in 0..steps.min(MAX_WALK) {
            let mut best = cur;
            let mut best_pull = self.pull(cur);
            let mut candidates = Vec::new();

            for scale in SCALES {
                for direction in [-1i64, 1] {
                    candidates.extend(self.offset(cur, direction * scale as i64));
                }
            }

            if is_prime(cur) {
                let related = self.cascade.cascade(cur);
                candidates.extend(related.into_iter().filter(|&p| self.in_range(p)));
            }

            candidates.extend(
                suggestions
                    .iter()
                    .copied()
                    .filter(|&s| s.abs_diff(cur) <= SUGGESTION_REACH),
            );

            if momentum > 0 && last_direction != 0 {
                let jump = last_direction * (momentum * 2).min(20);
                candidates.extend(self.offset(cur, jump));
            }

            let mut unique = candidates.clone();
            unique.sort_unstable();
            unique.dedup();
            for &cand in &unique {
                let pull = self.pull(cand);
                if pull > best_pull {
                    best = cand;
                    best_pull = pull;
                }
            }

            if best != cur {
                let direction = if best > cur { 1 } else { -1 };
                momentum = if direction == last_direction { momentum + 1 } else { 1 };
                last_direction = direction;
            } else {
                if (step as i64) < steps as i64 - 10 {
                    let escape_primes: Vec<u64> = self.index.primes().iter().take(10).copied().collect();
                    for p in escape_primes {
                        if let Some(up) = cur.checked_mul(p) {
                            if up <= self.root {
                                candidates.push(up);
                            }
                        }
                        if cur % p == 0 && cur / p >= 2 {
                            candidates.push(cur / p);
                        }
                    }

                    for cand in candidates {
                        if !self.in_range(cand) {
                            continue;
                        }
                        if self.pull(cand) >= best_pull * 0.8 {
                            best = cand;
                            momentum = 0;
                            break;
                        }
                    }
                }

                if best == cur {
                    log::trace!("geodesic stuck at {} after {} steps", cur, step);
                    break;
                }
            }

            cur = best;
            path.push(cur);

            if self.is_prime_factor(cur) {
                self.index.store_geodesic_path(start, cur, self.n, path.clone());
                break;
            }

            if step % 10 == 0 {
                suggestions = self.index.suggest_exploration_points(self.n, cur);
            }
        }

        path
    }
}
