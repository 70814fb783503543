//! Spectral mirrors: positions reflected through the spectral signature of `n`.

use factoring_core::{isqrt, BoundedCache};
use fibonacci_flow::PHI;
use spectral_duality::{spectral_vector, CoherenceCache};
use std::collections::{BTreeMap, BTreeSet};

const MIRROR_CACHE_SIZE: usize = 10_000;

fn magnitude(spectrum: &[f64]) -> f64 {
    spectrum.iter().map(|s| s * s).sum::<f64>().sqrt()
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

/// Reflects candidate positions of `n` through spectral space.
#[derive(Debug, Clone)]
pub struct SpectralMirror {
    n: u64,
    root: u64,
    n_spectrum: Vec<f64>,
    spectra: CoherenceCache,
    mirrors: BoundedCache<u64, u64>,
}

impl SpectralMirror {
    pub fn new(n: u64) -> Self {
        Self {
            n,
            root: isqrt(n),
            n_spectrum: spectral_vector(n),
            spectra: CoherenceCache::new(MIRROR_CACHE_SIZE),
            mirrors: BoundedCache::lru(MIRROR_CACHE_SIZE),
        }
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn root(&self) -> u64 {
        self.root
    }

    pub fn n_spectrum(&self) -> &[f64] {
        &self.n_spectrum
    }

    /// Euclidean distance between `S(x)` and `S(y)` over their common length.
    pub fn spectral_distance(&mut self, x: u64, y: u64) -> f64 {
        let (sx, sy) = (self.spectra.spectral(x), self.spectra.spectral(y));
        euclidean(&sx, &sy)
    }

    /// Mirror of `x`, clamped to `[2, √n]`.
    ///
    /// A divisor maps to `n − d(x, n/x)`; any other position to
    /// `n / (1 + d(x, √n))`.
    pub fn find_mirror_point(&mut self, x: u64) -> u64 {
        if let Some(&mirror) = self.mirrors.get(&x) {
            return mirror;
        }
        let raw = if x == 0 || self.n % x != 0 {
            self.n as f64 / (1.0 + self.spectral_distance(x, self.root))
        } else {
            self.n as f64 - self.spectral_distance(x, self.n / x)
        };
        let mirror = (raw as u64).min(self.root).max(2);
        self.mirrors.insert(x, mirror);
        mirror
    }

    /// `n·|S(n)|/|S(x)|`, reduced modulo `√n` when it overshoots; the middle
    /// of the range for a zero spectrum.
    pub fn spectral_reflection(&mut self, x: u64) -> u64 {
        let mag_x = magnitude(&self.spectra.spectral(x));
        let mag_n = magnitude(&self.n_spectrum);

        let reflection = if mag_x > 0.0 {
            let r = (self.n as f64 * mag_n / mag_x) as u64;
            if r > self.root && self.root > 0 {
                (r % self.root).max(2)
            } else {
                r
            }
        } else {
            self.root / 2
        };
        reflection.min(self.root).max(2)
    }

    /// Alternate mirror points and reflections from `x` for up to `depth`
    /// levels, stopping at the first repeat. Starts with `x`.
    pub fn recursive_mirror(&mut self, x: u64, depth: usize) -> Vec<u64> {
        let mut mirrors = vec![x];
        let mut current = x;
        for level in 0..depth {
            current = if level % 2 == 0 {
                self.find_mirror_point(current)
            } else {
                self.spectral_reflection(current)
            };
            if mirrors.contains(&current) {
                break;
            }
            mirrors.push(current);
        }
        mirrors
    }
}

/// `(position, mirror)` for every position that does not mirror onto itself.
pub fn find_mirror_points(n: u64, positions: &[u64]) -> Vec<(u64, u64)> {
    let mut mirror = SpectralMirror::new(n);
    positions
        .iter()
        .map(|&x| (x, mirror.find_mirror_point(x)))
        .filter(|&(x, m)| x != m)
        .collect()
}

/// Up to ten sampled positions whose spectrum lies within 0.5 of `target`, closest first.
pub fn inverse_spectral_map(n: u64, target: &[f64]) -> Vec<u64> {
    let root = isqrt(n);
    let step = (root / 100).max(1) as usize;

    let mut candidates: Vec<(u64, f64)> = (2..=root)
        .step_by(step)
        .map(|x| (x, euclidean(&spectral_vector(x), target)))
        .filter(|&(_, d)| d < 0.5)
        .collect();
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
    candidates.into_iter().take(10).map(|(x, _)| x).collect()
}

/// [`SpectralMirror::recursive_mirror`] with depth `⌊log_φ n⌋` unless given.
pub fn recursive_mirror(n: u64, start: u64, max_depth: Option<usize>) -> Vec<u64> {
    let depth = max_depth.unwrap_or_else(|| ((n as f64).ln() / PHI.ln()) as usize);
    SpectralMirror::new(n).recursive_mirror(start, depth)
}

/// Mirror point of every `max(1, √n/resolution)`-th position.
pub fn create_mirror_field(n: u64, resolution: u64) -> BTreeMap<u64, u64> {
    let root = isqrt(n);
    let step = (root / resolution.max(1)).max(1) as usize;
    let mut mirror = SpectralMirror::new(n);
    (2..=root).step_by(step).map(|x| (x, mirror.find_mirror_point(x))).collect()
}

/// Positions whose double mirror lands within 2 of themselves, as
/// `(x, M(x), 1/(1 + |M(M(x)) − x|))`, strongest twenty.
pub fn detect_mirror_symmetries(n: u64) -> Vec<(u64, u64, f64)> {
    let root = isqrt(n);
    let step = (root / 100).max(1) as usize;
    let mut mirror = SpectralMirror::new(n);

    let mut symmetries = Vec::new();
    for x in (2..=root).step_by(step) {
        let m1 = mirror.find_mirror_point(x);
        let m2 = mirror.find_mirror_point(m1);
        let gap = m2.abs_diff(x);
        if gap <= 2 {
            symmetries.push((x, m1, 1.0 / (1 + gap) as f64));
        }
    }
    symmetries.sort_by(|a, b| b.2.total_cmp(&a.2));
    symmetries.truncate(20);
    symmetries
}

/// Base positions with their mirrors, reflections and a modulation by the
/// dominant component of `S(n)`. Ascending, without repeats.
pub fn spectral_modulated_search(n: u64, base_positions: &[u64]) -> Vec<u64> {
    let mut mirror = SpectralMirror::new(n);
    let root = mirror.root();

    let dominant = mirror
        .n_spectrum()
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &s)| match best {
            Some((_, b)) if b >= s => best,
            _ => Some((i, s)),
        });

    let mut modulated = BTreeSet::new();
    for &x in base_positions {
        modulated.insert(x);
        modulated.insert(mirror.find_mirror_point(x));
        modulated.insert(mirror.spectral_reflection(x));
        if let Some((i, s)) = dominant.filter(|&(i, _)| i > 0) {
            log::trace!("modulating {} by component {} ({:.3})", x, i, s);
            let m = (x as f64 * (1.0 + s)) as u64;
            if (2..=root).contains(&m) {
                modulated.insert(m);
            }
        }
    }
    modulated.into_iter().collect()
}
