//! Multi-scale observation of the coherence field and wavefunction-style candidate collapse.

use factoring_core::isqrt;
use fibonacci_flow::{fib, fibonacci_numbers, GOLDEN_ANGLE, MAX_FIB_INDEX, PHI};
use spectral_duality::SpectralSignatureCache;
use std::collections::{BTreeMap, BTreeSet};

/// Anything that can measure coherence at a candidate position of `n`.
pub trait Observe {
    fn n(&self) -> u64;

    fn root(&self) -> u64;

    /// Coherence observed at `x`.
    fn observe(&mut self, x: u64) -> f64;

    /// Central difference of [`Observe::observe`] at `x`, falling back to
    /// `observe(x)` on a side that leaves `[2, root]`; zero outside that range.
    fn gradient(&mut self, x: u64, delta: u64) -> f64 {
        let root = self.root();
        if x < 2 || x > root || delta == 0 {
            return 0.0;
        }
        let plus = if x + delta <= root { self.observe(x + delta) } else { self.observe(x) };
        let minus = if x >= delta + 2 { self.observe(x - delta) } else { self.observe(x) };
        (plus - minus) / (2 * delta) as f64
    }
}

/// Micro, meso, macro and omega observation scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scales {
    pub micro: u64,
    pub meso: u64,
    pub macro_: u64,
    pub omega: u64,
}

impl Scales {
    /// `μ = 1`, `m = ⌊log_φ root⌋`, `M = ⌊root/φ⌋`, `Ω = F(⌊log₂ root⌋)`, each at least 1.
    pub fn for_root(root: u64) -> Self {
        let r = root as f64;
        let meso = ((r.ln() / PHI.ln()) as u64).max(1);
        let macro_ = ((r / PHI) as u64).max(1);
        let omega_index = (r.log2() as u64).clamp(1, MAX_FIB_INDEX as u64);
        let omega = fib(omega_index as i64)
            .map(|f| u64::try_from(f).unwrap_or(u64::MAX))
            .unwrap_or(1)
            .max(1);
        Self {
            micro: 1,
            meso,
            macro_,
            omega,
        }
    }

    pub fn as_array(&self) -> [u64; 4] {
        [self.micro, self.meso, self.macro_, self.omega]
    }
}

/// Observes coherence at four scales around a position.
#[derive(Debug, Clone)]
pub struct MultiScaleObserver {
    n: u64,
    root: u64,
    scales: Scales,
    spectral: SpectralSignatureCache,
}

impl MultiScaleObserver {
    pub fn new(n: u64) -> Self {
        let root = isqrt(n);
        Self {
            n,
            root,
            scales: Scales::for_root(root),
            spectral: SpectralSignatureCache::create_optimized(n),
        }
    }

    pub fn scales(&self) -> Scales {
        self.scales
    }

    pub fn spectral_cache(&self) -> &SpectralSignatureCache {
        &self.spectral
    }

    /// Mean coherence over `x − scale ..= x + scale` in steps of `max(1, scale/5)`.
    ///
    /// Divisors pair with their cofactor; other positions pair with themselves.
    pub fn coherence_at_scale(&mut self, x: u64, scale: u64) -> f64 {
        if x < 2 || x > self.root {
            return 0.0;
        }
        let window = (scale / 5).max(1) as usize;
        let (x, scale) = (x as i64, scale as i64);

        let mut sum = 0.0;
        let mut count = 0usize;
        for offset in (-scale..=scale).step_by(window) {
            let pos = x + offset;
            if pos < 2 || pos as u64 > self.root {
                continue;
            }
            let pos = pos as u64;
            let partner = if self.n % pos == 0 { self.n / pos } else { pos };
            sum += self.spectral.coherence(pos, partner, self.n);
            count += 1;
        }
        if count > 0 {
            sum / count as f64
        } else {
            0.0
        }
    }

    /// Observation at every position.
    pub fn coherence_field(&mut self, positions: &[u64]) -> BTreeMap<u64, f64> {
        positions.iter().map(|&x| (x, self.observe(x))).collect()
    }
}

impl Observe for MultiScaleObserver {
    fn n(&self) -> u64 {
        self.n
    }

    fn root(&self) -> u64 {
        self.root
    }

    /// Sum of scale coherences weighted by `1/(1 + ln scale)`.
    fn observe(&mut self, x: u64) -> f64 {
        self.scales
            .as_array()
            .into_iter()
            .map(|scale| {
                let weight = 1.0 / (1.0 + (scale.max(1) as f64).ln());
                weight * self.coherence_at_scale(x, scale)
            })
            .sum()
    }
}

/// Candidate positions in `[2, √n]`: hints, Fibonacci numbers and their φ
/// multiples, the top of the range, and golden-spiral samples. Ascending.
pub fn generate_superposition(n: u64, hints: &[u64]) -> Vec<u64> {
    let root = isqrt(n);
    let in_range = |x: u64| (2..=root).contains(&x);
    let mut positions: BTreeSet<u64> = hints.iter().copied().filter(|&h| in_range(h)).collect();

    for f in fibonacci_numbers().skip(1).take_while(|&f| f <= root as u128) {
        let f = f as u64;
        if f >= 2 {
            positions.insert(f);
            let golden = (f as f64 * PHI) as u64;
            if in_range(golden) {
                positions.insert(golden);
            }
        }
    }

    let neighbourhood = (root / 10).max(10);
    positions.extend((root.saturating_sub(neighbourhood).max(2))..=root);

    let mut angle = 0.0f64;
    for i in 1..(root / 5).min(50) {
        let radius = (root * i / 50) as f64;
        let x = ((root / 2) as f64 + radius * angle.cos()) as i64;
        if x >= 2 && in_range(x as u64) {
            positions.insert(x as u64);
        }
        angle += GOLDEN_ANGLE;
    }

    positions.into_iter().collect()
}

fn sort_by_weight(candidates: &mut [(u64, f64)]) {
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
}

/// Iterations `start..iterations` of the collapse, beginning from `weighted`.
///
/// `on_state` sees the surviving candidates after every iteration.
pub(crate) fn collapse_from<O: Observe + ?Sized>(
    observer: &mut O,
    initial_len: usize,
    mut weighted: Vec<(u64, f64)>,
    start: usize,
    iterations: usize,
    mut on_state: impl FnMut(usize, &[(u64, f64)]),
) -> Vec<(u64, f64)> {
    let root = observer.root();
    let delta = (root / 100).max(1);

    for iteration in start..iterations {
        let step = ((root as f64 * 0.02 / (iteration + 1) as f64) as u64).max(1);

        let mut moved: Vec<(u64, f64)> = weighted
            .iter()
            .map(|&(x, _)| {
                let gradient = observer.gradient(x, delta);
                let next = if gradient > 0.0 {
                    (x + step).min(root)
                } else if gradient < 0.0 {
                    x.saturating_sub(step).max(2)
                } else {
                    x
                };
                (next, observer.observe(next) * (1.0 + gradient.abs()))
            })
            .collect();
        sort_by_weight(&mut moved);
        moved.truncate((initial_len / 2).max(20));
        weighted = moved;

        if iteration + 1 < iterations {
            let mut explored = Vec::new();
            for &(x, _) in weighted.iter().take(10) {
                for probe in [x.checked_sub(step), x.checked_add(step)].into_iter().flatten() {
                    if (2..=root).contains(&probe) {
                        explored.push((probe, observer.observe(probe)));
                    }
                }
            }
            let mut seen = BTreeSet::new();
            let mut merged: Vec<(u64, f64)> = weighted
                .into_iter()
                .chain(explored)
                .filter(|&(x, _)| seen.insert(x))
                .collect();
            sort_by_weight(&mut merged);
            merged.truncate(initial_len);
            weighted = merged;
        }

        on_state(iteration, &weighted);
    }
    weighted
}

/// Refine `candidates` by `iterations` rounds of gradient moves, keeping the
/// heaviest positions. Returns `(position, weight)` heaviest first.
pub fn collapse_wavefunction<O: Observe + ?Sized>(
    observer: &mut O,
    candidates: &[u64],
    iterations: usize,
) -> Vec<(u64, f64)> {
    let weighted: Vec<(u64, f64)> = candidates.iter().map(|&x| (x, observer.observe(x))).collect();
    collapse_from(observer, candidates.len(), weighted, 0, iterations, |_, _| {})
}

/// Unit-step gradient at every position within `radius` of `center`.
pub fn coherence_gradient_field<O: Observe + ?Sized>(
    observer: &mut O,
    center: u64,
    radius: u64,
) -> BTreeMap<u64, f64> {
    let root = observer.root();
    let lo = center.saturating_sub(radius).max(2);
    let hi = center.saturating_add(radius).min(root);
    (lo..=hi).map(|x| (x, observer.gradient(x, 1))).collect()
}
