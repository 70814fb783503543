//! Coherence applied to itself: a field of coherence values is repeatedly
//! re-weighted by the stability of its own neighbourhood until it settles.

use crate::position_coherence;
use factoring_core::{isqrt, primes_up_to};
use fibonacci_flow::{fib, fibonacci_numbers, PHI};
use std::collections::{BTreeMap, BTreeSet};

/// Coherence value per position.
pub type CoherenceField = BTreeMap<u64, f64>;

/// Two fields agree when they share keys and every value is within this.
const CONVERGENCE_TOLERANCE: f64 = 0.01;
const FIXED_POINT_TOLERANCE: f64 = 0.1;

fn log_phi_depth(n: u64) -> usize {
    ((n as f64).ln() / PHI.ln()) as usize
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

fn converged(a: &CoherenceField, b: &CoherenceField) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|((ka, va), (kb, vb))| ka == kb && (va - vb).abs() < CONVERGENCE_TOLERANCE)
}

/// Iterates a coherence field and keeps every level it passes through.
#[derive(Debug, Clone)]
pub struct RecursiveCoherence {
    n: u64,
    history: Vec<CoherenceField>,
}

impl RecursiveCoherence {
    pub fn new(n: u64) -> Self {
        Self { n, history: Vec::new() }
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    /// One level of self-application.
    ///
    /// Each value `c` becomes `0.7·c + 0.3·stability·resonance`, where the
    /// neighbours are the (up to) two positions on either side in key order,
    /// `stability = exp(−var/2)` and `resonance = 1 − |c − mean|`.
    /// Fields with fewer than two positions are returned unchanged.
    pub fn apply_coherence_to_field(&self, field: &CoherenceField) -> CoherenceField {
        if field.len() < 2 {
            return field.clone();
        }
        let entries: Vec<(u64, f64)> = field.iter().map(|(&x, &c)| (x, c)).collect();

        entries
            .iter()
            .enumerate()
            .map(|(i, &(x, c))| {
                let hi = (i + 3).min(entries.len());
                let neighbours: Vec<f64> = (i.saturating_sub(2)..hi)
                    .filter(|&j| j != i)
                    .map(|j| entries[j].1)
                    .collect();
                let stability = (-variance(&neighbours) * 0.5).exp();
                let resonance = 1.0 - (c - mean(&neighbours)).abs();
                (x, 0.7 * c + 0.3 * stability * resonance)
            })
            .collect()
    }

    /// Apply up to `depth` levels, stopping early once a level agrees with
    /// the previous one. The history holds the initial field and every level.
    pub fn iterate(&mut self, initial: CoherenceField, depth: usize) -> &[CoherenceField] {
        self.history = vec![initial];
        for level in 0..depth {
            let Some(current) = self.history.last() else {
                break;
            };
            let next = self.apply_coherence_to_field(current);
            let done = converged(current, &next);
            self.history.push(next);
            if done {
                log::trace!("field converged after {} levels", level + 1);
                break;
            }
        }
        &self.history
    }

    pub fn history(&self) -> &[CoherenceField] {
        &self.history
    }

    /// The last field of the most recent iteration.
    pub fn final_field(&self) -> Option<&CoherenceField> {
        self.history.last()
    }

    /// Positions that moved less than 0.1 between the first and last level.
    pub fn fixed_points(&self) -> Vec<u64> {
        let (Some(first), Some(last)) = (self.history.first(), self.history.last()) else {
            return Vec::new();
        };
        first
            .iter()
            .filter(|&(x, c)| last.get(x).is_some_and(|l| (l - c).abs() < FIXED_POINT_TOLERANCE))
            .map(|(&x, _)| x)
            .collect()
    }
}

/// Correlation between the coherence patterns around `x` and `y`, mapped to `[0, 1]`.
///
/// Without a field, one is built from position coherence over
/// `[max(2, x−5), min(√n, y+5)]`. Patterns are the values within 3 of each
/// position; the shorter is padded with its mean. Returns 0 when either
/// pattern is empty and 0.5 when either has no variance.
pub fn meta_coherence(n: u64, x: u64, y: u64, field: Option<&CoherenceField>) -> f64 {
    let built;
    let field = match field {
        Some(field) => field,
        None => {
            let root = isqrt(n);
            let lo = x.saturating_sub(5).max(2);
            let hi = root.min(y.saturating_add(5));
            built = (lo..=hi).map(|p| (p, position_coherence(n, p))).collect::<CoherenceField>();
            &built
        }
    };

    let pattern = |center: u64| -> Vec<f64> {
        field
            .range(center.saturating_sub(3)..=center.saturating_add(3))
            .map(|(_, &c)| c)
            .collect()
    };
    let (mut px, mut py) = (pattern(x), pattern(y));
    if px.is_empty() || py.is_empty() {
        return 0.0;
    }

    let len = px.len().max(py.len());
    let (mx, my) = (mean(&px), mean(&py));
    px.resize(len, mx);
    py.resize(len, my);

    let (vx, vy) = (variance(&px), variance(&py));
    if vx == 0.0 || vy == 0.0 {
        return 0.5;
    }
    let covariance = px.iter().zip(&py).map(|(a, b)| (a - mx) * (b - my)).sum::<f64>() / len as f64;
    let correlation = (covariance / (vx * vy).sqrt()).clamp(-1.0, 1.0);
    (correlation + 1.0) / 2.0
}

/// Positions whose coherence after recursive iteration reaches 70% of the
/// strongest. Depth is `min(max_iterations, ⌊log_φ n⌋)`.
pub fn find_coherence_attractors(n: u64, positions: &[u64], max_iterations: usize) -> Vec<u64> {
    let initial: CoherenceField = positions.iter().map(|&x| (x, position_coherence(n, x))).collect();
    let mut rc = RecursiveCoherence::new(n);
    rc.iterate(initial, max_iterations.min(log_phi_depth(n)));

    let Some(last) = rc.final_field() else {
        return Vec::new();
    };
    let max = last.values().copied().fold(f64::NEG_INFINITY, f64::max);
    last.iter()
        .filter(|&(_, &c)| c >= 0.7 * max)
        .map(|(&x, _)| x)
        .collect()
}

/// Walk from `start` cycling through `×φ`, `+F(level+2)` and `÷φ`, clamped
/// to `[2, √n]`, for `⌊log_φ n⌋` levels or until a position repeats.
pub fn golden_ratio_recursion(n: u64, start: u64) -> Vec<u64> {
    let root = isqrt(n);
    let mut sequence = vec![start];
    let mut current = start;

    for level in 0..log_phi_depth(n) {
        let next = match level % 3 {
            0 => (current as f64 * PHI) as u64,
            1 => {
                let step = fib(level as i64 + 2).map_or(u64::MAX, |f| u64::try_from(f).unwrap_or(u64::MAX));
                current.saturating_add(step)
            }
            _ => (current as f64 / PHI) as u64,
        };
        current = next.min(root).max(2);
        if sequence.contains(&current) {
            break;
        }
        sequence.push(current);
    }
    sequence
}

/// Coherence sampled at `base_size` evenly spaced positions and their
/// multiples by 2 and 4, each damped by `1/(1 + ln scale)`. The strongest
/// value per position is kept.
pub fn fractal_coherence_pattern(n: u64, base_size: u64) -> CoherenceField {
    let root = isqrt(n);
    let mut pattern = CoherenceField::new();
    let step = (root / base_size.max(1)).max(1) as usize;

    for scale in [1u64, 1, 2, 4] {
        let weight = 1.0 / (1.0 + (scale as f64).ln());
        for base in (2..=root).step_by(step).take(base_size as usize) {
            let x = base * scale;
            if x > root {
                continue;
            }
            let value = position_coherence(n, x) * weight;
            let entry = pattern.entry(x).or_insert(value);
            *entry = entry.max(value);
        }
    }
    pattern
}

/// Attractors among small primes, Fibonacci numbers and the root's neighbours.
pub fn recursive_fixed_point_search(n: u64) -> Vec<u64> {
    let root = isqrt(n);
    let mut candidates: BTreeSet<u64> = primes_up_to(31).into_iter().collect();
    candidates.extend(fibonacci_numbers().take_while(|&f| f <= root as u128).map(|f| f as u64));
    candidates.extend([root.saturating_sub(1), root, root + 1]);

    let positions: Vec<u64> = candidates.into_iter().filter(|x| (2..=root).contains(x)).collect();
    if positions.is_empty() {
        return Vec::new();
    }
    find_coherence_attractors(n, &positions, 20)
}
