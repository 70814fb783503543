//! Fold energy landscape: `x` and its cofactor `n/x` folded back onto `n` in spectral space.
//!
//! Low energy marks positions whose signature pairs well with the cofactor.
//! The topology view links nearby minima whose connecting path stays low.

use crate::coherence::spectral_distance;
use crate::spectrum::spectral_vector;
use factoring_core::isqrt;
use std::collections::{BTreeMap, BTreeSet};

/// `‖S(x) + S(⌊n/x⌋) − 2S(n)‖²`; infinite outside `1..=n`.
pub fn fold_energy(n: u64, x: u64) -> f64 {
    if x == 0 || x > n {
        return f64::INFINITY;
    }
    let (sx, sy, sn) = (spectral_vector(x), spectral_vector(n / x), spectral_vector(n));
    spectral_distance(&[&sx, &sy], &sn)
}

/// Up to ten positions within `span` of √n with the most negative discrete curvature.
pub fn sharp_fold_candidates(n: u64, span: u64) -> Vec<u64> {
    let root = isqrt(n);
    let start = root.saturating_sub(span).max(2);
    let end = (root + span).min(n / 2);
    if end < start {
        return Vec::new();
    }

    let window: Vec<u64> = (start..=end).collect();
    let energies: Vec<f64> = window.iter().map(|&x| fold_energy(n, x)).collect();

    let mut curvatures: Vec<(f64, u64)> = (1..window.len().saturating_sub(1))
        .map(|i| (energies[i - 1] - 2.0 * energies[i] + energies[i + 1], window[i]))
        .collect();
    curvatures.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    curvatures.into_iter().take(10).map(|(_, x)| x).collect()
}

/// Graph of local fold-energy minima in `[3, √n)`.
#[derive(Debug, Clone)]
pub struct FoldTopology {
    pub n: u64,
    pub root: u64,
    points: Vec<u64>,
    energies: BTreeMap<u64, f64>,
    connections: BTreeMap<u64, Vec<(u64, f64)>>,
}

impl FoldTopology {
    pub fn new(n: u64) -> Self {
        let root = isqrt(n);
        let energies: BTreeMap<u64, f64> = (2..=root).map(|x| (x, fold_energy(n, x))).collect();

        let points: Vec<u64> = (3..root)
            .filter(|x| energies[x] < energies[&(x - 1)] && energies[x] < energies[&(x + 1)])
            .collect();

        let energy_at = |x: u64| energies.get(&x).copied().unwrap_or_else(|| fold_energy(n, x));

        let mut connections = BTreeMap::new();
        for &p1 in &points {
            let mut edges = Vec::new();
            for &p2 in &points {
                if p2 == p1 {
                    continue;
                }
                let span = p2 as f64 - p1 as f64;
                let path_energy = [0.25, 0.5, 0.75]
                    .iter()
                    .map(|t| energy_at((p1 as f64 + t * span) as u64))
                    .sum::<f64>()
                    / 3.0;
                let endpoint_energy = (energies[&p1] + energies[&p2]) / 2.0;
                if path_energy < endpoint_energy * 1.5 {
                    edges.push((p2, 1.0 / (1.0 + path_energy)));
                }
            }
            connections.insert(p1, edges);
        }

        log::debug!(
            "fold topology for {}: {} minima, {} edges",
            n,
            points.len(),
            connections.values().map(Vec::len).sum::<usize>()
        );

        Self {
            n,
            root,
            points,
            energies,
            connections,
        }
    }

    /// Local minima, ascending.
    pub fn points(&self) -> &[u64] {
        &self.points
    }

    /// `(neighbour, weight)` edges leaving `point`.
    pub fn connections(&self, point: u64) -> &[(u64, f64)] {
        self.connections.get(&point).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Connected components, each sorted, discovered from the smallest unvisited point.
    pub fn components(&self) -> Vec<Vec<u64>> {
        let mut unvisited: BTreeSet<u64> = self.points.iter().copied().collect();
        let mut components = Vec::new();

        while let Some(seed) = unvisited.pop_first() {
            let mut component = Vec::new();
            let mut stack = vec![seed];
            while let Some(current) = stack.pop() {
                component.push(current);
                for &(neighbour, _) in self.connections(current) {
                    if unvisited.remove(&neighbour) {
                        stack.push(neighbour);
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }
        components
    }

    /// Greedy walk from the lowest-energy minimum along the heaviest edge,
    /// stopping at a divisor, a dead end, or a revisit.
    pub fn traverse(&self) -> Vec<u64> {
        let Some(mut current) = self
            .points
            .iter()
            .copied()
            .reduce(|best, x| if self.energies[&x] < self.energies[&best] { x } else { best })
        else {
            return Vec::new();
        };

        let mut visited = BTreeSet::new();
        let mut path = Vec::new();
        while visited.insert(current) {
            path.push(current);
            if self.n % current == 0 {
                break;
            }
            let best = self
                .connections(current)
                .iter()
                .copied()
                .reduce(|best, edge| if edge.1 > best.1 { edge } else { best });
            match best {
                Some((next, _)) => current = next,
                None => break,
            }
        }
        path
    }
}

/// Local minima of the fold energy sampled every `max(1, √n / resolution)` from 2.
pub fn find_energy_valleys(n: u64, resolution: u64) -> Vec<u64> {
    let root = isqrt(n);
    let step = (root / resolution.max(1)).max(1);

    let mut valleys = Vec::new();
    let mut prev_energy = f64::INFINITY;
    let mut current = (2, fold_energy(n, 2));

    let mut x = 3;
    while x <= root {
        let next_energy = fold_energy(n, x);
        if current.1 < prev_energy && current.1 < next_energy {
            valleys.push(current.0);
        }
        prev_energy = current.1;
        current = (x, next_energy);
        x += step;
    }
    valleys
}
