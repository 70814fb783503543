//! Position generators for escaping stalled searches: tunnelling, harmonics,
//! folding points and pairwise entanglement.

use factoring_core::{isqrt, primes_up_to};
use fibonacci_flow::{fibonacci_numbers, PHI};
use std::collections::BTreeSet;

/// Jumps past a blocked region to the nearest Fibonacci number or prime beyond it.
#[derive(Debug, Clone, Copy)]
pub struct QuantumTunnel {
    pub n: u64,
    pub root: u64,
}

impl QuantumTunnel {
    pub fn new(n: u64) -> Self {
        Self { n, root: isqrt(n) }
    }

    /// Smallest Fibonacci number or prime in `(target, root]` with
    /// `target = min(root, blocked + width)`, else `target` itself.
    pub fn exit(&self, blocked: u64, width: u64) -> u64 {
        let target = self.root.min(blocked.saturating_add(width));

        let fib_exit = fibonacci_numbers()
            .skip(1)
            .take(29)
            .take_while(|&f| f <= self.root as u128)
            .map(|f| f as u64)
            .find(|&f| f > target);

        let prime_exit = primes_up_to(target.saturating_add(100).min(self.root))
            .into_iter()
            .find(|&p| p > target);

        match (fib_exit, prime_exit) {
            (Some(f), Some(p)) => f.min(p),
            (Some(x), None) | (None, Some(x)) => x,
            (None, None) => target,
        }
    }

    /// Successive exits with widths 30, 60, 90, …, stopping when no progress
    /// is made or the walk passes 90% of the root.
    pub fn tunnel_sequence(&self, start: u64, max_tunnels: usize) -> Vec<u64> {
        let mut sequence = Vec::new();
        let mut current = start;
        for i in 0..max_tunnels {
            let exit = self.exit(current, 30 * (i as u64 + 1));
            if exit == current {
                break;
            }
            sequence.push(exit);
            current = exit;
            if current as f64 > self.root as f64 * 0.9 {
                break;
            }
        }
        sequence
    }
}

/// Multiples of `x`, their residues mod √n, φ-scalings and small-prime
/// multiples, all within `[2, √n]`. Ascending.
pub fn harmonic_amplify(n: u64, x: u64) -> Vec<u64> {
    let root = isqrt(n);
    if x == 0 {
        return Vec::new();
    }
    let mut harmonics = BTreeSet::new();
    let in_range = |h: u64| (2..=root).contains(&h);

    let k_max = 10.min(root / x + 1);
    for k in 2..k_max {
        let h = k * x;
        if h > root {
            break;
        }
        harmonics.insert(h);
    }
    for k in 2..k_max {
        let h = match (k * x) % root {
            0 => k,
            h => h,
        };
        if in_range(h) {
            harmonics.insert(h);
        }
    }

    for h in [(x as f64 * PHI) as u64, (x as f64 / PHI) as u64] {
        if in_range(h) {
            harmonics.insert(h);
        }
    }

    for p in primes_up_to(20.min(root / x)) {
        let h = x * p;
        if h <= root {
            harmonics.insert(h);
        }
        let h = match h % root {
            0 => p,
            h => h,
        };
        if in_range(h) {
            harmonics.insert(h);
        }
    }

    harmonics.into_iter().collect()
}

/// Folding points from powers of two, decimal periods of small primes and Fibonacci numbers.
#[derive(Debug, Clone)]
pub struct SpectralFolder {
    pub n: u64,
    pub root: u64,
    points: Vec<u64>,
}

/// Multiplicative order of 10 mod `p` as found by stepping residues, or `p` when none repeats.
fn decimal_period(p: u64) -> u64 {
    let start = 10 % p;
    let mut remainder = start;
    let mut period = 1;
    while period < p {
        remainder = remainder * 10 % p;
        if remainder == start {
            break;
        }
        period += 1;
    }
    period
}

impl SpectralFolder {
    pub fn new(n: u64) -> Self {
        let root = isqrt(n);
        let mut folds = BTreeSet::from([2]);
        let in_range = |x: u64| (2..=root).contains(&x);

        for i in 1..(u64::BITS - n.leading_zeros()) {
            let power = 1u64 << i;
            if power <= root {
                folds.insert(power);
            }
            if power < n && in_range(n / power) {
                folds.insert(n / power);
            }
        }

        for p in primes_up_to(100.min(root)) {
            let period = decimal_period(p);
            if period > 1 && period < p {
                folds.extend((period..root).step_by(period as usize));
            }
        }

        folds.extend(
            fibonacci_numbers()
                .take_while(|&f| f <= root as u128)
                .map(|f| f as u64)
                .filter(|&f| f >= 2),
        );

        Self {
            n,
            root,
            points: folds.into_iter().collect(),
        }
    }

    /// Folding points, ascending.
    pub fn points(&self) -> &[u64] {
        &self.points
    }

    /// First folding point after `current`, or a jump of `max(1, root/20)` capped at the root.
    pub fn next_fold(&self, current: u64) -> u64 {
        let i = self.points.partition_point(|&f| f <= current);
        match self.points.get(i) {
            Some(&fold) => fold,
            None => self.root.min(current + (self.root / 20).max(1)),
        }
    }

    /// Closest folding point (the smaller on ties).
    pub fn nearest_fold(&self, position: u64) -> u64 {
        self.points
            .iter()
            .copied()
            .min_by_key(|&f| f.abs_diff(position))
            .unwrap_or(position)
    }
}

/// Keep the heaviest `max(1, ⌊len·(1 − collapse_factor)⌋)` positions.
///
/// Positions are returned unchanged when there are no weights or they sum to zero.
pub fn superposition_collapse(positions: &[u64], weights: &[f64], collapse_factor: f64) -> Vec<u64> {
    let total: f64 = weights.iter().sum();
    if positions.is_empty() || weights.is_empty() || total == 0.0 {
        return positions.to_vec();
    }
    let mut pairs: Vec<(u64, f64)> = positions.iter().copied().zip(weights.iter().map(|w| w / total)).collect();
    pairs.sort_by(|a, b| b.1.total_cmp(&a.1));

    let keep = ((positions.len() as f64 * (1.0 - collapse_factor)) as usize).max(1);
    pairs.into_iter().take(keep).map(|(x, _)| x).collect()
}

/// Sums, differences, means, golden mixtures and the product residue of two positions.
pub fn entangle_positions(n: u64, a: u64, b: u64) -> Vec<u64> {
    let root = isqrt(n);
    let in_range = |x: u64| (2..=root).contains(&x);
    let mut entangled = BTreeSet::new();

    if let Some(sum) = a.checked_add(b).filter(|&s| s <= root) {
        entangled.insert(sum);
    }
    if a.abs_diff(b) >= 2 {
        entangled.insert(a.abs_diff(b));
    }

    let (af, bf) = (a as f64, b as f64);
    let geometric = (af * bf).sqrt() as u64;
    let harmonic = if a > 0 || b > 0 { (2.0 * af * bf / (af + bf)) as u64 } else { 0 };
    let golden = [(af * PHI + bf / PHI) as u64, (af / PHI + bf * PHI) as u64];
    for x in [geometric, harmonic].into_iter().chain(golden) {
        if in_range(x) {
            entangled.insert(x);
        }
    }

    if root > 0 {
        let residue = match ((a as u128 * b as u128) % root as u128) as u64 {
            0 => a.min(b),
            r => r,
        };
        if in_range(residue) {
            entangled.insert(residue);
        }
    }

    entangled.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tunnel_exit() {
        let tunnel = QuantumTunnel::new(1_000_000);
        // Beyond 70: F = 89, first prime 71.
        assert_eq!(tunnel.exit(10, 60), 71);
        assert_eq!(tunnel.exit(990, 60), 1000, "nothing past the root");
        let small = QuantumTunnel::new(400);
        assert_eq!(small.exit(5, 10), 17);
    }

    #[test]
    fn test_tunnel_sequence() {
        let tunnel = QuantumTunnel::new(1_000_000);
        let sequence = tunnel.tunnel_sequence(10, 5);
        assert_eq!(sequence[0], 41);
        assert!(sequence.windows(2).all(|w| w[0] < w[1]));
        assert!(sequence.len() <= 5);

        let edge = QuantumTunnel::new(100);
        assert!(edge.tunnel_sequence(10, 5).is_empty());
    }

    #[test]
    fn test_harmonic_amplify() {
        let harmonics = harmonic_amplify(10_000, 7);
        // 2·7 .. 9·7, φ·7 = 11, 7/φ = 4, and 7·p for p ≤ 14
        for h in [14u64, 21, 28, 35, 63, 11, 4, 49, 77, 91] {
            assert!(harmonics.contains(&h), "missing {}", h);
        }
        assert!(harmonics.iter().all(|&h| (2..=100).contains(&h)));
        assert!(harmonic_amplify(10_000, 0).is_empty());
        assert!(harmonic_amplify(10_000, 200).is_empty(), "x beyond the root has no harmonics");
    }

    #[test]
    fn test_decimal_period() {
        assert_eq!(decimal_period(3), 1);
        assert_eq!(decimal_period(7), 6);
        assert_eq!(decimal_period(11), 2);
        assert_eq!(decimal_period(13), 6);
        assert_eq!(decimal_period(2), 1);
    }

    #[test]
    fn test_spectral_folder() {
        let folder = SpectralFolder::new(10_000);
        let points = folder.points();
        assert!(points.windows(2).all(|w| w[0] < w[1]));
        for x in [2u64, 4, 64, 13, 89, 6, 12, 78] {
            assert!(points.contains(&x), "missing fold {}", x);
        }
        assert!(points.iter().all(|&x| (2..=100).contains(&x)));

        assert_eq!(folder.next_fold(1), 2);
        assert_eq!(folder.next_fold(100), 100);
        assert_eq!(folder.nearest_fold(2), 2);
    }

    #[test]
    fn test_superposition_collapse() {
        let positions = [10u64, 20, 30, 40];
        let weights = [0.1, 0.4, 0.2, 0.3];
        assert_eq!(superposition_collapse(&positions, &weights, 0.5), vec![20, 40]);
        assert_eq!(superposition_collapse(&positions, &weights, 1.0), vec![20]);
        assert_eq!(superposition_collapse(&positions, &[0.0; 4], 0.5), positions.to_vec());
        assert!(superposition_collapse(&[], &weights, 0.5).is_empty());
    }

    #[test]
    fn test_entangle_positions() {
        let e = entangle_positions(10_000, 8, 18);
        // 26, 10, 12, 11 (harmonic 11.07), φ mixes 24 and 34, 144 mod 100 = 44
        assert_eq!(e, vec![10, 11, 12, 24, 26, 34, 44]);
        assert!(entangle_positions(0, 3, 5).contains(&2));
    }

    #[test]
    fn test_entangle_positions_near_u64_max() {
        // root = 999_992; the sum does not fit, the harmonic mean is 20 and
        // (2^64 - 2) * 10 mod root = 423_556.
        let e = entangle_positions(1_000_003 * 999_983, u64::MAX - 1, 10);
        assert_eq!(e, vec![20, 423_556, u64::MAX - 11]);
        // Only the product residue survives: (2^64 - 1)^2 mod 100 = 25.
        assert_eq!(entangle_positions(10_000, u64::MAX, u64::MAX), vec![25]);
    }
}
