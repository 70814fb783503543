//! Candidate positions arranged around Fibonacci numbers and the golden spiral.

use crate::resonance_map::FibonacciResonanceMap;
use crate::sequence::{fib_u128, GOLDEN_ANGLE, PHI};
use factoring_core::{isqrt, primes_up_to};
use std::collections::BTreeSet;

const MAX_VORTEX_INDEX: u32 = 30;

/// Prime-modulated points `(f·p) mod root` for the first 20 primes `<= min(100, f)`.
fn modulate(f: u64, root: u64, points: &mut BTreeSet<u64>) {
    for p in primes_up_to(f.min(100)).into_iter().take(20) {
        let mut modulated = ((f as u128 * p as u128) % root as u128) as u64;
        if modulated == 0 {
            modulated = p;
        }
        if (2..=root).contains(&modulated) {
            points.insert(modulated);
        }
    }
}

/// Vortex positions in `[2, √n]`, ascending.
///
/// Without a map: Fibonacci numbers below the root, their φ and φ⁻¹
/// scalings, and prime-modulated points. With a map: its vortex points
/// around `root/2`, the Fibonacci numbers up to the root and prime
/// modulation of the first ten of them.
pub fn fib_vortices(n: u64, resonance_map: Option<&mut FibonacciResonanceMap>) -> Vec<u64> {
    let root = isqrt(n);

    if let Some(map) = resonance_map {
        let mut points = map.vortex_points(root / 2, root / 2);
        let fibs = map.fibonacci_range(2, root);
        points.extend(fibs.iter().copied());
        for &f in fibs.iter().take(10) {
            modulate(f, root, &mut points);
        }
        return points.into_iter().filter(|&p| (2..=root).contains(&p)).collect();
    }

    let mut points = BTreeSet::new();
    for k in 1..MAX_VORTEX_INDEX {
        let f = fib_u128(k) as u64;
        if f >= root {
            break;
        }
        if f >= 2 {
            points.insert(f);
        }

        let phi_scaled = (f as f64 * PHI) as u64;
        if (2..=root).contains(&phi_scaled) {
            points.insert(phi_scaled);
        }
        let inv_scaled = (f as f64 / PHI) as u64;
        if (2..=root).contains(&inv_scaled) {
            points.insert(inv_scaled);
        }

        modulate(f, root, &mut points);
    }
    points.into_iter().collect()
}

/// Up to `num_points` positions sampled along a golden spiral centred at `root/2`.
///
/// At most `root/10` points are drawn, so tiny inputs yield none.
pub fn golden_spiral_positions(n: u64, num_points: usize) -> Vec<u64> {
    let root = isqrt(n);
    let center = (root / 2) as i64;
    let count = num_points.min((root / 10) as usize);

    let mut positions = Vec::new();
    let mut angle = 0.0f64;
    for i in 0..count {
        let r = (root as f64 * (i + 1) as f64 / num_points as f64) as i64;
        let x = (r as f64 * angle.cos()) as i64 + center;
        if x >= 2 && x as u64 <= root {
            positions.push(x as u64);
        }
        angle += GOLDEN_ANGLE;
    }
    positions
}

/// Sums, differences and products (mod root) of pairs of Fibonacci numbers up to the root.
pub fn fibonacci_lattice_points(n: u64) -> Vec<u64> {
    let root = isqrt(n);
    let lines: Vec<u64> = (1..)
        .map(fib_u128)
        .take_while(|&f| f <= root as u128)
        .map(|f| f as u64)
        .collect();

    let mut points = BTreeSet::new();
    let mut keep = |p: u64| {
        if (2..=root).contains(&p) {
            points.insert(p);
        }
    };
    for (i, &f1) in lines.iter().enumerate() {
        for &f2 in &lines[i..] {
            keep(f1 + f2);
            keep(f1.abs_diff(f2));
            let product = ((f1 as u128 * f2 as u128) % root as u128) as u64;
            keep(if product == 0 { f1.min(f2) } else { product });
        }
    }
    points.into_iter().collect()
}
