//! Interference of prime-frequency and Fibonacci-frequency cosine waves over `[2, √n]`.

use factoring_core::{isqrt, primes_up_to};
use fibonacci_flow::{fibonacci_numbers, PHI};
use rayon::prelude::*;
use std::f64::consts::PI;

const MAX_WAVES: usize = 10;

fn wave_primes(root: u64) -> Vec<u64> {
    primes_up_to(root.min(100)).into_iter().take(MAX_WAVES).collect()
}

/// F(2), F(3), … up to `bound`, at most `limit` of them.
fn fibonacci_up_to(bound: u64, limit: usize) -> Vec<u64> {
    fibonacci_numbers()
        .skip(2)
        .take_while(|&f| f <= bound as u128)
        .take(limit)
        .map(|f| f as u64)
        .collect()
}

fn prime_wave(primes: &[u64], x: f64, n: f64) -> f64 {
    primes.iter().map(|&p| (2.0 * PI * p as f64 * x / n).cos()).sum()
}

fn fibonacci_wave(fibs: &[u64], x: f64, n: f64) -> f64 {
    fibs.iter().map(|&f| (2.0 * PI * f as f64 * x / (n * PHI)).cos()).sum()
}

/// Interference value at each x in `2..=√n` (index `x − 2`).
///
/// The product of a prime wave over the first ten primes `<= min(√n, 100)`
/// and a φ-stretched Fibonacci wave over the first ten F(k ≥ 2) `<= √n`.
pub fn prime_fib_interference(n: u64) -> Vec<f64> {
    let root = isqrt(n);
    if root < 2 {
        return Vec::new();
    }
    let primes = wave_primes(root);
    let fibs = fibonacci_up_to(root, MAX_WAVES);
    let nf = n as f64;

    let count = (root - 1) as usize;
    (0..count)
        .into_par_iter()
        .map(|i| {
            let x = (i + 2) as f64;
            prime_wave(&primes, x, nf) * fibonacci_wave(&fibs, x, nf)
        })
        .collect()
}

/// Positions of the `top` strongest local extrema of an interference pattern,
/// by absolute value (larger position first on ties).
pub fn pattern_extrema(spectrum: &[f64], top: usize) -> Vec<u64> {
    if spectrum.len() < 3 {
        return Vec::new();
    }
    let mut extrema: Vec<(f64, u64)> = spectrum
        .windows(3)
        .enumerate()
        .filter(|(_, w)| (w[1] > w[0] && w[1] > w[2]) || (w[1] < w[0] && w[1] < w[2]))
        .map(|(i, w)| (w[1].abs(), i as u64 + 3))
        .collect();

    extrema.sort_by(|a, b| b.0.total_cmp(&a.0).then(b.1.cmp(&a.1)));
    extrema.into_iter().take(top).map(|(_, x)| x).collect()
}

/// [`pattern_extrema`] of [`prime_fib_interference`].
pub fn interference_extrema(n: u64, top: usize) -> Vec<u64> {
    pattern_extrema(&prime_fib_interference(n), top)
}

/// The `(prime, fibonacci)` pair whose combined wave is strongest at `x`.
///
/// Primes dividing `x` are skipped; both lists fall back to `[2]` when empty.
pub fn identify_resonance_source(x: u64, n: u64) -> (u64, u64) {
    let root = isqrt(n);
    let mut primes: Vec<u64> = primes_up_to(root.min(100)).into_iter().filter(|p| x % p != 0).collect();
    if primes.is_empty() {
        primes.push(2);
    }
    let mut fibs = fibonacci_up_to(root, 18);
    if fibs.is_empty() {
        fibs.push(2);
    }

    let (xf, nf) = (x as f64, n as f64);
    let mut best = (primes[0], fibs[0]);
    let mut best_resonance = 0.0;
    for &p in &primes {
        for &f in &fibs {
            let resonance = (2.0 * PI * p as f64 * xf / nf).cos().abs()
                * (2.0 * PI * f as f64 * xf / (nf * PHI)).cos().abs();
            if resonance > best_resonance {
                best_resonance = resonance;
                best = (p, f);
            }
        }
    }
    best
}

/// Central difference of the interference pattern at `x`; zero when
/// `x ± delta` leaves `[2, √n]`.
pub fn interference_gradient(n: u64, x: u64, delta: u64) -> f64 {
    let root = isqrt(n);
    if delta == 0 || x < delta + 2 || x + delta > root {
        return 0.0;
    }
    let spectrum = prime_fib_interference(n);
    let lo = (x - delta - 2) as usize;
    let hi = (x + delta - 2) as usize;
    match (spectrum.get(lo), spectrum.get(hi)) {
        (Some(a), Some(b)) => (b - a) / (2 * delta) as f64,
        _ => 0.0,
    }
}

/// Average phase agreement of `p` and `q` with `n` over the primes 2..11
/// and F(2)..F(6), in `[0, 1]`.
pub fn resonance_strength(p: u64, q: u64, n: u64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let primes = [2u64, 3, 5, 7, 11];
    let fibs = fibonacci_up_to(u64::MAX, 5);
    let nf = n as f64;
    let tau = 2.0 * PI;
    let phase = |freq: f64, x: u64, scale: f64| (tau * freq * x as f64 / scale).rem_euclid(tau);

    let mut strength = 0.0;
    for &prime in &primes {
        for &f in &fibs {
            let pf = prime as f64;
            let prime_coherence =
                ((phase(pf, p, nf) + phase(pf, q, nf)) / 2.0 - phase(pf, n, nf)).cos().abs();

            let ff = f as f64;
            let scale = nf * PHI;
            let fib_coherence =
                ((phase(ff, p, scale) + phase(ff, q, scale)) / 2.0 - phase(ff, n, scale)).cos().abs();

            strength += prime_coherence * fib_coherence;
        }
    }
    strength / (primes.len() * fibs.len()) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interference_length() {
        assert_eq!(prime_fib_interference(8051).len(), 88);
        assert!(prime_fib_interference(3).is_empty());
    }

    #[test]
    fn test_interference_matches_direct_sum() {
        let n = 2021u64;
        let pattern = prime_fib_interference(n);
        let primes = [2.0, 3.0, 5.0, 7.0, 11.0, 13.0, 17.0, 19.0, 23.0, 29.0];
        let fibs = [1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0, 34.0];
        let x = 10.0;
        let direct = primes.iter().map(|p| (2.0 * PI * p * x / 2021.0).cos()).sum::<f64>()
            * fibs.iter().map(|f| (2.0 * PI * f * x / (2021.0 * PHI)).cos()).sum::<f64>();
        assert!((pattern[8] - direct).abs() < 1e-9);
    }

    #[test]
    fn test_pattern_extrema() {
        let spectrum = [0.0, 5.0, 0.0, -7.0, 0.0, 5.0, 1.0];
        // Extrema at indices 1, 3, 5 => positions 3, 5, 7.
        assert_eq!(pattern_extrema(&spectrum, 30), vec![5, 7, 3]);
        assert_eq!(pattern_extrema(&spectrum, 1), vec![5]);
        assert!(pattern_extrema(&[1.0, 2.0], 30).is_empty());
    }

    #[test]
    fn test_interference_extrema_in_range() {
        let extrema = interference_extrema(1_000_003, 30);
        assert!(!extrema.is_empty() && extrema.len() <= 30);
        assert!(extrema.iter().all(|&x| (3..1000).contains(&x)));
    }

    #[test]
    fn test_identify_resonance_source() {
        let (p, f) = identify_resonance_source(10, 8051);
        assert!(factoring_core::is_prime(p) && 10 % p != 0);
        assert!(fibonacci_flow::is_fibonacci(f) && f <= 89);
        // Below 4 no prime qualifies; F(2) = 1 is the only wave.
        assert_eq!(identify_resonance_source(5, 3), (2, 1));
    }

    #[test]
    fn test_interference_gradient_bounds() {
        assert_eq!(interference_gradient(8051, 2, 1), 0.0);
        assert_eq!(interference_gradient(8051, 89, 1), 0.0);
        let pattern = prime_fib_interference(8051);
        let g = interference_gradient(8051, 40, 2);
        assert!((g - (pattern[40] - pattern[36]) / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_resonance_strength_range() {
        for (p, q, n) in [(11u64, 13u64, 143u64), (43, 47, 2021), (2, 3, 1000)] {
            let s = resonance_strength(p, q, n);
            assert!((0.0..=1.0).contains(&s), "resonance_strength = {}", s);
        }
        assert_eq!(resonance_strength(1, 1, 0), 0.0);
    }
}
