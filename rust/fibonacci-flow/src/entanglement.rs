//! Detection of factor pairs that both sit close to Fibonacci numbers.

use crate::sequence::{fib_u128, lucas, PHI, SQRT5};
use factoring_core::isqrt;

/// Measures how strongly the factors of `n` are tied to the Fibonacci sequence.
#[derive(Debug, Clone, Copy)]
pub struct FibonacciEntanglement {
    pub n: u64,
    pub root: u64,
}

impl FibonacciEntanglement {
    pub fn new(n: u64) -> Self {
        Self { n, root: isqrt(n) }
    }

    /// `(p, q, strength)` for divisors `p = F(k) + δ` (|δ| ≤ 5) whose
    /// cofactor lies within 10% of a Fibonacci number, strongest first, at most ten.
    pub fn detect_double(&self) -> Vec<(u64, u64, f64)> {
        let mut candidates = Vec::new();

        for k in 1..30 {
            let base = fib_u128(k) as i64;
            if base as u64 >= self.root {
                break;
            }
            for delta in -5..=5i64 {
                let p = base + delta;
                if p <= 1 || self.n % p as u64 != 0 {
                    continue;
                }
                let p = p as u64;
                let q = self.n / p;
                let distance = min_fibonacci_distance(q) as f64;
                if distance < 0.1 * q as f64 {
                    candidates.push((p, q, 1.0 / (1.0 + distance / q as f64)));
                }
            }
        }

        candidates.sort_by(|a, b| b.2.total_cmp(&a.2));
        candidates.truncate(10);
        candidates
    }

    /// Geometric mean of each factor's proximity `1/(1 + d/x)` to the sequence.
    pub fn fibonacci_alignment_score(&self, p: u64, q: u64) -> f64 {
        let proximity = |x: u64| 1.0 / (1.0 + min_fibonacci_distance(x) as f64 / x.max(1) as f64);
        (proximity(p) * proximity(q)).sqrt()
    }

    /// `exp(−d)` where `d` is the smallest distance of `p/q` or `q/p` from φ or 1/φ.
    pub fn golden_ratio_alignment(&self, p: u64, q: u64) -> f64 {
        if p == 0 || q == 0 {
            return 0.0;
        }
        let dist = |r: f64| (r - PHI).abs().min((r - 1.0 / PHI).abs());
        let r = p as f64 / q as f64;
        (-dist(r).min(dist(1.0 / r))).exp()
    }

    /// Whether `{p, q}` are consecutive Fibonacci numbers or a matching
    /// Fibonacci/Lucas pair F(k), L(k).
    pub fn lucas_fibonacci_relation(&self, p: u64, q: u64) -> bool {
        let (p, q) = (p as u128, q as u128);
        for k in 1..50u32 {
            let fk = fib_u128(k);
            let next = fib_u128(k + 1);
            if (p == fk && q == next) || (p == next && q == fk) {
                return true;
            }
            if let Ok(lk) = lucas(k as i64) {
                if (p == fk && q == lk) || (p == lk && q == fk) {
                    return true;
                }
            }
            if fk > p.max(q) {
                break;
            }
        }
        false
    }
}

/// Smallest |x − F(k)| over the Fibonacci numbers near `x`.
pub fn min_fibonacci_distance(x: u64) -> u64 {
    if x == 0 {
        return 0;
    }
    let estimate = ((x as f64 * SQRT5).ln() / PHI.ln()) as i64;
    let lo = (estimate - 2).max(1) as u32;
    let hi = (estimate + 5).min(100) as u32;

    let x = x as u128;
    let mut best = x;
    for k in lo..hi {
        let f = fib_u128(k);
        best = best.min(f.abs_diff(x));
        if f > x + best {
            break;
        }
    }
    best as u64
}
