//! Golden-ratio constants, exact Fibonacci and Lucas numbers, and the
//! continuous Binet extension.

use crate::FlowError;
use std::f64::consts::PI;

pub const SQRT5: f64 = 2.236_067_977_499_789_7;
/// The golden ratio φ.
pub const PHI: f64 = 1.618_033_988_749_895;
/// The conjugate ψ = 1 − φ.
pub const PSI: f64 = -0.618_033_988_749_894_9;
/// 2π(φ − 1), about 3.8832 radians (the explement of the usual golden angle).
pub const GOLDEN_ANGLE: f64 = 2.0 * PI * (PHI - 1.0);

/// Largest index whose Fibonacci number fits in a `u128`.
pub const MAX_FIB_INDEX: u32 = 186;

/// F(k) by fast doubling, for `k <= MAX_FIB_INDEX`.
///
/// Arithmetic wraps modulo 2^128; the identities are ring identities, so the
/// result is exact whenever F(k) itself fits.
pub(crate) fn fib_u128(k: u32) -> u128 {
    debug_assert!(k <= MAX_FIB_INDEX);
    fn double(i: u32) -> (u128, u128) {
        if i == 0 {
            return (0, 1);
        }
        let (a, b) = double(i >> 1);
        // F(2m) = F(m)(2F(m+1) − F(m)), F(2m+1) = F(m)² + F(m+1)²
        let c = a.wrapping_mul(b.wrapping_mul(2).wrapping_sub(a));
        let d = a.wrapping_mul(a).wrapping_add(b.wrapping_mul(b));
        if i & 1 == 1 {
            (d, c.wrapping_add(d))
        } else {
            (c, d)
        }
    }
    double(k).0
}

/// The k-th Fibonacci number (F(0) = 0, F(1) = 1).
pub fn fib(k: i64) -> Result<u128, FlowError> {
    if k < 0 {
        return Err(FlowError::NegativeIndex(k));
    }
    if k > MAX_FIB_INDEX as i64 {
        return Err(FlowError::IndexTooLarge(k));
    }
    Ok(fib_u128(k as u32))
}

/// The k-th Lucas number (L(0) = 2, L(1) = 1).
pub fn lucas(k: i64) -> Result<u128, FlowError> {
    match k {
        k if k < 0 => Err(FlowError::NegativeIndex(k)),
        0 => Ok(2),
        1 => Ok(1),
        // L(k) = F(k−1) + F(k+1)
        _ => fib(k - 1)?
            .checked_add(fib(k + 1).map_err(|_| FlowError::IndexTooLarge(k))?)
            .ok_or(FlowError::IndexTooLarge(k)),
    }
}

/// Iterator over F(0), F(1), … ending before the first value that overflows `u128`.
#[derive(Debug, Clone)]
pub struct FibonacciNumbers {
    current: Option<u128>,
    next: Option<u128>,
}

impl Iterator for FibonacciNumbers {
    type Item = u128;

    fn next(&mut self) -> Option<u128> {
        let current = self.current?;
        self.current = self.next;
        self.next = self.next.and_then(|n| n.checked_add(current));
        Some(current)
    }
}

pub fn fibonacci_numbers() -> FibonacciNumbers {
    FibonacciNumbers {
        current: Some(0),
        next: Some(1),
    }
}

/// Binet's formula extended to real positions.
///
/// ψ^x is taken on the principal branch, so only its real part
/// |ψ|^x·cos(πx) contributes; at integers this is exactly F(x).
pub fn fib_wave(x: f64) -> f64 {
    let phi_term = PHI.powf(x);
    let psi_term = PSI.abs().powf(x) * (PI * x).cos();
    (phi_term - psi_term) / SQRT5
}

pub fn is_fibonacci(n: u64) -> bool {
    let n = n as u128;
    fibonacci_numbers().take_while(|&f| f <= n).any(|f| f == n)
}

/// Index k whose F(k) is closest to `n` (the lower index on ties).
pub fn nearest_fibonacci_index(n: u64) -> u32 {
    if n == 0 {
        return 0;
    }
    let estimate = ((n as f64 * SQRT5).ln() / PHI.ln()).round();
    let mut k = (estimate.max(0.0) as u32).min(MAX_FIB_INDEX - 1);
    let n = n as u128;

    let fk = fib_u128(k);
    if fk > n && k > 0 {
        let below = fib_u128(k - 1);
        if n - below < fk - n {
            k -= 1;
        }
    } else if fk < n {
        let above = fib_u128(k + 1);
        if above - n < n - fk {
            k += 1;
        }
    }
    k
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fib_known_values() {
        let expected: [u128; 13] = [0, 1, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89, 144];
        for (k, &f) in expected.iter().enumerate() {
            assert_eq!(fib(k as i64).unwrap(), f, "F({})", k);
        }
        assert_eq!(fib(50).unwrap(), 12_586_269_025);
        assert_eq!(fib(93).unwrap(), 12_200_160_415_121_876_738);
    }

    #[test]
    fn test_fib_largest_index() {
        let all: Vec<u128> = fibonacci_numbers().collect();
        assert_eq!(all.len(), MAX_FIB_INDEX as usize + 1);
        assert_eq!(fib(186).unwrap(), all[186]);
        assert_eq!(fib(187), Err(FlowError::IndexTooLarge(187)));
    }

    #[test]
    fn test_fib_negative_index() {
        assert_eq!(fib(-1), Err(FlowError::NegativeIndex(-1)));
        assert_eq!(lucas(-3), Err(FlowError::NegativeIndex(-3)));
    }

    #[test]
    fn test_lucas() {
        let expected: [u128; 10] = [2, 1, 3, 4, 7, 11, 18, 29, 47, 76];
        for (k, &l) in expected.iter().enumerate() {
            assert_eq!(lucas(k as i64).unwrap(), l, "L({})", k);
        }
        assert!(lucas(186).is_err());
    }

    #[test]
    fn test_fib_wave_interpolates_integers() {
        for k in 0..40u32 {
            let exact = fib_u128(k) as f64;
            let wave = fib_wave(k as f64);
            assert!((wave - exact).abs() <= exact * 1e-12 + 1e-9, "k = {}: {} vs {}", k, wave, exact);
        }
        let between = fib_wave(4.5);
        assert!(between > 3.0 && between < 5.0);
    }

    #[test]
    fn test_is_fibonacci() {
        for f in [0u64, 1, 2, 3, 5, 8, 13, 4181, 6765, 12_200_160_415_121_876_738] {
            assert!(is_fibonacci(f), "{} is Fibonacci", f);
        }
        for x in [4u64, 6, 7, 9, 100, 4180, u64::MAX] {
            assert!(!is_fibonacci(x), "{} is not Fibonacci", x);
        }
    }

    #[test]
    fn test_nearest_fibonacci_index() {
        assert_eq!(nearest_fibonacci_index(0), 0);
        assert_eq!(nearest_fibonacci_index(13), 7);
        assert_eq!(nearest_fibonacci_index(20), 8); // 21
        assert_eq!(nearest_fibonacci_index(100), 11); // 89
        assert_eq!(nearest_fibonacci_index(6765), 20);
    }

    #[test]
    fn test_golden_constants() {
        assert!((PHI * PHI - PHI - 1.0).abs() < 1e-12);
        assert!((PHI + PSI - 1.0).abs() < 1e-12);
        assert!((SQRT5 * SQRT5 - 5.0).abs() < 1e-12);
        assert!((GOLDEN_ANGLE - 3.883_222_077_45).abs() < 1e-9);
        assert!((GOLDEN_ANGLE.cos() - (2.0 * PI - GOLDEN_ANGLE).cos()).abs() < 1e-12);
    }
}
