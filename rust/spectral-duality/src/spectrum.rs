//! Spectral signatures: binary, modular, digital and harmonic features of an integer.
//!
//! The full vector has 27 components for every `n >= 1`:
//! - **binary** (12): bit density, lag-1 autocorrelation, first ten run lengths
//! - **modular** (10): normalised residues modulo the first ten odd primes
//! - **digital** (2): normalised digit sum and digital root
//! - **harmonic** (3): Fibonacci-wave phase, log ratio to the nearest Fibonacci number, golden-angle offset

use factoring_core::primes_up_to;
use fibonacci_flow::{fib, fib_wave, GOLDEN_ANGLE, PHI};
use std::f64::consts::PI;

pub const BINARY_LEN: usize = 12;
pub const MODULAR_LEN: usize = 10;
pub const SPECTRAL_LEN: usize = BINARY_LEN + MODULAR_LEN + 2 + 3;

/// Bit density, normalised lag-1 autocorrelation of the ±1 bit sequence,
/// and the first ten run lengths as fractions of the bit length.
///
/// `[0, 0]` for zero, otherwise padded with zeros to 12 features.
pub fn binary_spectrum(n: u64) -> Vec<f64> {
    if n == 0 {
        return vec![0.0, 0.0];
    }

    let len = (u64::BITS - n.leading_zeros()) as usize;
    let bits: Vec<bool> = (0..len).rev().map(|i| (n >> i) & 1 == 1).collect();
    let length = len as f64;

    let ones = bits.iter().filter(|&&b| b).count();
    let density = ones as f64 / length;

    let seq: Vec<f64> = bits.iter().map(|&b| if b { 1.0 } else { -1.0 }).collect();
    let mean = seq.iter().sum::<f64>() / length;
    let autocorr = if len > 1 {
        let lagged: f64 = seq.windows(2).map(|w| (w[0] - mean) * (w[1] - mean)).sum::<f64>() / (length - 1.0);
        let variance = seq.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / length;
        if variance > 0.0 {
            lagged / variance
        } else {
            0.0
        }
    } else {
        0.0
    };

    let mut spectrum = vec![density, autocorr];
    let mut run = 1usize;
    let mut runs = Vec::new();
    for w in bits.windows(2) {
        if w[0] == w[1] {
            run += 1;
        } else {
            runs.push(run as f64 / length);
            run = 1;
        }
    }
    runs.push(run as f64 / length);

    spectrum.extend(runs.into_iter().take(10));
    spectrum.resize(BINARY_LEN, 0.0);
    spectrum
}

/// `(n mod p)/p` over the first `k` odd primes; all zeros for zero.
pub fn modular_spectrum(n: u64, k: usize) -> Vec<f64> {
    if n == 0 {
        return vec![0.0; k];
    }
    let bound = 50.max(3 * k as u64);
    let mut spectrum: Vec<f64> = primes_up_to(bound)
        .into_iter()
        .skip(1)
        .take(k)
        .map(|p| (n % p) as f64 / p as f64)
        .collect();
    spectrum.resize(k, 0.0);
    spectrum
}

/// Digit sum over `9·digits` and digital root over 9.
pub fn digital_spectrum(n: u64) -> Vec<f64> {
    if n == 0 {
        return vec![0.0, 0.0];
    }
    let mut digit_sum = 0u64;
    let mut digits = 0u64;
    let mut m = n;
    while m > 0 {
        digit_sum += m % 10;
        digits += 1;
        m /= 10;
    }
    let digital_root = 1 + (n - 1) % 9;
    vec![
        digit_sum as f64 / (digits * 9) as f64,
        digital_root as f64 / 9.0,
    ]
}

/// Phase of the Fibonacci wave at `log_φ n`, `ln(F+1)/ln(n+1)` for the
/// Fibonacci number F nearest in index, and the golden-angle offset of `n`.
pub fn harmonic_spectrum(n: u64) -> Vec<f64> {
    if n <= 1 {
        return vec![0.0; 3];
    }
    let nf = n as f64;
    let x = nf.ln() / PHI.ln();

    let phase = fib_wave(x).abs() % 1.0;

    let ratio = match fib(x.round() as i64) {
        Ok(f) if f > 0 => (f as f64 + 1.0).ln() / (nf + 1.0).ln(),
        _ => 0.0,
    };

    let offset = (nf * GOLDEN_ANGLE / (2.0 * PI)).rem_euclid(1.0);

    vec![phase, ratio, offset]
}

/// Concatenation of all four spectra.
pub fn spectral_vector(n: u64) -> Vec<f64> {
    let mut v = binary_spectrum(n);
    v.extend(modular_spectrum(n, MODULAR_LEN));
    v.extend(digital_spectrum(n));
    v.extend(harmonic_spectrum(n));
    v
}
