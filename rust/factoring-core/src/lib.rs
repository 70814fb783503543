//! Shared number theory, result types and bounded caches for the prime-axiom experiments.
//!
//! Every axiom crate scores candidate divisors of `n` in `[2, ⌊√n⌋]`; this
//! crate owns the enumeration itself (sieve, deterministic primality, trial
//! division) plus the arbitrary-precision helpers the command-line factorizer
//! needs for inputs beyond `u64`.

pub mod cache;

pub use cache::{BoundedCache, CacheStats, Eviction};

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};
use rand::Rng;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Primes used for the quick divisibility screen before Miller-Rabin.
pub const SMALL_PRIMES: [u64; 11] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31];

/// Witness set that makes Miller-Rabin deterministic for every `u64`.
const DETERMINISTIC_WITNESSES: [u64; 7] = [2, 325, 9375, 28178, 450775, 9780504, 1795265022];

/// Errors raised while validating numeric input.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("'{0}' is not a non-negative integer")]
    InvalidNumber(String),

    #[error("zero has no factorization")]
    Zero,
}

/// Result of a factorization attempt.
#[derive(Debug, Clone)]
pub struct FactorResult {
    /// The number that was factored
    pub n: BigUint,
    /// Found factors (empty if factorization failed)
    pub factors: Vec<BigUint>,
    /// Which method produced this result
    pub algorithm: Algorithm,
    /// Time taken
    pub duration: Duration,
    /// Whether the factorization was complete (all factors found)
    pub complete: bool,
}

/// Methods that can produce or score factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    TrialDivision,
    PollardRhoBrent,
    PrimeOntology,
    FibonacciFlow,
    SpectralDuality,
    ObserverEffect,
    SelfReference,
}

impl Algorithm {
    /// The five heuristic axioms, in their conventional order.
    pub const AXIOMS: [Algorithm; 5] = [
        Algorithm::PrimeOntology,
        Algorithm::FibonacciFlow,
        Algorithm::SpectralDuality,
        Algorithm::ObserverEffect,
        Algorithm::SelfReference,
    ];

    /// Short identifier (`axiom1` .. `axiom5` for the axioms).
    pub fn key(&self) -> &'static str {
        match self {
            Algorithm::TrialDivision => "trial",
            Algorithm::PollardRhoBrent => "rho",
            Algorithm::PrimeOntology => "axiom1",
            Algorithm::FibonacciFlow => "axiom2",
            Algorithm::SpectralDuality => "axiom3",
            Algorithm::ObserverEffect => "axiom4",
            Algorithm::SelfReference => "axiom5",
        }
    }

    pub fn from_key(key: &str) -> Option<Algorithm> {
        [Algorithm::TrialDivision, Algorithm::PollardRhoBrent]
            .into_iter()
            .chain(Algorithm::AXIOMS)
            .find(|a| a.key() == key)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::TrialDivision => write!(f, "Trial Division"),
            Algorithm::PollardRhoBrent => write!(f, "Pollard's rho (Brent)"),
            Algorithm::PrimeOntology => write!(f, "Prime Ontology"),
            Algorithm::FibonacciFlow => write!(f, "Fibonacci Flow"),
            Algorithm::SpectralDuality => write!(f, "Spectral Duality"),
            Algorithm::ObserverEffect => write!(f, "Observer Effect"),
            Algorithm::SelfReference => write!(f, "Self-Reference"),
        }
    }
}

/// A semiprime with known factors for verification.
#[derive(Debug, Clone)]
pub struct Semiprime {
    pub n: BigUint,
    pub p: BigUint,
    pub q: BigUint,
    pub bit_size: u32,
}

impl Semiprime {
    /// Verify that a factorization result is correct.
    pub fn verify(&self, result: &FactorResult) -> bool {
        if result.factors.len() < 2 {
            return false;
        }
        let product: BigUint = result.factors.iter().fold(BigUint::one(), |acc, f| acc * f);
        product == self.n
    }

    /// The semiprime and its factors as machine words, when they fit.
    pub fn to_u64(&self) -> Option<(u64, u64, u64)> {
        Some((self.n.to_u64()?, self.p.to_u64()?, self.q.to_u64()?))
    }
}

/// Parse a decimal integer, rejecting signs and other noise.
pub fn parse_number(input: &str) -> Result<BigUint, CoreError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::InvalidNumber(input.to_string()));
    }
    BigUint::from_str(trimmed).map_err(|_| CoreError::InvalidNumber(input.to_string()))
}

/// Floor of the square root.
pub fn isqrt(n: u64) -> u64 {
    n.isqrt()
}

fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

fn pow_mod(mut base: u64, mut exp: u64, m: u64) -> u64 {
    let mut result = 1u64 % m;
    base %= m;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, base, m);
        }
        base = mul_mod(base, base, m);
        exp >>= 1;
    }
    result
}

/// Deterministic Miller-Rabin primality test, exact for every `u64`.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for p in SMALL_PRIMES {
        if n % p == 0 {
            return n == p;
        }
    }

    let mut d = n - 1;
    let mut s = 0u32;
    while d & 1 == 0 {
        d >>= 1;
        s += 1;
    }

    'witness: for w in DETERMINISTIC_WITNESSES {
        let a = w % n;
        if a == 0 {
            continue;
        }
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }

    true
}

/// All primes `<= limit` using the Sieve of Eratosthenes.
pub fn primes_up_to(limit: u64) -> Vec<u64> {
    if limit < 2 {
        return Vec::new();
    }
    let size = (limit + 1) as usize;
    let mut sieve = vec![true; size];
    sieve[0] = false;
    sieve[1] = false;
    let mut i = 2usize;
    while i * i < size {
        if sieve[i] {
            let mut j = i * i;
            while j < size {
                sieve[j] = false;
                j += i;
            }
        }
        i += 1;
    }
    sieve
        .iter()
        .enumerate()
        .filter(|(_, &p)| p)
        .map(|(i, _)| i as u64)
        .collect()
}

/// Every divisor `d` of `n` with `2 <= d <= ⌊√n⌋`, ascending.
///
/// This is the brute-force enumeration all axiom scorers rank.
pub fn divisors_up_to_sqrt(n: u64) -> Vec<u64> {
    (2..=isqrt(n)).filter(|d| n % d == 0).collect()
}

/// Generate a random prime of exactly `bits` bits.
pub fn random_prime(bits: u32, rng: &mut impl Rng) -> BigUint {
    assert!(bits >= 2, "Cannot generate a prime with fewer than 2 bits");
    loop {
        let num_bytes = (bits as usize + 7) / 8;
        let mut bytes = vec![0u8; num_bytes];
        rng.fill(&mut bytes[..]);

        // Clear the bits above the requested width, then force the top one.
        let excess_bits = (num_bytes * 8) as u32 - bits;
        if excess_bits > 0 {
            bytes[0] &= (1u8 << (8 - excess_bits)) - 1;
        }
        bytes[0] |= 1u8 << ((bits - 1) % 8);

        if let Some(last) = bytes.last_mut() {
            *last |= 0x01;
        }

        let candidate = BigUint::from_bytes_be(&bytes);
        if is_probably_prime(&candidate, 20) {
            return candidate;
        }
    }
}

/// Generate a balanced semiprime with approximately `bits` bits.
pub fn generate_semiprime(bits: u32, rng: &mut impl Rng) -> Semiprime {
    let half_bits = (bits / 2).max(2);
    let p = random_prime(half_bits, rng);
    let q = random_prime(half_bits, rng);
    let n = &p * &q;
    let (p, q) = if p <= q { (p, q) } else { (q, p) };
    Semiprime {
        n,
        p,
        q,
        bit_size: bits,
    }
}

/// Miller-Rabin probabilistic primality test for arbitrary precision.
///
/// Inputs that fit a machine word take the deterministic path.
pub fn is_probably_prime(n: &BigUint, rounds: u32) -> bool {
    if let Some(small) = n.to_u64() {
        return is_prime(small);
    }
    if n.is_even() {
        return false;
    }

    let one = BigUint::one();
    let two = &one + &one;
    let n_minus_1 = n - &one;
    let mut d = n_minus_1.clone();
    let mut r: u32 = 0;
    while d.is_even() {
        d >>= 1u32;
        r += 1;
    }

    let mut rng = rand::thread_rng();

    'witness: for _ in 0..rounds {
        let a = loop {
            let mut random_bytes = vec![0u8; n.to_bytes_be().len()];
            rng.fill(&mut random_bytes[..]);
            let a = BigUint::from_bytes_be(&random_bytes) % n;
            if a >= two && a <= &n_minus_1 - &one {
                break a;
            }
        };

        let mut x = mod_pow(&a, &d, n);
        if x == one || x == n_minus_1 {
            continue 'witness;
        }
        for _ in 0..r - 1 {
            x = mod_pow(&x, &two, n);
            if x == n_minus_1 {
                continue 'witness;
            }
        }
        return false;
    }

    true
}

/// Modular exponentiation: base^exp mod modulus.
pub fn mod_pow(base: &BigUint, exp: &BigUint, modulus: &BigUint) -> BigUint {
    base.modpow(exp, modulus)
}

/// Greatest common divisor.
pub fn gcd(a: &BigUint, b: &BigUint) -> BigUint {
    a.gcd(b)
}

/// Divide out every prime up to `bound`.
///
/// Returns the prime factors found, ascending, and the cofactor left over.
/// The cofactor is 1 when `n` is fully factored and prime when the scan
/// stopped at `√cofactor`; it may be composite only if `bound` was reached
/// first. Zero yields no factors and a zero cofactor.
pub fn trial_division(n: &BigUint, bound: u64) -> (Vec<BigUint>, BigUint) {
    let mut factors = Vec::new();
    let mut remaining = n.clone();
    if remaining <= BigUint::one() {
        return (factors, remaining);
    }

    for p in primes_up_to(bound) {
        let p = BigUint::from(p);
        if &p * &p > remaining {
            break;
        }
        while (&remaining % &p).is_zero() {
            remaining /= &p;
            factors.push(p.clone());
        }
    }
    (factors, remaining)
}

/// Pollard's rho with Brent's cycle detection and batched GCDs.
///
/// Returns a nontrivial factor of `n`, or `None` if every attempt degenerates.
pub fn pollard_rho_brent(n: &BigUint) -> Option<BigUint> {
    pollard_rho_brent_with_attempts(n, 20)
}

fn random_below(n: &BigUint, rng: &mut impl Rng) -> BigUint {
    let mut random_bytes = vec![0u8; n.to_bytes_be().len()];
    rng.fill(&mut random_bytes[..]);
    BigUint::from_bytes_be(&random_bytes) % n
}

fn pollard_rho_brent_with_attempts(n: &BigUint, max_attempts: u32) -> Option<BigUint> {
    let one = BigUint::one();
    let two = BigUint::from(2u32);

    if *n <= one {
        return None;
    }
    if n.is_even() {
        return Some(two);
    }

    let mut rng = rand::thread_rng();

    for attempt in 0..max_attempts {
        let c = loop {
            let c = random_below(n, &mut rng);
            if !c.is_zero() && c != n - &two {
                break c;
            }
        };
        let mut y = loop {
            let y = random_below(n, &mut rng);
            if !y.is_zero() {
                break y;
            }
        };

        let f = |x: &BigUint| -> BigUint { (x * x + &c) % n };

        let mut r: u64 = 1;
        let mut q = BigUint::one();
        let mut ys = y.clone();
        let mut x = y.clone();
        let mut d = BigUint::one();
        let mut gave_up = false;

        while d == one {
            x = y.clone();
            for _ in 0..r {
                y = f(&y);
            }

            let mut k: u64 = 0;
            while k < r && d == one {
                ys = y.clone();
                let batch_size = std::cmp::min(100, r - k);
                for _ in 0..batch_size {
                    y = f(&y);
                    let diff = if y > x { &y - &x } else { &x - &y };
                    q = (q * &diff) % n;
                }
                d = gcd(&q, n);
                k += batch_size;
            }

            r *= 2;
            if r > 2_000_000 {
                gave_up = true;
                break;
            }
        }

        if d == *n || gave_up {
            // The batch overshot; replay single steps from the saved point.
            let mut g = one.clone();
            for _ in 0..2 * r {
                ys = f(&ys);
                let diff = if ys > x { &ys - &x } else { &x - &ys };
                g = gcd(&diff, n);
                if g != one {
                    break;
                }
            }
            if g > one && g < *n {
                return Some(g);
            }
            log::trace!("rho attempt {} degenerated for {}", attempt, n);
            continue;
        }

        if d > one && d < *n {
            return Some(d);
        }
    }

    None
}
