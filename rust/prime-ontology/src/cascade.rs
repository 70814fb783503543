//! Twin-prime and Sophie Germain relationships radiating out of a prime.

use factoring_core::is_prime;

/// Maximum number of related primes a single cascade reports.
const MAX_CASCADE: usize = 10;

/// Follows prime relationships through number space, bounded by `n`.
#[derive(Debug, Clone, Copy)]
pub struct PrimeCascade {
    pub n: u64,
}

impl PrimeCascade {
    pub fn new(n: u64) -> Self {
        Self { n }
    }

    /// Primes related to `p`: its twins `p ± 2`, then the Sophie Germain
    /// chain `p → 2p+1 → 2(2p+1)+1 → …` while the links stay prime and below `n`.
    pub fn cascade(&self, p: u64) -> Vec<u64> {
        let mut out = Vec::new();

        if is_prime(p + 2) {
            out.push(p + 2);
        }
        if p > 2 && is_prime(p - 2) {
            out.push(p - 2);
        }

        let Some(sophie) = p.checked_mul(2).and_then(|v| v.checked_add(1)) else {
            return out;
        };
        if sophie < self.n && is_prime(sophie) {
            out.push(sophie);

            let mut q = sophie;
            while q < self.n && out.len() < MAX_CASCADE {
                match q.checked_mul(2).and_then(|v| v.checked_add(1)) {
                    Some(next) if next < self.n && is_prime(next) => {
                        out.push(next);
                        q = next;
                    }
                    _ => break,
                }
            }
        }

        out
    }
}
