//! Spectral coherence between candidate factors and their product.

use crate::spectrum::spectral_vector;
use factoring_core::BoundedCache;

/// Default capacity of each [`CoherenceCache`] table.
pub const DEFAULT_COHERENCE_CAPACITY: usize = 10_000;

/// ‖Σ S(parts) − k·S(n)‖² over the shortest common prefix, where k is the number of parts.
pub(crate) fn spectral_distance(parts: &[&[f64]], target: &[f64]) -> f64 {
    let k = parts.len() as f64;
    let len = parts.iter().map(|s| s.len()).chain([target.len()]).min().unwrap_or(0);
    (0..len)
        .map(|i| {
            let diff = parts.iter().map(|s| s[i]).sum::<f64>() - k * target[i];
            diff * diff
        })
        .sum()
}

/// `exp(−‖S(a) + S(b) − 2S(n)‖²)`, in `(0, 1]`.
///
/// High coherence means the signatures of `a` and `b` combine into that of `n`.
pub fn coherence(a: u64, b: u64, n: u64) -> f64 {
    let (sa, sb, sn) = (spectral_vector(a), spectral_vector(b), spectral_vector(n));
    (-spectral_distance(&[&sa, &sb], &sn)).exp()
}

/// Three-factor variant: `exp(−‖S(p) + S(q) + S(r) − 3S(n)‖²)`.
pub fn triple_coherence(p: u64, q: u64, r: u64, n: u64) -> f64 {
    let (sp, sq, sr, sn) = (
        spectral_vector(p),
        spectral_vector(q),
        spectral_vector(r),
        spectral_vector(n),
    );
    (-spectral_distance(&[&sp, &sq, &sr], &sn)).exp()
}

/// Memoized spectral vectors and coherence values with FIFO eviction.
///
/// The coherence key is `(min(a, b), max(a, b), n)`, so argument order does not matter.
#[derive(Debug, Clone)]
pub struct CoherenceCache {
    spectral: BoundedCache<u64, Vec<f64>>,
    coherence: BoundedCache<(u64, u64, u64), f64>,
}

impl Default for CoherenceCache {
    fn default() -> Self {
        Self::new(DEFAULT_COHERENCE_CAPACITY)
    }
}

impl CoherenceCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            spectral: BoundedCache::fifo(max_size),
            coherence: BoundedCache::fifo(max_size),
        }
    }

    pub fn spectral(&mut self, n: u64) -> Vec<f64> {
        self.spectral.get_or_insert_with(n, || spectral_vector(n))
    }

    pub fn coherence(&mut self, a: u64, b: u64, n: u64) -> f64 {
        let key = (a.min(b), a.max(b), n);
        if let Some(&c) = self.coherence.get(&key) {
            return c;
        }
        let (sa, sb, sn) = (self.spectral(a), self.spectral(b), self.spectral(n));
        let c = (-spectral_distance(&[&sa, &sb], &sn)).exp();
        self.coherence.insert(key, c);
        c
    }

    pub fn len(&self) -> usize {
        self.coherence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coherence.is_empty()
    }

    pub fn clear(&mut self) {
        self.spectral.clear();
        self.coherence.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coherence_range() {
        for (a, b, n) in [(11u64, 13u64, 143u64), (17, 19, 323), (2, 100, 143), (43, 47, 2021)] {
            let c = coherence(a, b, n);
            assert!(c > 0.0 && c <= 1.0, "coherence({}, {}, {}) = {}", a, b, n, c);
        }
    }

    #[test]
    fn test_coherence_of_self_pair_is_one() {
        // S(n) + S(n) − 2S(n) vanishes.
        assert!((coherence(143, 143, 143) - 1.0).abs() < 1e-12);
        assert!((triple_coherence(77, 77, 77, 77) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_coherence_symmetric() {
        assert_eq!(coherence(11, 13, 143), coherence(13, 11, 143));
    }

    #[test]
    fn test_spectral_distance_uses_shorter_length() {
        let d = spectral_distance(&[&[1.0, 2.0, 3.0], &[1.0]], &[1.0, 1.0]);
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_coherence_cache() {
        let mut cache = CoherenceCache::new(4);
        let direct = coherence(11, 13, 143);
        assert_eq!(cache.coherence(13, 11, 143), direct);
        assert_eq!(cache.coherence(11, 13, 143), direct);
        assert_eq!(cache.len(), 1, "symmetric key shares one entry");
        assert_eq!(cache.spectral(143), spectral_vector(143));

        for a in 2..10 {
            cache.coherence(a, 143 / a, 143);
        }
        assert!(cache.len() <= 4);
        cache.clear();
        assert!(cache.is_empty());
    }
}
