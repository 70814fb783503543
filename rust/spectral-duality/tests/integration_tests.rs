use factoring_core::{divisors_up_to_sqrt, isqrt};
use spectral_duality::{
    coherence, fold_energy, interference_extrema, score_divisors, spectral_vector, CoherenceCache,
    FoldTopology, SpectralSignatureCache, SPECTRAL_LEN,
};

const SEMIPRIMES: [(u64, u64, u64); 6] = [
    (143, 11, 13),
    (323, 17, 19),
    (899, 29, 31),
    (2021, 43, 47),
    (4087, 61, 67),
    (8051, 83, 97),
];

#[test]
fn test_spectral_vectors_have_fixed_length() {
    for &(n, p, q) in &SEMIPRIMES {
        for x in [n, p, q] {
            assert_eq!(spectral_vector(x).len(), SPECTRAL_LEN);
        }
    }
}

#[test]
fn test_coherence_in_unit_interval() {
    for &(n, p, q) in &SEMIPRIMES {
        for x in 2..=isqrt(n) {
            let c = coherence(x, n / x, n);
            assert!(c > 0.0 && c <= 1.0, "coherence({}, {}, {}) = {}", x, n / x, n, c);
        }
        assert!(coherence(p, q, n) > 0.0);
    }
}

#[test]
fn test_fold_energy_is_log_of_coherence_on_divisors() {
    for &(n, p, q) in &SEMIPRIMES {
        let e = fold_energy(n, p);
        let c = coherence(p, q, n);
        assert!((c - (-e).exp()).abs() < 1e-12, "n = {}", n);
        assert_eq!(fold_energy(n, n + 1), f64::INFINITY);
    }
}

#[test]
fn test_caches_agree_with_direct_computation() {
    let mut signatures = SpectralSignatureCache::default();
    let mut plain = CoherenceCache::default();
    for &(n, _, _) in &SEMIPRIMES {
        for d in divisors_up_to_sqrt(n) {
            let direct = coherence(d, n / d, n);
            assert!((signatures.coherence(d, n / d, n) - direct).abs() < 1e-12);
            assert!((plain.coherence(n / d, d, n) - direct).abs() < 1e-12);
            assert!((signatures.fold_energy(n, d) - fold_energy(n, d)).abs() < 1e-12);
        }
    }
    assert!(signatures.cache_stats().hits > 0);
}

#[test]
fn test_score_divisors_finds_factor() {
    for &(n, p, _) in &SEMIPRIMES {
        assert_eq!(score_divisors(n).map(|(d, _)| d), Some(p), "n = {}", n);
    }
}

#[test]
fn test_landscape_positions_within_root() {
    for &(n, _, _) in &SEMIPRIMES {
        let root = isqrt(n);
        assert!(interference_extrema(n, 30).iter().all(|&x| (2..=root).contains(&x)));
        let topology = FoldTopology::new(n);
        for &p in topology.points() {
            assert!((3..root).contains(&p));
            for &(q, w) in topology.connections(p) {
                assert!(topology.points().contains(&q));
                assert!(w > 0.0 && w <= 1.0);
            }
        }
    }
}
