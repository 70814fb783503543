use factoring_core::isqrt;
use observer_effect::{
    collapse_wavefunction, entangle_positions, generate_superposition, gradient_ascent, harmonic_amplify,
    harmonic_jump, multi_path_search, resonance_guided_search, score_divisors, CachedObserver, MultiScaleObserver,
    Observe, ObserverCache, QuantumTunnel, ResonanceMemory, SpectralFolder,
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
fn test_observations_are_non_negative_and_bounded() {
    for &(n, p, _) in &SEMIPRIMES {
        let mut observer = MultiScaleObserver::new(n);
        let max_weight: f64 = observer
            .scales()
            .as_array()
            .iter()
            .map(|&s| 1.0 / (1.0 + (s as f64).ln()))
            .sum();
        for x in [2, p, isqrt(n)] {
            let o = observer.observe(x);
            assert!(o >= 0.0 && o <= max_weight + 1e-12, "O({}) for {} = {}", x, n, o);
        }
        assert_eq!(observer.observe(isqrt(n) + 1), 0.0);
    }
}

#[test]
fn test_cached_observer_agrees_with_plain_observer() {
    for &(n, p, _) in SEMIPRIMES.iter().take(3) {
        let mut cached = CachedObserver::new(n);
        let mut plain = MultiScaleObserver::new(n);
        for x in [2, p, isqrt(n)] {
            assert!((cached.observe(x) - plain.observe(x)).abs() < 1e-12);
            assert!((cached.gradient(x, 1) - plain.gradient(x, 1)).abs() < 1e-12);
        }
    }
}

#[test]
fn test_all_positions_stay_in_range() {
    for &(n, p, _) in &SEMIPRIMES {
        let root = isqrt(n);
        let in_range = |x: &u64| (2..=root).contains(x);

        assert!(generate_superposition(n, &[p, n]).iter().all(in_range));
        assert!(harmonic_amplify(n, p).iter().all(in_range));
        assert!(SpectralFolder::new(n).points().iter().all(in_range));
        assert!(QuantumTunnel::new(n).tunnel_sequence(2, 5).iter().all(in_range));
        for stuck in 0..8 {
            assert!(in_range(&harmonic_jump(n, p, stuck)));
        }
        for x in entangle_positions(n, p, 5) {
            assert!(x <= root, "entangled {} beyond root of {}", x, n);
        }
    }
}

#[test]
fn test_collapse_and_ascent() {
    let n = 2021;
    let mut observer = CachedObserver::new(n);
    let candidates = generate_superposition(n, &[]);
    let collapsed = collapse_wavefunction(&mut observer, &candidates, 3);
    assert!(!collapsed.is_empty());
    assert!(collapsed.windows(2).all(|w| w[0].1 >= w[1].1));

    let path = gradient_ascent(&mut observer, 10, 30, 1e-6);
    assert_eq!(path[0], 10);
    assert!(path.iter().all(|&x| (2..=44).contains(&x)));

    let endpoints = multi_path_search(&mut observer, &[5, 15, 25, 35], 4);
    assert!(!endpoints.is_empty() && endpoints.len() <= 4);
}

#[test]
fn test_memory_transfers_between_numbers() {
    let mut memory = ResonanceMemory::default();
    memory.record(3, 5, 143, 0.9, Some(11));
    // Same scale: the recorded factor is predicted directly.
    assert_eq!(resonance_guided_search(143, &memory, 20), Some(11));
    let predictions = memory.predict(1_000_000, 20);
    assert!(predictions.iter().all(|&(x, w)| (2..=1000).contains(&x) && w > 0.0));
}

#[test]
fn test_optimized_cache_is_bounded_below() {
    for &(n, _, _) in &SEMIPRIMES {
        assert!(ObserverCache::create_optimized(n).cache_size() >= 1000);
    }
}

#[test]
fn test_score_divisors_matches_known_factor() {
    for &(n, p, _) in &SEMIPRIMES {
        assert_eq!(score_divisors(n).map(|(d, _)| d), Some(p));
    }
}
