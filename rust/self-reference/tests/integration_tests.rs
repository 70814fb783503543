use factoring_core::{isqrt, Algorithm};
use self_reference::{
    adaptive_strategy, create_mirror_field, detect_blind_spots, emergent_patterns, find_coherence_attractors,
    fractal_coherence_pattern, golden_ratio_recursion, inverse_spectral_map, meta_coherence, meta_coherence_field,
    recursive_mirror, score_divisors, spectral_modulated_search, synthesize_from_failures, AxiomSynthesizer,
    CoherenceField, FailureMemory, MetaObserver, RecursiveCoherence, SpectralMirror,
};
use spectral_duality::spectral_vector;

const SEMIPRIMES: [(u64, u64, u64); 6] = [
    (143, 11, 13),
    (323, 17, 19),
    (899, 29, 31),
    (2021, 43, 47),
    (4087, 61, 67),
    (8051, 83, 97),
];

#[test]
fn test_mirror_operations_stay_in_range() {
    for &(n, p, q) in &SEMIPRIMES {
        let root = isqrt(n);
        let in_range = |x: &u64| (2..=root).contains(x);
        let mut mirror = SpectralMirror::new(n);

        for x in [2, p, q, root, n] {
            assert!(in_range(&mirror.find_mirror_point(x)), "mirror of {} in {}", x, n);
            assert!(in_range(&mirror.spectral_reflection(x)), "reflection of {} in {}", x, n);
        }
        assert!(recursive_mirror(n, p, None).iter().skip(1).all(in_range));
        assert!(create_mirror_field(n, 20).values().all(in_range));
        assert!(spectral_modulated_search(n, &[p]).contains(&p));
    }
}

#[test]
fn test_inverse_map_recovers_factor() {
    for &(n, p, _) in &SEMIPRIMES {
        let matches = inverse_spectral_map(n, &spectral_vector(p));
        assert_eq!(matches.first(), Some(&p), "n = {}", n);
    }
}

#[test]
fn test_recursive_fields_stay_bounded() {
    for &(n, _, _) in SEMIPRIMES.iter().take(4) {
        let pattern = fractal_coherence_pattern(n, 5);
        let mut rc = RecursiveCoherence::new(n);
        let history = rc.iterate(pattern, 10);
        for field in history {
            assert!(field.values().all(|&c| (0.0..=1.0 + 1e-12).contains(&c)));
        }
    }

    let field: CoherenceField = (2..=20).map(|x| (x, 1.0 / x as f64)).collect();
    let m = meta_coherence(2021, 5, 15, Some(&field));
    assert!((0.0..=1.0).contains(&m));
}

#[test]
fn test_attractors_and_golden_walk() {
    for &(n, _, _) in &SEMIPRIMES {
        let root = isqrt(n);
        let positions: Vec<u64> = (2..=root).collect();
        let attractors = find_coherence_attractors(n, &positions, 20);
        assert!(!attractors.is_empty());

        let walk = golden_ratio_recursion(n, 2);
        assert_eq!(walk[0], 2);
        assert!(walk.iter().all(|&x| (2..=root).contains(&x)));
    }
}

#[test]
fn test_meta_observation_round() {
    let n = 2021;
    let mut observers = Vec::new();
    for axiom in [Algorithm::PrimeOntology, Algorithm::ObserverEffect] {
        let mut observer = MetaObserver::new(n);
        for x in 2..=20 {
            observer.record_observation(x, 0.2 + 1.0 / x as f64, axiom, n % x == 0);
        }
        observers.push(observer);
    }

    let field = meta_coherence_field(n, &observers);
    assert_eq!(field.len(), 43);
    assert!(field.values().all(|&m| (0.0..=1.0).contains(&m)));
    assert!(field[&10] > 0.0);

    let spots = detect_blind_spots(&observers[0], 0.8);
    assert!(spots.iter().all(|&x| x > 20), "2..=20 is fully observed: {:?}", spots);
    assert!(!spots.is_empty());

    let history: Vec<_> = observers.iter().flat_map(|o| o.history().iter().copied()).collect();
    assert!(emergent_patterns(n, &history).iter().all(|&x| x <= 44));
}

#[test]
fn test_synthesis_and_failures_cooperate() {
    let n = 8051;
    let mut failures = FailureMemory::default();
    let mut synthesizer = AxiomSynthesizer::new(n);
    let mut scorer = synthesizer.synthesize(&synthesizer.learn_weights());

    let mut failed = Vec::new();
    for x in (2..=30).step_by(2) {
        if n % x != 0 {
            failures.record_failure(n, x, Algorithm::SpectralDuality, scorer(x).min(1.0));
            failed.push(x);
        }
    }
    synthesizer.record_success(&[Algorithm::SpectralDuality], 83, "");

    let suggestions = synthesize_from_failures(n, &failed);
    assert!(suggestions.iter().all(|x| !failed.contains(x)));
    let adapted = adaptive_strategy(n, &failures, &failed);
    assert!(adapted.iter().all(|&x| x % 2 == 1), "even positions all failed: {:?}", adapted);
    assert_eq!(synthesizer.learn_weights().get(&Algorithm::SpectralDuality), Some(&1.0));
}

#[test]
fn test_score_divisors_matches_known_factor() {
    for &(n, p, _) in &SEMIPRIMES {
        assert_eq!(score_divisors(n).map(|(d, _)| d), Some(p));
    }
}
