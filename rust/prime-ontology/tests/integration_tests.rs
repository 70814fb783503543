use factoring_core::{divisors_up_to_sqrt, is_prime, isqrt};
use prime_ontology::{score_divisors, PrimeCascade, PrimeCoordinateIndex, PrimeGeodesic};

#[test]
fn test_divisor_pull_dominates_non_divisors() {
    // Every divisor carries the flat bonus; no non-divisor can reach it.
    let mut index = PrimeCoordinateIndex::default();
    for n in [143u64, 323, 899, 2021, 4087, 8051] {
        for x in 2..=isqrt(n) {
            let pull = index.pull(x, n);
            if n % x == 0 {
                assert!(pull >= 2.0, "pull({}, {}) = {}", x, n, pull);
            } else {
                assert!(pull < 2.0, "pull({}, {}) = {} for a non-divisor", x, n, pull);
            }
        }
    }
}

#[test]
fn test_walk_paths_are_valid_positions() {
    for n in [91u64, 143, 323, 899] {
        let root = isqrt(n);
        let mut geo = PrimeGeodesic::new(n);
        let path = geo.walk(2, 30);
        assert!(path.len() <= 31);
        for pos in &path {
            assert!((2..=root).contains(pos), "{} outside [2, {}] for n = {}", pos, root, n);
        }
        if let Some(&end) = path.last() {
            if n % end == 0 {
                assert!(is_prime(end));
            }
        }
    }
}

#[test]
fn test_cascade_members_are_prime() {
    let cascade = PrimeCascade::new(100_000);
    for p in [3u64, 5, 11, 29, 41, 89] {
        for q in cascade.cascade(p) {
            assert!(is_prime(q), "cascade({}) produced composite {}", p, q);
        }
    }
}

#[test]
fn test_score_matches_known_factor() {
    for (n, factors) in [(15u64, vec![3u64, 5]), (91, vec![7, 13]), (4181, vec![37, 113])] {
        let (d, _) = score_divisors(n).unwrap();
        assert!(factors.contains(&d));
        assert!(divisors_up_to_sqrt(n).contains(&d));
    }
}

#[test]
fn test_cache_stats_serialize() {
    let mut index = PrimeCoordinateIndex::create_optimized(323);
    index.pull(17, 323);
    let json = serde_json::to_value(index.cache_stats()).unwrap();
    assert!(json["entries"]["coordinates"].as_u64().unwrap() > 0);
    assert_eq!(json["entries"]["pull_values"], 1);
}
