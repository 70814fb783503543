use factoring_core::{isqrt, Algorithm};
use observer_effect::{MultiScaleObserver, Observe};
use self_reference::{
    adaptive_strategy, analyze_failure_patterns, cross_axiom_resonance, detect_blind_spots, find_coherence_attractors,
    golden_ratio_recursion, recursive_fixed_point_search, recursive_mirror, score_divisors, AxiomPerformanceProfile,
    AxiomSynthesizer, FailureMemory, MetaObserver, SpectralMirror,
};
use spectral_duality::coherence;
use std::collections::BTreeMap;
use std::time::Instant;

fn main() {
    env_logger::init();

    println!("========================================");
    println!("  Axiom 5: Self-Reference");
    println!("========================================");
    println!();

    let test_cases: Vec<(u64, u64, u64)> = vec![
        (143, 11, 13),
        (323, 17, 19),
        (899, 29, 31),
        (2021, 43, 47),
        (4087, 61, 67),
        (8051, 83, 97),
    ];

    println!("--- Spectral Mirror ---");
    println!("{:>6} {:>6} {:>8} {:>10} {:>24}", "N", "p", "M(p)", "R(p)", "recursive mirror of 2");
    for &(n, p, _) in &test_cases {
        let mut mirror = SpectralMirror::new(n);
        println!(
            "{:>6} {:>6} {:>8} {:>10} {:>24}",
            n,
            p,
            mirror.find_mirror_point(p),
            mirror.spectral_reflection(p),
            format!("{:?}", recursive_mirror(n, 2, Some(6)))
        );
    }
    println!();

    println!("--- Recursive Coherence ---");
    for &(n, p, _) in test_cases.iter().take(4) {
        let root = isqrt(n);
        let positions: Vec<u64> = (2..=root).collect();
        let attractors = find_coherence_attractors(n, &positions, 20);
        let fixed = recursive_fixed_point_search(n);
        println!(
            "N = {:>5}: {} attractors (p {}), fixed points {:?}",
            n,
            attractors.len(),
            if attractors.contains(&p) { "included" } else { "absent" },
            fixed
        );
    }
    println!("Golden recursion from 10 in 10000: {:?}", golden_ratio_recursion(10_000, 10));
    println!();

    println!("--- Meta Observation ---");
    let n = 2021;
    let mut meta = MetaObserver::new(n);
    let mut profile = AxiomPerformanceProfile::new();
    let mut observer = MultiScaleObserver::new(n);
    for x in (2..=isqrt(n)).step_by(3) {
        let start = Instant::now();
        let found = n % x == 0;
        meta.record_observation(x, coherence(x, x, n), Algorithm::SpectralDuality, found);
        meta.record_observation(x + 1, observer.observe(x + 1), Algorithm::ObserverEffect, n % (x + 1) == 0);
        profile.record_attempt(Algorithm::SpectralDuality, n, found, start.elapsed());
    }
    let patterns = meta.detect_patterns();
    println!("Observations: {}", meta.history().len());
    println!("Coherence peaks: {:?}", patterns.coherence_peaks);
    println!("Blind spots: {:?}", detect_blind_spots(&meta, 0.8));
    println!("Best axiom for {}: {}", n, profile.best_axiom(n));
    println!();

    println!("--- Axiom Synthesis ---");
    let mut synthesizer = AxiomSynthesizer::new(n);
    synthesizer.record_success(&[Algorithm::PrimeOntology, Algorithm::SpectralDuality], 43, "coherent prime");
    synthesizer.record_success(&[Algorithm::ObserverEffect], 43, "observer peak");
    let weights = synthesizer.learn_weights();
    println!("Learned weights: {:?}", weights);
    let mut scorer = synthesizer.synthesize(&weights);
    println!("Hybrid score at 43: {:.6}, at 42: {:.6}", scorer(43), scorer(42));
    let results: BTreeMap<Algorithm, Vec<u64>> = [
        (Algorithm::PrimeOntology, vec![41, 43]),
        (Algorithm::SpectralDuality, vec![43]),
        (Algorithm::ObserverEffect, vec![42, 44]),
    ]
    .into_iter()
    .collect();
    println!("Cross-axiom resonance: {:?}", cross_axiom_resonance(n, &results));
    println!();

    println!("--- Failure Analysis ---");
    let mut failures = FailureMemory::default();
    for x in (2..30).step_by(2) {
        failures.record_failure(n, x, Algorithm::PrimeOntology, coherence(x, x, n));
    }
    println!("Dead ends: {:?}", failures.identify_dead_ends(5));
    for (key, rate) in analyze_failure_patterns(&failures) {
        println!("  {:<32} {:.3}", key, rate);
    }
    println!("Adapted candidates: {:?}", adaptive_strategy(n, &failures, &[4, 8, 12, 16, 31, 43]));
    println!();

    println!("--- Divisor Scoring ---");
    for &(n, p, _) in &test_cases {
        if let Some((d, score)) = score_divisors(n) {
            let check = if d == p { "OK" } else { "MISS" };
            println!("N = {:>5}: best divisor {} (score {:.6}) {}", n, d, score, check);
        }
    }
}
