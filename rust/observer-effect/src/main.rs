use observer_effect::{
    find_coherence_peaks, generate_superposition, harmonic_jump, observer_factor, score_divisors,
    CachedObserver, MultiScaleObserver, Observe, QuantumTunnel, ResonanceMemory, SpectralFolder,
};

fn main() {
    env_logger::init();

    println!("========================================");
    println!("  Axiom 4: Observer Effect");
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

    println!("--- Multi-Scale Observation ---");
    println!("{:>6} {:>18} {:>10} {:>10} {:>10}", "N", "scales", "O(p)", "O(p-1)", "O(p+1)");
    for &(n, p, _) in &test_cases {
        let mut observer = MultiScaleObserver::new(n);
        let scales = observer.scales().as_array();
        println!(
            "{:>6} {:>18} {:>10.6} {:>10.6} {:>10.6}",
            n,
            format!("{:?}", scales),
            observer.observe(p),
            observer.observe(p - 1),
            observer.observe(p + 1)
        );
    }
    println!();

    println!("--- Wavefunction Collapse ---");
    for &(n, p, _) in test_cases.iter().take(4) {
        let mut observer = CachedObserver::new(n);
        let candidates = generate_superposition(n, &[]);
        let collapsed = observer.collapse_wavefunction(&candidates, 5);
        let rank = collapsed.iter().position(|&(x, _)| x == p);
        let top: Vec<u64> = collapsed.iter().take(5).map(|&(x, _)| x).collect();
        println!(
            "N = {:>5}: {} candidates -> top {:?}, p at rank {}",
            n,
            candidates.len(),
            top,
            rank.map_or("-".to_string(), |r| (r + 1).to_string())
        );
    }
    println!();

    println!("--- Navigation Tools ---");
    let n = 8051;
    let mut observer = CachedObserver::new(n);
    println!("Coherence peaks of {}: {:?}", n, find_coherence_peaks(&mut observer, 30));
    let jumps: Vec<u64> = (1..=4).map(|s| harmonic_jump(n, 40, s)).collect();
    println!("Harmonic jumps from 40: {:?}", jumps);
    println!("Tunnel from 20: {:?}", QuantumTunnel::new(n).tunnel_sequence(20, 5));
    println!("Folding points: {:?}", SpectralFolder::new(n).points());
    println!();

    println!("--- Divisor Scoring ---");
    for &(n, p, _) in &test_cases {
        if let Some((d, score)) = score_divisors(n) {
            let check = if d == p { "OK" } else { "MISS" };
            println!("N = {:>5}: best divisor {} (observation {:.6}) {}", n, d, score, check);
        }
    }
    println!();

    println!("--- Observer Factorization ---");
    let mut memory = ResonanceMemory::default();
    for &(n, p, _) in &test_cases {
        let found = observer_factor(n, Some(&mut memory));
        let check = if found == Some(p) { "OK" } else { "MISS" };
        println!("N = {:>5}: {:?} {}", n, found, check);
    }
    println!(
        "Resonance memory: {} patterns, {} successes, success rate {:.2}",
        memory.pattern_count(),
        memory.successes().count(),
        memory.success_rate()
    );

    let stats = observer.cache_stats();
    println!(
        "Observer cache (8051): {} hits, {} misses ({:.1}% hit rate), {} entries",
        stats.hits,
        stats.misses,
        stats.hit_rate * 100.0,
        stats.total_entries()
    );
}
