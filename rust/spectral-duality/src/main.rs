use spectral_duality::{
    coherence, fold_energy, interference_extrema, resonance_strength, score_divisors,
    sharp_fold_candidates, spectral_vector, FoldTopology, SpectralSignatureCache,
};

fn main() {
    env_logger::init();

    println!("========================================");
    println!("  Axiom 3: Spectral Duality");
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

    println!("--- Spectral Vectors ---");
    for &(n, _, _) in test_cases.iter().take(2) {
        let s = spectral_vector(n);
        let head: Vec<String> = s.iter().take(6).map(|x| format!("{:.3}", x)).collect();
        println!("S({}) = [{}, ...] ({} features)", n, head.join(", "), s.len());
    }
    println!();

    println!("--- Coherence and Fold Energy ---");
    println!("{:>6} {:>10} {:>10} {:>12} {:>10}", "N", "C(p,q,N)", "C(2,N/2,N)", "E(p)", "R(p,q)");
    for &(n, p, q) in &test_cases {
        println!(
            "{:>6} {:>10.6} {:>10.6} {:>12.6} {:>10.4}",
            n,
            coherence(p, q, n),
            coherence(2, n / 2, n),
            fold_energy(n, p),
            resonance_strength(p, q, n)
        );
    }
    println!();

    println!("--- Landscape ---");
    for &(n, p, _) in &test_cases {
        let folds = sharp_fold_candidates(n, 25);
        let extrema = interference_extrema(n, 30);
        let topology = FoldTopology::new(n);
        println!(
            "N = {:>5}: p={} in sharp folds: {}, in extrema: {}, {} minima in {} components",
            n,
            p,
            folds.contains(&p),
            extrema.contains(&p),
            topology.points().len(),
            topology.components().len()
        );
    }
    println!();

    println!("--- Divisor Scoring ---");
    for &(n, p, _) in &test_cases {
        if let Some((d, c)) = score_divisors(n) {
            let check = if d == p { "OK" } else { "MISS" };
            println!("N = {:>5}: best divisor {} (coherence {:.6}) {}", n, d, c, check);
        }
    }
    println!();

    let mut cache = SpectralSignatureCache::create_optimized(8051);
    let analysis = cache.analyze(8051);
    println!("Analysis of 8051: sharp folds {:?}", analysis.sharp_folds);
    println!("                  extrema {:?}", analysis.interference_extrema);
    let stats = analysis.cache_stats;
    println!(
        "Signature cache: {} hits, {} misses ({:.1}% hit rate), {} entries",
        stats.hits,
        stats.misses,
        stats.hit_rate * 100.0,
        stats.total_entries()
    );
}
