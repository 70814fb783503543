use fibonacci_flow::{
    fib, fib_vortices, golden_spiral_positions, score_divisors, FibonacciEntanglement,
    FibonacciResonanceMap, PHI,
};

fn main() {
    env_logger::init();

    println!("========================================");
    println!("  Axiom 2: Fibonacci Flow");
    println!("========================================");
    println!();
    println!("phi = {:.15}", PHI);
    let first: Vec<String> = (0..15)
        .filter_map(|k| fib(k).ok())
        .map(|f| f.to_string())
        .collect();
    println!("F(0..15) = {}", first.join(", "));
    println!();

    let test_cases: Vec<(u64, u64, u64)> = vec![
        (143, 11, 13),
        (323, 17, 19),
        (2047, 23, 89),
        (4181, 37, 113),
        (6765, 3, 2255),
        (89 * 233, 89, 233),
    ];

    println!("--- Vortices and Entanglement ---");
    println!("{:>7} {:>9} {:>8} {:>10}  {}", "N", "vortices", "spiral", "alignment", "double");
    let mut map = FibonacciResonanceMap::default();
    for &(n, p, q) in &test_cases {
        let plain = fib_vortices(n, None);
        let mapped = fib_vortices(n, Some(&mut map));
        let spiral = golden_spiral_positions(n, 20);
        let entanglement = FibonacciEntanglement::new(n);
        let doubles = entanglement.detect_double();
        println!(
            "{:>7} {:>4}/{:<4} {:>8} {:>10.4}  {:?}",
            n,
            plain.len(),
            mapped.len(),
            spiral.len(),
            entanglement.fibonacci_alignment_score(p, q),
            doubles.first()
        );
    }
    println!();

    println!("--- Divisor Scoring ---");
    for &(n, p, _q) in &test_cases {
        if let Some((d, score)) = score_divisors(n) {
            let check = if d == p { "OK" } else { "other divisor" };
            println!("N = {:>6}: best divisor {:>4} (score {:.4}) {}", n, d, score, check);
        }
    }
    println!();

    let stats = map.cache_stats();
    println!(
        "Resonance map: {} hits, {} misses ({:.1}% hit rate)",
        stats.hits,
        stats.misses,
        stats.hit_rate * 100.0
    );
}
