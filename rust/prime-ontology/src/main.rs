use prime_ontology::{score_divisors, PrimeCascade, PrimeCoordinateIndex, PrimeGeodesic};

fn main() {
    env_logger::init();

    println!("========================================");
    println!("  Axiom 1: Prime Ontology");
    println!("========================================");
    println!();

    let test_cases: Vec<(u64, u64, u64)> = vec![
        (77, 7, 11),
        (143, 11, 13),
        (323, 17, 19),
        (899, 29, 31),
        (2021, 43, 47),
        (8051, 83, 97),
    ];

    println!("--- Geodesic Walks ---");
    println!("{:>6} {:>8} {:>8} {:>8}  {}", "N", "start", "end", "pull", "path");
    let mut index = PrimeCoordinateIndex::default();
    for &(n, p, _q) in &test_cases {
        let mut geo = PrimeGeodesic::with_index(n, index);
        let start = p.saturating_sub(5).max(2);
        let path = geo.walk(start, 50);
        let end = *path.last().unwrap_or(&start);
        let pull = geo.pull(end);
        println!("{:>6} {:>8} {:>8} {:>8.4}  {:?}", n, start, end, pull, path);
        index = geo.into_index();
    }
    println!();

    println!("--- Prime Cascades ---");
    for &(n, p, q) in &test_cases {
        let cascade = PrimeCascade::new(n);
        println!("N = {:>5}: cascade({}) = {:?}, cascade({}) = {:?}", n, p, cascade.cascade(p), q, cascade.cascade(q));
    }
    println!();

    println!("--- Divisor Scoring ---");
    for &(n, p, _q) in &test_cases {
        match score_divisors(n) {
            Some((d, pull)) => {
                let check = if d == p { "OK" } else { "MISS" };
                println!("N = {:>5}: best divisor {} (pull {:.4}) {}", n, d, pull, check);
            }
            None => println!("N = {:>5}: no divisor below the root", n),
        }
    }
    println!();

    let stats = index.cache_stats();
    println!(
        "Index cache: {} hits, {} misses ({:.1}% hit rate), {} entries",
        stats.hits,
        stats.misses,
        stats.hit_rate * 100.0,
        stats.total_entries()
    );
}
