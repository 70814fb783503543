//! Gradient navigation through the coherence field, with harmonic jumps out of local optima.

use crate::observer::Observe;
use factoring_core::isqrt;
use fibonacci_flow::{fib, GOLDEN_ANGLE, PHI};
use std::collections::BTreeSet;
use std::f64::consts::PI;

pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Gradient of the observer's coherence at `x`.
pub fn coherence_gradient<O: Observe + ?Sized>(observer: &mut O, x: u64, delta: u64) -> f64 {
    observer.gradient(x, delta)
}

fn step_size(root: u64, step: usize) -> u64 {
    ((root as f64 * 0.02 / (step + 1) as f64) as u64).max(1)
}

/// Climb the unit-step gradient from `start` with shrinking steps.
///
/// Stops when the gradient flattens below `tolerance`, a step makes no
/// progress, or a divisor of `n` is reached. The path includes `start`.
pub fn gradient_ascent<O: Observe + ?Sized>(
    observer: &mut O,
    start: u64,
    max_steps: usize,
    tolerance: f64,
) -> Vec<u64> {
    let (n, root) = (observer.n(), observer.root());
    let mut path = vec![start];
    let mut current = start;

    for step in 0..max_steps {
        let gradient = observer.gradient(current, 1);
        if gradient.abs() < tolerance {
            break;
        }
        let size = step_size(root, step);
        let next = if gradient > 0.0 {
            (current + size).min(root)
        } else {
            current.saturating_sub(size).max(2)
        };
        if next == current {
            break;
        }
        current = next;
        path.push(current);
        if n % current == 0 {
            break;
        }
    }
    path
}

/// Endpoints of gradient ascents from the first `max_paths` starts with
/// their coherence, strongest first and without repeats.
pub fn multi_path_search<O: Observe + ?Sized>(
    observer: &mut O,
    starts: &[u64],
    max_paths: usize,
) -> Vec<(u64, f64)> {
    let mut endpoints: Vec<(u64, f64)> = Vec::new();
    for &start in starts.iter().take(max_paths) {
        let path = gradient_ascent(observer, start, 50, DEFAULT_TOLERANCE);
        if let Some(&end) = path.last() {
            endpoints.push((end, observer.observe(end)));
        }
    }
    endpoints.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut seen = BTreeSet::new();
    endpoints.retain(|&(x, _)| seen.insert(x));
    endpoints
}

/// Escape move chosen by `stuck_count mod 4`: ×φ, ÷φ, `+F(min(stuck + 3, 20))`
/// or a golden-angle swing; clamped to `[2, √n]`.
pub fn harmonic_jump(n: u64, current: u64, stuck_count: u64) -> u64 {
    let root = isqrt(n);
    let jumped = match stuck_count % 4 {
        0 => (current as f64 * PHI) as i128,
        1 => (current as f64 / PHI) as i128,
        2 => {
            let index = (stuck_count + 3).min(20) as i64;
            current as i128 + fib(index).map_or(0, |f| f as i128)
        }
        _ => {
            let angle = (stuck_count as f64 * GOLDEN_ANGLE) % (2.0 * PI);
            let radius = (root / 4).min(stuck_count.saturating_mul(10));
            (current as f64 + radius as f64 * angle.cos()) as i128
        }
    };
    jumped.min(root as i128).max(2) as u64
}

/// Sampled local maxima of the observation, each refined within one sampling step.
pub fn find_coherence_peaks<O: Observe + ?Sized>(observer: &mut O, resolution: u64) -> Vec<u64> {
    let root = observer.root();
    let step = (root / resolution.max(1)).max(1);

    let mut peaks = Vec::new();
    let mut prev = 0.0;
    let mut current = (2u64, observer.observe(2));

    let mut x = 3;
    while x <= root {
        let next = observer.observe(x);
        if current.1 > prev && current.1 > next {
            let mut refined = current.0;
            let mut best = observer.observe(refined);
            let lo = current.0.saturating_sub(step).max(2);
            let hi = (current.0 + step).min(root);
            for probe in lo..=hi {
                let c = observer.observe(probe);
                if c > best {
                    refined = probe;
                    best = c;
                }
            }
            peaks.push(refined);
        }
        prev = current.1;
        current = (x, next);
        x += step;
    }
    peaks
}

/// Short gradient ascents chained by harmonic jumps whenever the walk stalls
/// or revisits a position. Returns the divisor reached and every position visited.
pub(crate) fn navigate<O: Observe + ?Sized>(
    observer: &mut O,
    start: u64,
    max_iterations: usize,
) -> (Option<u64>, Vec<u64>) {
    let n = observer.n();
    let is_factor = |x: u64| x > 1 && n % x == 0;

    let mut current = start;
    let mut stuck_count = 0u64;
    let mut visited = BTreeSet::new();
    let mut path = vec![start];

    for _ in 0..max_iterations {
        if is_factor(current) {
            return (Some(current), path);
        }
        visited.insert(current);

        let ascent = gradient_ascent(observer, current, 10, DEFAULT_TOLERANCE);
        let mut next = ascent.last().copied().unwrap_or(current);
        path.extend(ascent.iter().skip(1));
        if is_factor(next) {
            return (Some(next), path);
        }

        if next == current || visited.contains(&next) {
            stuck_count += 1;
            next = harmonic_jump(n, current, stuck_count);
            path.push(next);
            log::trace!("navigation stuck at {}, jumped to {}", current, next);
        } else {
            stuck_count = 0;
        }
        current = next;
    }
    (None, path)
}

/// Navigate from `start` toward a divisor of `n` within `max_iterations` rounds.
pub fn navigate_to_factor<O: Observe + ?Sized>(
    observer: &mut O,
    start: u64,
    max_iterations: usize,
) -> Option<u64> {
    navigate(observer, start, max_iterations).0
}

/// Gradient ascents from `num_lines` golden-spiral starting points; only
/// paths that moved are kept.
pub fn coherence_flow_lines<O: Observe + ?Sized>(observer: &mut O, num_lines: usize) -> Vec<Vec<u64>> {
    let root = observer.root();
    let mut lines = Vec::new();
    let mut angle = 0.0f64;

    for i in 0..num_lines {
        let radius = root as f64 * (i + 1) as f64 / (num_lines + 1) as f64;
        let x = ((root / 2) as f64 + radius * angle.cos()) as i64;
        let start = x.clamp(2, root.max(2) as i64) as u64;
        let path = gradient_ascent(observer, start, 50, DEFAULT_TOLERANCE);
        if path.len() > 1 {
            lines.push(path);
        }
        angle += GOLDEN_ANGLE;
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::MultiScaleObserver;

    /// Coherence peaked at a fixed position, for predictable navigation.
    struct Peak {
        n: u64,
        peak: u64,
    }

    impl Observe for Peak {
        fn n(&self) -> u64 {
            self.n
        }

        fn root(&self) -> u64 {
            isqrt(self.n)
        }

        fn observe(&mut self, x: u64) -> f64 {
            1.0 / (1.0 + x.abs_diff(self.peak) as f64)
        }
    }

    #[test]
    fn test_gradient_ascent_reaches_divisor() {
        // 8051 = 83 * 97; the peak sits on the factor.
        let mut observer = Peak { n: 8051, peak: 83 };
        let path = gradient_ascent(&mut observer, 60, 50, DEFAULT_TOLERANCE);
        assert_eq!(path[0], 60);
        assert_eq!(*path.last().unwrap(), 83);
        assert!(path.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_gradient_ascent_flat_field() {
        let mut observer = Peak { n: 8051, peak: 83 };
        assert_eq!(gradient_ascent(&mut observer, 1, 50, DEFAULT_TOLERANCE), vec![1]);
        assert_eq!(gradient_ascent(&mut observer, 60, 50, 10.0), vec![60]);
    }

    #[test]
    fn test_multi_path_search_dedups() {
        let mut observer = Peak { n: 8051, peak: 83 };
        let endpoints = multi_path_search(&mut observer, &[50, 60, 70, 80], 10);
        assert_eq!(endpoints[0].0, 83);
        let unique: BTreeSet<u64> = endpoints.iter().map(|e| e.0).collect();
        assert_eq!(unique.len(), endpoints.len());
    }

    #[test]
    fn test_harmonic_jump_strategies() {
        let n = 1_000_000; // root 1000
        assert_eq!(harmonic_jump(n, 100, 4), 161);
        assert_eq!(harmonic_jump(n, 100, 1), 61);
        // F(min(2 + 3, 20)) = F(5) = 5
        assert_eq!(harmonic_jump(n, 100, 2), 105);
        let swing = harmonic_jump(n, 100, 3);
        assert!((70..=130).contains(&swing));
        assert_eq!(harmonic_jump(n, 999, 0), 1000, "clamped to the root");
        assert_eq!(harmonic_jump(n, 2, 1), 2, "clamped to 2");
    }

    #[test]
    fn test_find_coherence_peaks() {
        let mut observer = Peak { n: 10_000, peak: 37 };
        assert_eq!(find_coherence_peaks(&mut observer, 100), vec![37]);
        let mut observer = Peak { n: 10_000, peak: 2 };
        assert_eq!(find_coherence_peaks(&mut observer, 100), vec![2]);
    }

    #[test]
    fn test_navigate_to_factor() {
        let mut observer = Peak { n: 8051, peak: 83 };
        assert_eq!(navigate_to_factor(&mut observer, 40, 100), Some(83));
        assert_eq!(navigate_to_factor(&mut observer, 83, 100), Some(83));

        let mut prime = Peak { n: 10_007, peak: 50 };
        let (found, path) = navigate(&mut prime, 40, 20);
        assert_eq!(found, None);
        assert!(path.iter().all(|&x| x == 40 || (2..=100).contains(&x)));
    }

    #[test]
    fn test_flow_lines_move() {
        let mut observer = Peak { n: 10_000, peak: 50 };
        let lines = coherence_flow_lines(&mut observer, 8);
        assert!(!lines.is_empty());
        assert!(lines.iter().all(|l| l.len() > 1));
    }

    #[test]
    fn test_navigation_with_multi_scale_observer() {
        let mut observer = MultiScaleObserver::new(143);
        let path = gradient_ascent(&mut observer, 5, 20, DEFAULT_TOLERANCE);
        assert!(path.iter().all(|&x| (2..=11).contains(&x)));
        if let Some(f) = navigate_to_factor(&mut observer, 3, 30) {
            assert_eq!(143 % f, 0);
        }
    }
}
