//! Sampling helpers shared by the generators.

use rand::rngs::StdRng;
use rand::Rng;

/// Non-uniform random integer in `[x, y]`.
///
/// `(rand(0, a) | rand(x, y)) % (y - x + 1) + x`; larger `a` skews the
/// distribution toward a hot subset, `a == 0` degenerates to uniform.
pub(crate) fn nurand(rng: &mut StdRng, a: i64, x: i64, y: i64) -> i64 {
    debug_assert!(y >= x);
    let a = a.max(0);
    let r1 = rng.gen_range(0..=a);
    let r2 = rng.gen_range(x..=y);
    (r1 | r2) % (y - x + 1) + x
}

/// Picks an element with NURand skew; `skew` in `[0, 1]`.
pub(crate) fn skewed_pick<'a, T>(rng: &mut StdRng, items: &'a [T], skew: f64) -> &'a T {
    debug_assert!(!items.is_empty());
    let a = (skew * items.len() as f64) as i64;
    let index = nurand(rng, a, 0, items.len() as i64 - 1) as usize;
    &items[index]
}

/// Uniformly picks one element.
pub(crate) fn sample_once<'a, T>(rng: &mut StdRng, items: &'a [T]) -> &'a T {
    debug_assert!(!items.is_empty());
    &items[rng.gen_range(0..items.len())]
}

/// Bernoulli trial with probability `pct / 100`.
pub(crate) fn roll_pct(rng: &mut StdRng, pct: f64) -> bool {
    rng.gen_range(0.0..1.0) < pct / 100.0
}

/// Joint multi-home/multi-partition placement choice.
///
/// 1 = SH SP, 2 = MH MP, 3 = MH SP, 4 = SH MP.
pub(crate) fn placement_choice(rng: &mut StdRng, mh_pct: f64, mp_pct: f64) -> u8 {
    let mh = roll_pct(rng, mh_pct);
    let mp = roll_pct(rng, mp_pct);
    match (mh, mp) {
        (false, false) => 1,
        (true, true) => 2,
        (true, false) => 3,
        (false, true) => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_nurand_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let v = nurand(&mut rng, 50, 10, 20);
            assert!((10..=20).contains(&v));
        }
    }

    #[test]
    fn test_nurand_zero_skew_covers_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            seen.insert(nurand(&mut rng, 0, 0, 9));
        }
        assert_eq!(seen.len(), 10);
    }

    #[test]
    fn test_placement_choice_extremes() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(placement_choice(&mut rng, 0.0, 0.0), 1);
            assert_eq!(placement_choice(&mut rng, 100.0, 100.0), 2);
            assert_eq!(placement_choice(&mut rng, 100.0, 0.0), 3);
            assert_eq!(placement_choice(&mut rng, 0.0, 100.0), 4);
        }
    }
}
