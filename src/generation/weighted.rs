//! Weighted random selection.
//!
//! A draw in `[0, total)` selects the first candidate whose cumulative
//! weight reaches the draw. Candidates with non-positive weight at the
//! queried X never win. Hierarchical selection first chooses a category by
//! its summed weight and then a candidate inside it; a disabled category
//! contributes no weight.

use rand::Rng;

use crate::config::{DecorationEntry, SpawnEntry};

/// A candidate whose weight depends on world X
pub trait WeightedCandidate {
    fn weight_at(&self, world_x: f32) -> f32;
}

/// Weight inside `[min_x, max_x]`; zero outside, or when not a positive
/// finite number
pub fn ranged_weight(weight: f32, min_x: f32, max_x: Option<f32>, world_x: f32) -> f32 {
    if world_x < min_x || max_x.is_some_and(|max| world_x > max) {
        return 0.0;
    }
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

/// Entries without a prefab never compete
impl WeightedCandidate for SpawnEntry {
    fn weight_at(&self, world_x: f32) -> f32 {
        if self.prefab.as_str().is_empty() {
            return 0.0;
        }
        ranged_weight(self.weight, self.min_x, self.max_x, world_x)
    }
}

impl WeightedCandidate for DecorationEntry {
    fn weight_at(&self, world_x: f32) -> f32 {
        if self.tile.as_str().is_empty() {
            return 0.0;
        }
        ranged_weight(self.weight, self.min_x, self.max_x, world_x)
    }
}

/// A total that can back a uniform draw in `[0, total)`
pub fn drawable(total: f32) -> bool {
    total.is_finite() && total > 0.0
}

pub fn total_weight<T: WeightedCandidate>(candidates: &[T], world_x: f32) -> f32 {
    candidates.iter().map(|c| c.weight_at(world_x)).sum()
}

/// Index of the candidate whose cumulative interval holds `draw`
pub fn select_index<T: WeightedCandidate>(
    candidates: &[T],
    world_x: f32,
    draw: f32,
) -> Option<usize> {
    let mut accumulated = 0.0;
    for (i, candidate) in candidates.iter().enumerate() {
        let weight = candidate.weight_at(world_x);
        if weight <= 0.0 {
            continue;
        }
        accumulated += weight;
        if accumulated >= draw {
            return Some(i);
        }
    }
    None
}

pub fn select<T: WeightedCandidate>(candidates: &[T], world_x: f32, draw: f32) -> Option<&T> {
    select_index(candidates, world_x, draw).map(|i| &candidates[i])
}

/// Draw uniformly in `[0, total)` and select; `None` when the total is not
/// a positive finite number
pub fn select_with<'a, T: WeightedCandidate, R: Rng>(
    candidates: &'a [T],
    world_x: f32,
    rng: &mut R,
) -> Option<&'a T> {
    let total = total_weight(candidates, world_x);
    if !drawable(total) {
        return None;
    }
    let draw = rng.gen_range(0.0..total);
    select(candidates, world_x, draw)
}

/// One category of a hierarchical selection
#[derive(Debug)]
pub struct CategoryPool<'a, C, T> {
    pub category: C,
    pub candidates: &'a [T],
    pub enabled: bool,
}

impl<'a, C: Copy, T: WeightedCandidate> CategoryPool<'a, C, T> {
    pub fn new(category: C, candidates: &'a [T], enabled: bool) -> Self {
        Self {
            category,
            candidates,
            enabled,
        }
    }

    pub fn weight_at(&self, world_x: f32) -> f32 {
        if self.enabled {
            total_weight(self.candidates, world_x)
        } else {
            0.0
        }
    }
}

pub fn hierarchical_total<C: Copy, T: WeightedCandidate>(
    pools: &[CategoryPool<'_, C, T>],
    world_x: f32,
) -> f32 {
    pools.iter().map(|p| p.weight_at(world_x)).sum()
}

/// Category first, then candidate within it. Equivalent to selecting from
/// the flattened list of enabled candidates.
pub fn select_hierarchical<'a, C: Copy, T: WeightedCandidate>(
    pools: &[CategoryPool<'a, C, T>],
    world_x: f32,
    draw: f32,
) -> Option<(C, &'a T)> {
    let mut accumulated = 0.0;
    for pool in pools {
        let weight = pool.weight_at(world_x);
        if weight <= 0.0 {
            continue;
        }
        if accumulated + weight >= draw {
            // Float drift can push the inner draw a hair past the pool total
            let inner = (draw - accumulated).clamp(0.0, weight);
            return select(pool.candidates, world_x, inner).map(|c| (pool.category, c));
        }
        accumulated += weight;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[derive(Debug, PartialEq)]
    struct Fixed(f32);

    impl WeightedCandidate for Fixed {
        fn weight_at(&self, _world_x: f32) -> f32 {
            self.0.max(0.0)
        }
    }

    #[test]
    fn test_cumulative_intervals() {
        let c = [Fixed(1.0), Fixed(2.0), Fixed(3.0)];
        assert_eq!(select_index(&c, 0.0, 0.0), Some(0));
        assert_eq!(select_index(&c, 0.0, 0.5), Some(0));
        assert_eq!(select_index(&c, 0.0, 1.0), Some(0), "Reaching the boundary wins");
        assert_eq!(select_index(&c, 0.0, 1.5), Some(1));
        assert_eq!(select_index(&c, 0.0, 5.9), Some(2));
    }

    #[test]
    fn test_zero_weight_never_selected() {
        let c = [Fixed(0.0), Fixed(2.0), Fixed(0.0)];
        for draw in [0.0, 0.1, 1.0, 1.99] {
            assert_eq!(select_index(&c, 0.0, draw), Some(1));
        }
    }

    #[test]
    fn test_all_zero_weights_select_nothing() {
        let c = [Fixed(0.0), Fixed(-3.0)];
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        for _ in 0..100 {
            assert!(select_with(&c, 0.0, &mut rng).is_none());
        }
        assert!(select_with::<Fixed, _>(&[], 0.0, &mut rng).is_none());
    }

    #[test]
    fn test_ranged_weight() {
        assert_eq!(ranged_weight(2.0, 10.0, Some(20.0), 5.0), 0.0);
        assert_eq!(ranged_weight(2.0, 10.0, Some(20.0), 15.0), 2.0);
        assert_eq!(ranged_weight(2.0, 10.0, Some(20.0), 20.0), 2.0);
        assert_eq!(ranged_weight(2.0, 10.0, Some(20.0), 20.5), 0.0);
        assert_eq!(ranged_weight(2.0, 10.0, None, 1e9), 2.0);
        assert_eq!(ranged_weight(-1.0, 0.0, None, 5.0), 0.0);
    }

    #[test]
    fn test_spawn_entry_range() {
        let entry = SpawnEntry::new("boss", 4.0).within(100.0, Some(200.0));
        assert_eq!(entry.weight_at(50.0), 0.0);
        assert_eq!(entry.weight_at(150.0), 4.0);
    }

    #[test]
    fn test_non_finite_weights_count_as_zero() {
        assert_eq!(ranged_weight(f32::INFINITY, 0.0, None, 5.0), 0.0);
        assert_eq!(ranged_weight(f32::NAN, 0.0, None, 5.0), 0.0);
        let entries = [SpawnEntry::new("a", f32::INFINITY), SpawnEntry::new("b", 2.0)];
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        for _ in 0..50 {
            let picked = select_with(&entries, 0.0, &mut rng).map(|e| e.prefab.as_str());
            assert_eq!(picked, Some("b"));
        }
    }

    #[test]
    fn test_overflowing_total_selects_nothing() {
        let entries = [SpawnEntry::new("a", f32::MAX), SpawnEntry::new("b", f32::MAX)];
        assert!(total_weight(&entries, 0.0).is_infinite());
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(4);
        assert!(select_with(&entries, 0.0, &mut rng).is_none());
    }

    #[test]
    fn test_empty_ids_have_no_weight() {
        let spawn = [SpawnEntry::new("", 5.0), SpawnEntry::new("rock", 1.0)];
        assert_eq!(spawn[0].weight_at(0.0), 0.0);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        for _ in 0..50 {
            let picked = select_with(&spawn, 0.0, &mut rng).map(|e| e.prefab.as_str());
            assert_eq!(picked, Some("rock"), "Empty prefab must never win");
        }
        assert_eq!(DecorationEntry::new("", 3.0).weight_at(0.0), 0.0);
    }

    #[test]
    fn test_empirical_frequency() {
        let c = [Fixed(1.0), Fixed(3.0), Fixed(6.0)];
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let mut counts = [0usize; 3];
        let draws = 10_000;
        for _ in 0..draws {
            let picked = select_with(&c, 0.0, &mut rng).unwrap();
            let idx = c.iter().position(|x| std::ptr::eq(x, picked)).unwrap();
            counts[idx] += 1;
        }
        for (i, expected) in [0.1, 0.3, 0.6].iter().enumerate() {
            let freq = counts[i] as f32 / draws as f32;
            assert!(
                (freq - expected).abs() < 0.02,
                "Candidate {i}: frequency {freq} vs expected {expected}"
            );
        }
    }

    #[test]
    fn test_hierarchical_disabled_category() {
        let enemies = [Fixed(1.0)];
        let water = [Fixed(100.0)];
        let ground = [Fixed(1.0)];
        let pools = [
            CategoryPool::new('e', &enemies[..], true),
            CategoryPool::new('w', &water[..], false),
            CategoryPool::new('g', &ground[..], true),
        ];
        assert_eq!(hierarchical_total(&pools, 0.0), 2.0);
        assert_eq!(select_hierarchical(&pools, 0.0, 0.5).unwrap().0, 'e');
        assert_eq!(select_hierarchical(&pools, 0.0, 1.5).unwrap().0, 'g');
    }

    #[test]
    fn test_hierarchical_matches_flattened() {
        let a = [Fixed(1.0), Fixed(2.0)];
        let b = [Fixed(0.5), Fixed(1.5)];
        let pools = [
            CategoryPool::new(0u8, &a[..], true),
            CategoryPool::new(1u8, &b[..], true),
        ];
        let flat = [Fixed(1.0), Fixed(2.0), Fixed(0.5), Fixed(1.5)];
        let total = hierarchical_total(&pools, 0.0);
        for step in 0..100 {
            let draw = (step as f32 + 0.5) / 100.0 * total;
            let (cat, picked) = select_hierarchical(&pools, 0.0, draw).unwrap();
            let flat_idx = select_index(&flat, 0.0, draw).unwrap();
            let pool = if cat == 0 { &a[..] } else { &b[..] };
            let local = pool.iter().position(|x| std::ptr::eq(x, picked)).unwrap();
            let expected = if cat == 0 { local } else { a.len() + local };
            assert_eq!(expected, flat_idx, "Draw {draw} diverged from flattened pick");
        }
    }
}
