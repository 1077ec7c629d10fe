use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    cell::{Cell, ItemKind},
    engagement::EngagementMetrics,
};

pub const ITEM_WEIGHT_RANGE: (f32, f32) = (0.175, 0.3);
pub const PIT_WEIGHT_RANGE: (f32, f32) = (0.25, 0.5);
const ITEM_WEIGHT_BASE: f32 = 0.75;
const ENGAGEMENT_DAMPING: f32 = 1.1;

/// How non-path interior cells are filled, derived from the engagement of
/// the previous episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ContentWeights {
    /// No engagement yet: every cell is a pit or an item, even odds.
    Fallback,
    /// Items with probability `item`, pits with `pit`, floor otherwise.
    Weighted { item: f32, pit: f32 },
}

impl ContentWeights {
    /// Derives the weights from last episode's metrics. Negative inputs count as zero.
    pub fn from_engagement(metrics: &EngagementMetrics) -> Self {
        let metrics = metrics.sanitized();
        let total = metrics.score();
        if total == 0.0 {
            return ContentWeights::Fallback;
        }

        let scale = (total + 1.0) * ENGAGEMENT_DAMPING;
        let item = (ITEM_WEIGHT_BASE - metrics.item_pickups / scale)
            .clamp(ITEM_WEIGHT_RANGE.0, ITEM_WEIGHT_RANGE.1);
        let pit = (metrics.exploration / scale).clamp(PIT_WEIGHT_RANGE.0, PIT_WEIGHT_RANGE.1);

        // The ranges cap item + pit at 0.8; keep the sum within 1 regardless.
        let sum = item + pit;
        let (item, pit) = if sum > 1.0 {
            (item / sum, pit / sum)
        } else {
            (item, pit)
        };
        ContentWeights::Weighted { item, pit }
    }

    pub fn item_weight(&self) -> f32 {
        match self {
            ContentWeights::Fallback => 0.5,
            ContentWeights::Weighted { item, .. } => *item,
        }
    }

    pub fn pit_weight(&self) -> f32 {
        match self {
            ContentWeights::Fallback => 0.5,
            ContentWeights::Weighted { pit, .. } => *pit,
        }
    }

    pub fn floor_weight(&self) -> f32 {
        (1.0 - self.item_weight() - self.pit_weight()).max(0.0)
    }

    /// Picks the content of one cell. Items carry `item_value`.
    pub fn sample<R: Rng>(&self, rng: &mut R, item_value: u32) -> Cell {
        match *self {
            ContentWeights::Fallback => {
                if rng.random_bool(0.5) {
                    random_item(rng, item_value)
                } else {
                    Cell::Pit
                }
            }
            ContentWeights::Weighted { item, pit } => {
                let roll: f32 = rng.random();
                if roll < item {
                    random_item(rng, item_value)
                } else if roll < item + pit {
                    Cell::Pit
                } else {
                    Cell::Floor { explored: false }
                }
            }
        }
    }
}

/// Coin, key or bomb from a single uniform draw.
pub fn random_item<R: Rng>(rng: &mut R, value: u32) -> Cell {
    Cell::Item {
        kind: ItemKind::from_uniform(rng.random()),
        value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::{SeedableRng, rngs::StdRng};

    fn weights(reward: f32, exploration: f32, pickups: f32) -> ContentWeights {
        ContentWeights::from_engagement(&EngagementMetrics::new(reward, exploration, pickups))
    }

    #[test]
    fn test_zero_engagement_is_fallback() {
        assert_eq!(weights(0.0, 0.0, 0.0), ContentWeights::Fallback);
        // Negative telemetry is treated as none at all.
        assert_eq!(weights(-3.0, 0.0, -1.0), ContentWeights::Fallback);
    }

    #[test]
    fn test_formula_interior_values() {
        // total = 10, scale = 12.1
        let w = weights(4.0, 4.0, 2.0);
        // 0.75 - 2 / 12.1 = 0.585, above the item ceiling.
        assert_approx_eq!(w.item_weight(), 0.3);
        assert_approx_eq!(w.pit_weight(), 4.0 / 12.1, 1e-5);

        // total = 19, scale = 22: item = 0.75 - 11 / 22
        let w = weights(8.0, 0.0, 11.0);
        assert_approx_eq!(w.item_weight(), 0.25, 1e-5);
        assert_approx_eq!(w.pit_weight(), 0.25);
    }

    #[test]
    fn test_formula_clamps() {
        // Many pickups push the item weight to its floor.
        let w = weights(0.0, 0.0, 100.0);
        assert_approx_eq!(w.item_weight(), 0.175);
        assert_approx_eq!(w.pit_weight(), 0.25);
        // Pure exploration pushes the pit weight to its ceiling.
        let w = weights(0.0, 100.0, 0.0);
        assert_approx_eq!(w.pit_weight(), 0.5);
        assert_approx_eq!(w.item_weight(), 0.3);
        assert_approx_eq!(w.floor_weight(), 0.2);
    }

    #[test]
    fn test_weights_stay_in_range() {
        let samples = [0.0, 0.01, 0.5, 1.0, 3.3, 10.0, 250.0, 1e6];
        for reward in samples {
            for exploration in samples {
                for pickups in samples {
                    let w = weights(reward, exploration, pickups);
                    if reward + exploration + pickups == 0.0 {
                        assert_eq!(w, ContentWeights::Fallback);
                        continue;
                    }
                    assert!((0.175..=0.3).contains(&w.item_weight()), "{:?}", w);
                    assert!((0.25..=0.5).contains(&w.pit_weight()), "{:?}", w);
                    assert!(w.floor_weight() >= 0.2 - 1e-6, "{:?}", w);
                }
            }
        }
    }

    #[test]
    fn test_fallback_never_places_floor() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let cell = ContentWeights::Fallback.sample(&mut rng, 1);
            assert!(matches!(cell, Cell::Pit | Cell::Item { .. }), "{:?}", cell);
        }
    }

    #[test]
    fn test_weighted_sampling_frequencies() {
        let w = ContentWeights::Weighted {
            item: 0.3,
            pit: 0.5,
        };
        let mut rng = StdRng::seed_from_u64(11);
        let (mut items, mut pits, mut floors) = (0, 0, 0);
        let draws = 20_000;
        for _ in 0..draws {
            match w.sample(&mut rng, 1) {
                Cell::Item { .. } => items += 1,
                Cell::Pit => pits += 1,
                Cell::Floor { .. } => floors += 1,
                other => panic!("unexpected cell {:?}", other),
            }
        }
        let share = |n: i32| n as f32 / draws as f32;
        assert_approx_eq!(share(items), 0.3, 0.02);
        assert_approx_eq!(share(pits), 0.5, 0.02);
        assert_approx_eq!(share(floors), 0.2, 0.02);
    }

    #[test]
    fn test_random_item_carries_value() {
        let mut rng = StdRng::seed_from_u64(3);
        match random_item(&mut rng, 5) {
            Cell::Item { value, .. } => assert_eq!(value, 5),
            other => panic!("expected an item, got {:?}", other),
        }
    }
}
