//! Rank-based placement.
//!
//! The highest-ranked entity always sits at [`Point::ORIGIN`]; everybody else
//! fans out from it according to [`LayoutStrategy`]. Positions depend only on
//! the ranked list, the config and the jitter source, never on a previous pass.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{LayoutConfig, LayoutStrategy};
use crate::model::Entity;
use crate::*;

/// Source of the secondary-axis offset used to de-clutter the column-pair
/// layout.
pub trait Jitter {
    /// Returns an offset in `[-amplitude, amplitude)`.
    fn offset(&mut self, amplitude: f64) -> f64;
}

/// Always returns `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl Jitter for NoJitter {
    fn offset(&mut self, _amplitude: f64) -> f64 {
        0.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngJitter;

impl Jitter for ThreadRngJitter {
    fn offset(&mut self, amplitude: f64) -> f64 {
        if amplitude <= 0.0 {
            return 0.0;
        }
        rand::thread_rng().gen_range(-amplitude..amplitude)
    }
}

/// Reproducible jitter for tests and for callers that want stable output.
#[derive(Debug, Clone)]
pub struct SeededJitter {
    rng: StdRng,
}

impl SeededJitter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Jitter for SeededJitter {
    fn offset(&mut self, amplitude: f64) -> f64 {
        if amplitude <= 0.0 {
            return 0.0;
        }
        self.rng.gen_range(-amplitude..amplitude)
    }
}

/// Assigns a position to every entity of an already ranked list.
pub fn assign_positions(
    ranked: &[Entity],
    config: &LayoutConfig,
    jitter: &mut dyn Jitter,
) -> Vec<Entity> {
    ranked
        .iter()
        .enumerate()
        .map(|(rank, entity)| {
            let position = match config.strategy {
                LayoutStrategy::ColumnPair => column_pair_position(rank, config, jitter),
                LayoutStrategy::Pyramid => pyramid_position(rank, entity.importance, config),
            };
            Entity {
                position,
                ..entity.clone()
            }
        })
        .collect()
}

fn column_pair_position(rank: usize, config: &LayoutConfig, jitter: &mut dyn Jitter) -> Point {
    if rank == 0 {
        return Point::ORIGIN;
    }

    let column = rank.div_ceil(2) as f64;
    let is_top = rank % 2 != 0;
    let row = if is_top {
        -config.row_height
    } else {
        config.row_height
    };

    Point {
        x: column * config.column_width,
        y: row + jitter.offset(config.jitter),
    }
}

/// Tier `level` holds `level + 1` ranks, so rank `r` lands in the largest
/// tier whose first rank `level * (level + 1) / 2` is `<= r`.
pub fn pyramid_slot(rank: usize) -> (usize, usize) {
    let mut level = 0;
    let mut first = 0;
    while first + level + 1 <= rank {
        first += level + 1;
        level += 1;
    }
    (level, rank - first)
}

fn pyramid_position(rank: usize, importance: f64, config: &LayoutConfig) -> Point {
    let (level, slot) = pyramid_slot(rank);
    if level == 0 {
        return Point::ORIGIN;
    }

    let mut x = (slot as f64 - level as f64 / 2.0) * config.tier_spacing_x;
    let y = level as f64 * config.tier_spacing_y;

    let on_edge = slot == 0 || slot == level;
    if on_edge && level <= config.edge_push_tiers {
        let push = (1.0 - importance) * config.edge_push;
        x += push * x.signum();
    }

    Point { x, y }
}
