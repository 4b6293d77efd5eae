// Pool ranking: deterministic descending-value ordering of a player subset.

use crate::draft::{Player, Position};

/// Which players belong to a scoring pool.
#[derive(Debug, Clone, Copy)]
pub enum PoolFilter<'a> {
    /// A single position's pool.
    Position(Position),
    /// The FLEX composite pool over a set of eligible positions.
    Composite(&'a [Position]),
}

impl PoolFilter<'_> {
    fn matches(&self, position: Position) -> bool {
        match self {
            PoolFilter::Position(pos) => *pos == position,
            PoolFilter::Composite(set) => set.contains(&position),
        }
    }
}

/// Collect the pool for `filter`, sorted by projected points descending.
///
/// Players without a projected value are excluded entirely; they cannot
/// produce or participate in a drop computation. Ties on projected points
/// break by player id ascending so the ordering is reproducible.
pub fn ranked_pool<'a>(players: &'a [Player], filter: PoolFilter) -> Vec<&'a Player> {
    let mut pool: Vec<&Player> = players
        .iter()
        .filter(|p| p.projected_points.is_some() && filter.matches(p.position))
        .collect();

    pool.sort_by(|a, b| {
        let va = a.projected_points.unwrap_or(f64::NEG_INFINITY);
        let vb = b.projected_points.unwrap_or(f64::NEG_INFINITY);
        vb.partial_cmp(&va)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    pool
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
