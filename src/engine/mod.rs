// Draft value engine: need resolution, pool ranking, drop scoring.
//
// A pure, synchronous computation over an immutable snapshot of players
// and league settings. All I/O and locking live at the store boundary.

pub mod drops;
pub mod needs;
pub mod ranking;

use std::collections::HashMap;

use thiserror::Error;

use crate::draft::{LeagueSettings, Player, PlayerId, STARTER_POSITIONS};
use drops::score_pool;
use needs::{drafted_counts, NeedTable};
use ranking::{ranked_pool, PoolFilter};

/// Default lookahead window for drop scoring.
pub const DEFAULT_LOOKAHEAD: usize = 6;

/// How a FLEX-pool score interacts with a position-pool score for the same
/// player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexScorePolicy {
    /// The FLEX score replaces the position score. Once a position's own
    /// starters are filled, the marginal decision for that player is
    /// governed by FLEX scarcity, so the FLEX score is the relevant signal.
    Overwrite,
    /// The first-written (position) score is kept.
    PreserveFirst,
}

/// The canonical policy for shared FLEX/position scores.
pub const FLEX_SCORE_POLICY: FlexScorePolicy = FlexScorePolicy::Overwrite;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("lookahead window must be at least 1, got {0}")]
    InvalidLookahead(usize),
}

/// Compute drop scores for every relevant pool in one snapshot.
///
/// Position pools are scored only while that position still needs
/// starters; the FLEX composite pool is scored only while FLEX slots
/// remain after surplus sharing. With no league settings there is nothing
/// to score and the result is an empty map.
pub fn compute_drops(
    players: &[Player],
    settings: Option<&LeagueSettings>,
    k: usize,
) -> Result<HashMap<PlayerId, f64>, EngineError> {
    if k == 0 {
        return Err(EngineError::InvalidLookahead(k));
    }
    let Some(settings) = settings else {
        return Ok(HashMap::new());
    };

    let needs = NeedTable::resolve(settings, &drafted_counts(players));
    let mut scores = HashMap::new();

    for &pos in STARTER_POSITIONS {
        if needs.needed(pos) > 0 {
            let pool = ranked_pool(players, PoolFilter::Position(pos));
            score_pool(&pool, k, &mut scores);
        }
    }

    if needs.flex_needed > 0 && !settings.flex_eligibility.is_empty() {
        let pool = ranked_pool(players, PoolFilter::Composite(&settings.flex_eligibility));
        match FLEX_SCORE_POLICY {
            FlexScorePolicy::Overwrite => score_pool(&pool, k, &mut scores),
            FlexScorePolicy::PreserveFirst => {
                let mut flex_scores = HashMap::new();
                score_pool(&pool, k, &mut flex_scores);
                for (id, score) in flex_scores {
                    scores.entry(id).or_insert(score);
                }
            }
        }
    }

    Ok(scores)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
