// Starter-need resolution with cross-position FLEX surplus sharing.
//
// For each starter position, the league requires `teams * slots` starters.
// Players drafted at a position beyond its own requirement are surplus and
// count against the FLEX requirement instead, for every FLEX-eligible
// position.

use std::collections::HashMap;

use crate::draft::{LeagueSettings, Player, Position, STARTER_POSITIONS};

/// Drafted-player counts per position for one snapshot.
pub fn drafted_counts(players: &[Player]) -> HashMap<Position, u32> {
    let mut counts: HashMap<Position, u32> = HashMap::new();
    for player in players.iter().filter(|p| p.is_drafted()) {
        *counts.entry(player.position).or_insert(0) += 1;
    }
    counts
}

/// Starters still required per position and for the shared FLEX pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeedTable {
    needed: HashMap<Position, u32>,
    /// FLEX starters still required after surplus sharing.
    pub flex_needed: u32,
}

impl NeedTable {
    /// Resolve remaining needs from league settings and drafted counts.
    ///
    /// 1. `required = teams * slots` per position.
    /// 2. `needed = max(0, required - drafted)`.
    /// 3. Surplus at each FLEX-eligible position (drafted beyond its own
    ///    starters) satisfies FLEX.
    /// 4. `flex_needed = max(0, teams * flex_slots - total surplus)`.
    pub fn resolve(settings: &LeagueSettings, drafted: &HashMap<Position, u32>) -> Self {
        let teams = settings.total_teams;
        let mut needed = HashMap::new();
        let mut flex_surplus: u32 = 0;

        for &pos in STARTER_POSITIONS {
            let required = teams * settings.slots_for(pos);
            let drafted_pos = drafted.get(&pos).copied().unwrap_or(0);
            needed.insert(pos, required.saturating_sub(drafted_pos));

            if settings.flex_eligibility.contains(&pos) {
                flex_surplus += drafted_pos.saturating_sub(required);
            }
        }

        let flex_required = teams * settings.flex_slots;
        NeedTable {
            needed,
            flex_needed: flex_required.saturating_sub(flex_surplus),
        }
    }

    /// Starters still required at a position. Positions without dedicated
    /// slots (K, DST) report zero.
    pub fn needed(&self, position: Position) -> u32 {
        self.needed.get(&position).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
