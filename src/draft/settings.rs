// League settings: starter-slot counts, team count, FLEX eligibility.
//
// Settings live in the store (they are administrative state, editable
// between draft sessions), not in the app config file. Updates go through
// a closed, validated schema: only the fields named here can change, and
// each is range-checked before anything is written.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::player::Position;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("validation error for field `{field}`: {message}")]
    Validation { field: &'static str, message: String },
}

// ---------------------------------------------------------------------------
// LeagueSettings
// ---------------------------------------------------------------------------

/// Starter-slot requirements for one league.
///
/// `flex_eligibility` is the set of positions whose surplus can fill FLEX
/// slots. TE is not eligible by default, but eligibility is data rather
/// than a hard-coded position list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueSettings {
    pub total_teams: u32,
    pub qb_slots: u32,
    pub rb_slots: u32,
    pub wr_slots: u32,
    pub te_slots: u32,
    pub flex_slots: u32,
    pub flex_eligibility: Vec<Position>,
}

impl Default for LeagueSettings {
    fn default() -> Self {
        LeagueSettings {
            total_teams: 12,
            qb_slots: 1,
            rb_slots: 2,
            wr_slots: 2,
            te_slots: 1,
            flex_slots: 1,
            flex_eligibility: vec![
                Position::Quarterback,
                Position::RunningBack,
                Position::WideReceiver,
            ],
        }
    }
}

impl LeagueSettings {
    /// Starter slots per team for a position. Kickers and defenses have no
    /// dedicated starter accounting here and report zero.
    pub fn slots_for(&self, position: Position) -> u32 {
        match position {
            Position::Quarterback => self.qb_slots,
            Position::RunningBack => self.rb_slots,
            Position::WideReceiver => self.wr_slots,
            Position::TightEnd => self.te_slots,
            Position::Kicker | Position::Defense => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// SettingsUpdate
// ---------------------------------------------------------------------------

/// A partial settings update. Every field is optional; unknown fields in
/// the inbound payload are rejected at deserialization time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsUpdate {
    pub total_teams: Option<u32>,
    pub qb_slots: Option<u32>,
    pub rb_slots: Option<u32>,
    pub wr_slots: Option<u32>,
    pub te_slots: Option<u32>,
    pub flex_slots: Option<u32>,
    pub flex_eligibility: Option<Vec<Position>>,
}

impl SettingsUpdate {
    /// Validate every present field against its fixed range.
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_range("total_teams", self.total_teams, 1, 24)?;
        check_range("qb_slots", self.qb_slots, 0, 3)?;
        check_range("rb_slots", self.rb_slots, 0, 6)?;
        check_range("wr_slots", self.wr_slots, 0, 6)?;
        check_range("te_slots", self.te_slots, 0, 6)?;
        check_range("flex_slots", self.flex_slots, 0, 3)?;

        if let Some(eligibility) = &self.flex_eligibility {
            for pos in eligibility {
                if matches!(pos, Position::Kicker | Position::Defense) {
                    return Err(SettingsError::Validation {
                        field: "flex_eligibility",
                        message: format!("{pos} cannot fill a FLEX slot"),
                    });
                }
            }
        }

        Ok(())
    }

    /// Apply the present fields to `settings`. Call `validate` first.
    pub fn apply(&self, settings: &mut LeagueSettings) {
        if let Some(v) = self.total_teams {
            settings.total_teams = v;
        }
        if let Some(v) = self.qb_slots {
            settings.qb_slots = v;
        }
        if let Some(v) = self.rb_slots {
            settings.rb_slots = v;
        }
        if let Some(v) = self.wr_slots {
            settings.wr_slots = v;
        }
        if let Some(v) = self.te_slots {
            settings.te_slots = v;
        }
        if let Some(v) = self.flex_slots {
            settings.flex_slots = v;
        }
        if let Some(v) = &self.flex_eligibility {
            settings.flex_eligibility = v.clone();
        }
    }
}

fn check_range(
    field: &'static str,
    value: Option<u32>,
    min: u32,
    max: u32,
) -> Result<(), SettingsError> {
    if let Some(v) = value {
        if v < min || v > max {
            return Err(SettingsError::Validation {
                field,
                message: format!("must be between {min} and {max}, got {v}"),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
