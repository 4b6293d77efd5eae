// Player and position types shared by the store and the value engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque player identifier (SQLite rowid).
pub type PlayerId = i64;

/// Fantasy-football roster positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "QB")]
    Quarterback,
    #[serde(rename = "RB")]
    RunningBack,
    #[serde(rename = "WR")]
    WideReceiver,
    #[serde(rename = "TE")]
    TightEnd,
    #[serde(rename = "K")]
    Kicker,
    #[serde(rename = "DST")]
    Defense,
}

/// Positions with dedicated starter-slot counts in the league settings.
/// Kickers and defenses are drafted but never form a scored pool.
pub const STARTER_POSITIONS: &[Position] = &[
    Position::Quarterback,
    Position::RunningBack,
    Position::WideReceiver,
    Position::TightEnd,
];

impl Position {
    /// Parse a position string into a Position enum.
    ///
    /// Handles the standard abbreviations case-insensitively; "DEF" is
    /// accepted as an alias for "DST".
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "QB" => Some(Position::Quarterback),
            "RB" => Some(Position::RunningBack),
            "WR" => Some(Position::WideReceiver),
            "TE" => Some(Position::TightEnd),
            "K" => Some(Position::Kicker),
            "DST" | "DEF" => Some(Position::Defense),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Quarterback => "QB",
            Position::RunningBack => "RB",
            Position::WideReceiver => "WR",
            Position::TightEnd => "TE",
            Position::Kicker => "K",
            Position::Defense => "DST",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// Whether the user is targeting or avoiding a player on the board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    #[default]
    Default,
    Target,
    Avoid,
}

impl TargetStatus {
    pub fn from_str_status(s: &str) -> Option<Self> {
        match s {
            "default" => Some(TargetStatus::Default),
            "target" => Some(TargetStatus::Target),
            "avoid" => Some(TargetStatus::Avoid),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetStatus::Default => "default",
            TargetStatus::Target => "target",
            TargetStatus::Avoid => "avoid",
        }
    }
}

/// A player on the draft board, as read from the store for one session.
///
/// `projected_points` may be absent; such players exist on the board but
/// are excluded from ranking and drop scoring. `pick_number` is the
/// session-scoped draft state: `Some(n)` means drafted with overall pick n.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    pub team: String,
    pub projected_points: Option<f64>,
    pub bye_week: u32,
    pub predicted_pick: Option<u32>,
    pub target_status: TargetStatus,
    pub pick_number: Option<u32>,
}

impl Player {
    pub fn is_drafted(&self) -> bool {
        self.pick_number.is_some()
    }
}
