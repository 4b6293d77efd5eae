// Bulk player import: strict CSV validation, all-or-nothing semantics.
//
// Unlike projection feeds that tolerate junk rows, an import replaces the
// whole player pool, so every problem is reported up front and nothing is
// written unless the entire file is clean.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::draft::Position;

/// Columns that must be present in the header.
pub const REQUIRED_COLUMNS: &[&str] = &["name", "position", "team", "projected_points"];

/// Columns that may be present. `bye_week` defaults to 0 when omitted.
pub const OPTIONAL_COLUMNS: &[&str] = &["bye_week", "predicted_pick"];

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A single row-level validation failure. `row` is 1-based and counts the
/// header, matching what a user sees in a spreadsheet.
#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid CSV header: {0}")]
    Header(String),

    #[error("CSV contains {} invalid row(s)", .0.len())]
    Rows(Vec<RowError>),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

// ---------------------------------------------------------------------------
// Parsed row
// ---------------------------------------------------------------------------

/// One validated player row, ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedPlayer {
    pub name: String,
    pub position: Position,
    pub team: String,
    pub projected_points: f64,
    pub bye_week: u32,
    pub predicted_pick: Option<u32>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse and validate a players CSV.
///
/// The header must contain every required column; column order does not
/// matter. Unknown columns are rejected so a mislabeled file fails loudly
/// instead of silently dropping data. Row errors are collected across the
/// whole file and returned together.
pub fn parse_players_csv(raw: &str) -> Result<Vec<ImportedPlayer>, ImportError> {
    let mut reader = csv::Reader::from_reader(raw.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    let columns = validate_header(&headers)?;

    let mut players = Vec::new();
    let mut errors = Vec::new();

    for (index, record) in reader.records().enumerate() {
        // Row 1 is the header; data starts at row 2.
        let row = index + 2;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                errors.push(RowError {
                    row,
                    message: format!("unreadable row: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &columns) {
            Ok(player) => players.push(player),
            Err(message) => errors.push(RowError { row, message }),
        }
    }

    if !errors.is_empty() {
        warn!("rejected player import with {} bad rows", errors.len());
        return Err(ImportError::Rows(errors));
    }

    Ok(players)
}

/// Header column name -> index map.
type ColumnMap = HashMap<String, usize>;

fn validate_header(headers: &[String]) -> Result<ColumnMap, ImportError> {
    let mut columns = ColumnMap::new();
    for (i, header) in headers.iter().enumerate() {
        if columns.insert(header.clone(), i).is_some() {
            return Err(ImportError::Header(format!("duplicate column `{header}`")));
        }
    }

    for required in REQUIRED_COLUMNS {
        if !columns.contains_key(*required) {
            return Err(ImportError::Header(format!(
                "missing required column `{required}`"
            )));
        }
    }

    for header in headers {
        let known = REQUIRED_COLUMNS.contains(&header.as_str())
            || OPTIONAL_COLUMNS.contains(&header.as_str());
        if !known {
            return Err(ImportError::Header(format!("unknown column `{header}`")));
        }
    }

    Ok(columns)
}

/// Look up a cell by column name, trimmed. Missing optional columns and
/// short rows read as the empty string.
fn cell<'a>(record: &'a csv::StringRecord, columns: &ColumnMap, name: &str) -> &'a str {
    columns
        .get(name)
        .and_then(|&i| record.get(i))
        .unwrap_or("")
        .trim()
}

fn parse_row(record: &csv::StringRecord, columns: &ColumnMap) -> Result<ImportedPlayer, String> {
    let field = |name: &str| cell(record, columns, name);

    let name = field("name");
    if name.is_empty() {
        return Err("name is required".into());
    }

    let position_str = field("position");
    if position_str.is_empty() {
        return Err("position is required".into());
    }
    let position = Position::from_str_pos(position_str)
        .ok_or_else(|| format!("unknown position `{position_str}`"))?;

    let team = field("team");
    if team.is_empty() {
        return Err("team is required".into());
    }

    let points_str = field("projected_points");
    let projected_points: f64 = points_str
        .parse()
        .map_err(|_| "projected_points must be a number".to_string())?;
    if !projected_points.is_finite() {
        return Err("projected_points must be finite".into());
    }

    let bye_week = match field("bye_week") {
        "" => 0,
        s => s
            .parse::<u32>()
            .map_err(|_| "bye_week must be a non-negative integer".to_string())?,
    };

    let predicted_pick = match field("predicted_pick") {
        "" => None,
        s => {
            let pick: u32 = s
                .parse()
                .map_err(|_| "predicted_pick must be a positive integer".to_string())?;
            if pick == 0 {
                return Err("predicted_pick must be at least 1".into());
            }
            Some(pick)
        }
    };

    Ok(ImportedPlayer {
        name: name.to_string(),
        position,
        team: team.to_string(),
        projected_points,
        bye_week,
        predicted_pick,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_csv_parses_all_rows() {
        let csv_data = "\
name,position,team,projected_points,bye_week
Josh Allen,QB,BUF,285.5,12
Christian McCaffrey,RB,SF,245.8,9
San Francisco 49ers,DST,SF,125.8,9";

        let players = parse_players_csv(csv_data).unwrap();
        assert_eq!(players.len(), 3);

        assert_eq!(players[0].name, "Josh Allen");
        assert_eq!(players[0].position, Position::Quarterback);
        assert_eq!(players[0].team, "BUF");
        assert!((players[0].projected_points - 285.5).abs() < f64::EPSILON);
        assert_eq!(players[0].bye_week, 12);
        assert_eq!(players[0].predicted_pick, None);

        assert_eq!(players[2].position, Position::Defense);
    }

    #[test]
    fn columns_may_appear_in_any_order() {
        let csv_data = "\
team,projected_points,name,position
KC,195.4,Travis Kelce,TE";

        let players = parse_players_csv(csv_data).unwrap();
        assert_eq!(players[0].name, "Travis Kelce");
        assert_eq!(players[0].position, Position::TightEnd);
        assert_eq!(players[0].team, "KC");
    }

    #[test]
    fn bye_week_defaults_to_zero_when_column_absent() {
        let csv_data = "\
name,position,team,projected_points
Justin Tucker,K,BAL,145.2";

        let players = parse_players_csv(csv_data).unwrap();
        assert_eq!(players[0].bye_week, 0);
    }

    #[test]
    fn bye_week_defaults_to_zero_when_cell_empty() {
        let csv_data = "\
name,position,team,projected_points,bye_week
Justin Tucker,K,BAL,145.2,";

        let players = parse_players_csv(csv_data).unwrap();
        assert_eq!(players[0].bye_week, 0);
    }

    #[test]
    fn predicted_pick_parsed_when_present() {
        let csv_data = "\
name,position,team,projected_points,predicted_pick
Christian McCaffrey,RB,SF,245.8,1
Cooper Kupp,WR,LAR,265.2,";

        let players = parse_players_csv(csv_data).unwrap();
        assert_eq!(players[0].predicted_pick, Some(1));
        assert_eq!(players[1].predicted_pick, None);
    }

    #[test]
    fn missing_required_column_rejected() {
        let csv_data = "\
name,position,projected_points
Josh Allen,QB,285.5";

        let err = parse_players_csv(csv_data).unwrap_err();
        match err {
            ImportError::Header(msg) => assert!(msg.contains("team"), "got {msg}"),
            other => panic!("expected Header error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_column_rejected() {
        let csv_data = "\
name,position,team,projected_points,salary
Josh Allen,QB,BUF,285.5,45";

        let err = parse_players_csv(csv_data).unwrap_err();
        match err {
            ImportError::Header(msg) => assert!(msg.contains("salary"), "got {msg}"),
            other => panic!("expected Header error, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_column_rejected() {
        let csv_data = "\
name,position,team,projected_points,name
Josh Allen,QB,BUF,285.5,Josh Allen";

        let err = parse_players_csv(csv_data).unwrap_err();
        assert!(matches!(err, ImportError::Header(_)));
    }

    #[test]
    fn header_is_case_insensitive() {
        let csv_data = "\
Name,Position,Team,Projected_Points
Josh Allen,QB,BUF,285.5";

        let players = parse_players_csv(csv_data).unwrap();
        assert_eq!(players.len(), 1);
    }

    #[test]
    fn all_row_errors_collected_together() {
        let csv_data = "\
name,position,team,projected_points,bye_week
Josh Allen,QB,BUF,285.5,12
,RB,SF,245.8,9
Cooper Kupp,FLEX,LAR,265.2,10
Travis Kelce,TE,KC,not_a_number,10
Justin Tucker,K,BAL,145.2,13";

        let err = parse_players_csv(csv_data).unwrap_err();
        match err {
            ImportError::Rows(errors) => {
                assert_eq!(errors.len(), 3);
                assert_eq!(errors[0].row, 3);
                assert!(errors[0].message.contains("name"));
                assert_eq!(errors[1].row, 4);
                assert!(errors[1].message.contains("FLEX"));
                assert_eq!(errors[2].row, 5);
                assert!(errors[2].message.contains("projected_points"));
            }
            other => panic!("expected Rows error, got {other:?}"),
        }
    }

    #[test]
    fn non_finite_projection_rejected() {
        let csv_data = "\
name,position,team,projected_points
Bad Value,QB,BUF,inf";

        let err = parse_players_csv(csv_data).unwrap_err();
        assert!(matches!(err, ImportError::Rows(_)));
    }

    #[test]
    fn zero_predicted_pick_rejected() {
        let csv_data = "\
name,position,team,projected_points,predicted_pick
Josh Allen,QB,BUF,285.5,0";

        let err = parse_players_csv(csv_data).unwrap_err();
        match err {
            ImportError::Rows(errors) => {
                assert!(errors[0].message.contains("predicted_pick"));
            }
            other => panic!("expected Rows error, got {other:?}"),
        }
    }

    #[test]
    fn bad_bye_week_rejected() {
        let csv_data = "\
name,position,team,projected_points,bye_week
Josh Allen,QB,BUF,285.5,soon";

        let err = parse_players_csv(csv_data).unwrap_err();
        assert!(matches!(err, ImportError::Rows(_)));
    }

    #[test]
    fn whitespace_trimmed_from_fields() {
        let csv_data = "\
name,position,team,projected_points
  Josh Allen  , qb , BUF ,285.5";

        let players = parse_players_csv(csv_data).unwrap();
        assert_eq!(players[0].name, "Josh Allen");
        assert_eq!(players[0].position, Position::Quarterback);
        assert_eq!(players[0].team, "BUF");
    }

    #[test]
    fn empty_file_with_header_yields_empty_vec() {
        let csv_data = "name,position,team,projected_points";
        let players = parse_players_csv(csv_data).unwrap();
        assert!(players.is_empty());
    }

    #[test]
    fn row_numbers_count_the_header() {
        let csv_data = "\
name,position,team,projected_points
Good Player,QB,BUF,285.5
,QB,BUF,100.0";

        let err = parse_players_csv(csv_data).unwrap_err();
        match err {
            ImportError::Rows(errors) => assert_eq!(errors[0].row, 3),
            other => panic!("expected Rows error, got {other:?}"),
        }
    }
}
