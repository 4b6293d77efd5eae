// Command dispatch: decode JSON commands, apply them against the store,
// run the value engine, encode responses.
//
// Every inbound text frame is one command; every command produces exactly
// one response. Failures become `error` responses rather than dropped
// connections, so a client can always correlate request and reply.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::db::{Store, StoreError};
use crate::draft::{DraftSessionId, LeagueSettings, Player, PlayerId, SettingsUpdate, TargetStatus};
use crate::engine;
use crate::import::{self, ImportError, RowError};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Inbound commands. Unknown fields inside `update_settings` payloads are
/// rejected by the update schema itself.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    ComputeDrops { k: Option<usize> },
    ListPlayers,
    DraftPlayer { player_id: PlayerId },
    UndraftPlayer { player_id: PlayerId },
    ResetDraft,
    ImportPlayers { csv: String },
    SetTargetStatus { player_id: PlayerId, status: TargetStatus },
    GetSettings,
    UpdateSettings { payload: SettingsUpdate },
}

/// Outbound responses.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    DropScores {
        scores: HashMap<PlayerId, f64>,
    },
    Players {
        players: Vec<Player>,
    },
    PickAssigned {
        player_id: PlayerId,
        pick_number: u32,
    },
    PickCleared {
        player_id: PlayerId,
    },
    DraftReset {
        cleared: usize,
    },
    PlayersImported {
        inserted: usize,
    },
    TargetStatusSet {
        player_id: PlayerId,
    },
    Settings {
        settings: LeagueSettings,
    },
    Error {
        message: String,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        retryable: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        rows: Option<Vec<RowError>>,
    },
}

impl Response {
    fn error(message: impl Into<String>) -> Self {
        Response::Error {
            message: message.into(),
            retryable: false,
            rows: None,
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// The command handler: one store, one draft session, one default K.
pub struct App {
    store: Arc<Store>,
    session: DraftSessionId,
    default_k: usize,
}

impl App {
    pub fn new(store: Arc<Store>, session: DraftSessionId, default_k: usize) -> Self {
        App {
            store,
            session,
            default_k,
        }
    }

    pub fn session(&self) -> &DraftSessionId {
        &self.session
    }

    /// Handle one raw command frame, always returning a JSON response.
    pub fn handle(&self, text: &str) -> String {
        let response = match serde_json::from_str::<Command>(text) {
            Ok(command) => self.dispatch(command),
            Err(e) => {
                warn!("unparseable command: {e}");
                Response::error(format!("invalid command: {e}"))
            }
        };
        encode(&response)
    }

    fn dispatch(&self, command: Command) -> Response {
        match command {
            Command::ComputeDrops { k } => self.compute_drops(k.unwrap_or(self.default_k)),
            Command::ListPlayers => match self.store.players(&self.session) {
                Ok(players) => Response::Players { players },
                Err(e) => store_error(e),
            },
            Command::DraftPlayer { player_id } => {
                match self.store.assign_pick(&self.session, player_id) {
                    Ok(pick_number) => Response::PickAssigned {
                        player_id,
                        pick_number,
                    },
                    Err(e) => store_error(e),
                }
            }
            Command::UndraftPlayer { player_id } => {
                match self.store.clear_pick(&self.session, player_id) {
                    Ok(()) => Response::PickCleared { player_id },
                    Err(e) => store_error(e),
                }
            }
            Command::ResetDraft => match self.store.reset_picks(&self.session) {
                Ok(cleared) => Response::DraftReset { cleared },
                Err(e) => store_error(e),
            },
            Command::ImportPlayers { csv } => self.import_players(&csv),
            Command::SetTargetStatus { player_id, status } => {
                match self.store.set_target_status(player_id, status) {
                    Ok(()) => Response::TargetStatusSet { player_id },
                    Err(e) => store_error(e),
                }
            }
            Command::GetSettings => match self.store.ensure_default_settings() {
                Ok(settings) => Response::Settings { settings },
                Err(e) => store_error(e),
            },
            Command::UpdateSettings { payload } => match self.store.update_settings(&payload) {
                Ok(settings) => Response::Settings { settings },
                Err(e) => store_error(e),
            },
        }
    }

    /// Snapshot the store and run the engine. Fail-closed: any failure
    /// yields an error response with no scores at all.
    fn compute_drops(&self, k: usize) -> Response {
        let snapshot = match self.store.snapshot(&self.session) {
            Ok(s) => s,
            Err(e) => return store_error(e),
        };
        match engine::compute_drops(&snapshot.players, snapshot.settings.as_ref(), k) {
            Ok(scores) => Response::DropScores { scores },
            Err(e) => Response::error(e.to_string()),
        }
    }

    fn import_players(&self, csv: &str) -> Response {
        let players = match import::parse_players_csv(csv) {
            Ok(players) => players,
            Err(ImportError::Rows(rows)) => {
                return Response::Error {
                    message: "CSV contains invalid rows".into(),
                    retryable: false,
                    rows: Some(rows),
                }
            }
            Err(e) => return Response::error(e.to_string()),
        };
        match self.store.replace_players(&players) {
            Ok(inserted) => Response::PlayersImported { inserted },
            Err(e) => store_error(e),
        }
    }
}

fn store_error(err: StoreError) -> Response {
    let retryable = matches!(err, StoreError::PickConflict);
    Response::Error {
        message: err.to_string(),
        retryable,
        rows: None,
    }
}

fn encode(response: &Response) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        warn!("failed to encode response: {e}");
        r#"{"type":"error","message":"internal encoding failure"}"#.to_string()
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::Position;
    use serde_json::Value;

    fn test_app() -> App {
        let store = Arc::new(Store::open(":memory:").unwrap());
        store.ensure_default_settings().unwrap();
        App::new(store, DraftSessionId::new("session_app_test"), 6)
    }

    fn seed(app: &App, name: &str, position: Position, points: f64) -> PlayerId {
        app.store
            .insert_player(name, position, "TST", Some(points), 0)
            .unwrap()
    }

    fn handle_json(app: &App, command: &str) -> Value {
        serde_json::from_str(&app.handle(command)).expect("response should be valid JSON")
    }

    #[test]
    fn list_players_roundtrip() {
        let app = test_app();
        seed(&app, "Josh Allen", Position::Quarterback, 285.5);

        let response = handle_json(&app, r#"{"type":"list_players"}"#);
        assert_eq!(response["type"], "players");
        assert_eq!(response["players"][0]["name"], "Josh Allen");
        assert_eq!(response["players"][0]["position"], "QB");
    }

    #[test]
    fn draft_and_undraft_flow() {
        let app = test_app();
        let id = seed(&app, "CMC", Position::RunningBack, 245.8);

        let response = handle_json(&app, &format!(r#"{{"type":"draft_player","player_id":{id}}}"#));
        assert_eq!(response["type"], "pick_assigned");
        assert_eq!(response["pick_number"], 1);

        // Drafting again is a state-machine violation.
        let response = handle_json(&app, &format!(r#"{{"type":"draft_player","player_id":{id}}}"#));
        assert_eq!(response["type"], "error");

        let response =
            handle_json(&app, &format!(r#"{{"type":"undraft_player","player_id":{id}}}"#));
        assert_eq!(response["type"], "pick_cleared");
    }

    #[test]
    fn compute_drops_uses_default_k() {
        let app = test_app();
        for i in 0..4 {
            seed(
                &app,
                &format!("RB {i}"),
                Position::RunningBack,
                200.0 - i as f64 * 10.0,
            );
        }

        let response = handle_json(&app, r#"{"type":"compute_drops"}"#);
        assert_eq!(response["type"], "drop_scores");
        let scores = response["scores"].as_object().unwrap();
        // All but the last pool member have scores.
        assert_eq!(scores.len(), 3);
    }

    #[test]
    fn compute_drops_rejects_zero_k() {
        let app = test_app();
        let response = handle_json(&app, r#"{"type":"compute_drops","k":0}"#);
        assert_eq!(response["type"], "error");
        assert!(response["message"]
            .as_str()
            .unwrap()
            .contains("lookahead"));
    }

    #[test]
    fn compute_drops_without_settings_is_empty() {
        let store = Arc::new(Store::open(":memory:").unwrap());
        let app = App::new(store, DraftSessionId::new("session_empty"), 6);

        let response = handle_json(&app, r#"{"type":"compute_drops","k":3}"#);
        assert_eq!(response["type"], "drop_scores");
        assert!(response["scores"].as_object().unwrap().is_empty());
    }

    #[test]
    fn reset_draft_reports_cleared_count() {
        let app = test_app();
        let a = seed(&app, "A", Position::WideReceiver, 100.0);
        let b = seed(&app, "B", Position::WideReceiver, 90.0);
        app.handle(&format!(r#"{{"type":"draft_player","player_id":{a}}}"#));
        app.handle(&format!(r#"{{"type":"draft_player","player_id":{b}}}"#));

        let response = handle_json(&app, r#"{"type":"reset_draft"}"#);
        assert_eq!(response["type"], "draft_reset");
        assert_eq!(response["cleared"], 2);
    }

    #[test]
    fn import_players_happy_path() {
        let app = test_app();
        let command = serde_json::json!({
            "type": "import_players",
            "csv": "name,position,team,projected_points\nJosh Allen,QB,BUF,285.5\nCMC,RB,SF,245.8",
        });
        let response = handle_json(&app, &command.to_string());
        assert_eq!(response["type"], "players_imported");
        assert_eq!(response["inserted"], 2);
    }

    #[test]
    fn import_players_reports_row_errors() {
        let app = test_app();
        let command = serde_json::json!({
            "type": "import_players",
            "csv": "name,position,team,projected_points\n,QB,BUF,285.5\nCMC,XX,SF,245.8",
        });
        let response = handle_json(&app, &command.to_string());
        assert_eq!(response["type"], "error");
        let rows = response["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["row"], 2);
    }

    #[test]
    fn settings_get_and_update() {
        let app = test_app();

        let response = handle_json(&app, r#"{"type":"get_settings"}"#);
        assert_eq!(response["type"], "settings");
        assert_eq!(response["settings"]["total_teams"], 12);

        let response = handle_json(
            &app,
            r#"{"type":"update_settings","payload":{"total_teams":10,"flex_slots":2}}"#,
        );
        assert_eq!(response["type"], "settings");
        assert_eq!(response["settings"]["total_teams"], 10);
        assert_eq!(response["settings"]["flex_slots"], 2);
    }

    #[test]
    fn update_settings_rejects_unknown_field() {
        let app = test_app();
        let response = handle_json(
            &app,
            r#"{"type":"update_settings","payload":{"bench_slots":6}}"#,
        );
        assert_eq!(response["type"], "error");
    }

    #[test]
    fn update_settings_rejects_out_of_range() {
        let app = test_app();
        let response = handle_json(
            &app,
            r#"{"type":"update_settings","payload":{"total_teams":99}}"#,
        );
        assert_eq!(response["type"], "error");
        assert!(response["message"].as_str().unwrap().contains("total_teams"));
    }

    #[test]
    fn set_target_status() {
        let app = test_app();
        let id = seed(&app, "Kupp", Position::WideReceiver, 265.2);

        let response = handle_json(
            &app,
            &format!(r#"{{"type":"set_target_status","player_id":{id},"status":"target"}}"#),
        );
        assert_eq!(response["type"], "target_status_set");

        let response = handle_json(&app, r#"{"type":"list_players"}"#);
        assert_eq!(response["players"][0]["target_status"], "target");
    }

    #[test]
    fn malformed_json_yields_error_response() {
        let app = test_app();
        let response = handle_json(&app, "this is not json");
        assert_eq!(response["type"], "error");
    }

    #[test]
    fn unknown_command_type_yields_error_response() {
        let app = test_app();
        let response = handle_json(&app, r#"{"type":"fire_the_commissioner"}"#);
        assert_eq!(response["type"], "error");
    }

    #[test]
    fn drop_scores_exclude_unprojected_players() {
        let app = test_app();
        seed(&app, "Scored A", Position::TightEnd, 195.4);
        seed(&app, "Scored B", Position::TightEnd, 150.0);
        let no_points = app
            .store
            .insert_player("No Projection", Position::TightEnd, "TST", None, 0)
            .unwrap();

        let response = handle_json(&app, r#"{"type":"compute_drops","k":3}"#);
        let scores = response["scores"].as_object().unwrap();
        assert!(!scores.contains_key(&no_points.to_string()));
    }
}
