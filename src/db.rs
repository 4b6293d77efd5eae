// SQLite persistence: players, session-scoped draft picks, league settings.

use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use thiserror::Error;
use tracing::info;

use crate::draft::{
    DraftSessionId, LeagueSettings, Player, PlayerId, Position, SettingsError, SettingsUpdate,
    TargetStatus,
};
use crate::import::ImportedPlayer;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),

    #[error("player {0} is already drafted")]
    AlreadyDrafted(PlayerId),

    #[error("player {0} is not drafted")]
    NotDrafted(PlayerId),

    /// Pick-number uniqueness violation. The caller should recompute its
    /// view of the draft and retry.
    #[error("pick number conflict, retry the draft call")]
    PickConflict,

    #[error("stored position `{0}` is not a known position")]
    BadStoredPosition(String),

    #[error("stored target status `{0}` is not a known status")]
    BadStoredStatus(String),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to encode column: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A transactionally consistent view of the store for one scoring request.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub settings: Option<LeagueSettings>,
    pub players: Vec<Player>,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// SQLite-backed store for the draft board.
///
/// All access is serialized through a single connection; pick assignment
/// computes and writes the next pick number in one statement inside a
/// transaction, so no read-then-write race exists across callers.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) a database at `path` and ensure the schema exists.
    /// Pass `":memory:"` for an ephemeral database (useful for tests).
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS players (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                name             TEXT NOT NULL,
                position         TEXT NOT NULL,
                team             TEXT NOT NULL,
                projected_points REAL,
                bye_week         INTEGER NOT NULL DEFAULT 0,
                predicted_pick   INTEGER,
                target_status    TEXT NOT NULL DEFAULT 'default',
                created_at       TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                UNIQUE(name, position, team)
            );

            CREATE TABLE IF NOT EXISTS draft_picks (
                session_id  TEXT NOT NULL,
                player_id   INTEGER NOT NULL REFERENCES players(id) ON DELETE CASCADE,
                pick_number INTEGER NOT NULL,
                picked_at   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (session_id, player_id),
                UNIQUE (session_id, pick_number)
            );

            CREATE TABLE IF NOT EXISTS league_settings (
                id               INTEGER PRIMARY KEY CHECK (id = 1),
                total_teams      INTEGER NOT NULL,
                qb_slots         INTEGER NOT NULL,
                rb_slots         INTEGER NOT NULL,
                wr_slots         INTEGER NOT NULL,
                te_slots         INTEGER NOT NULL,
                flex_slots       INTEGER NOT NULL,
                flex_eligibility TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS draft_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        Ok(Store {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // League settings
    // ------------------------------------------------------------------

    /// Load the league settings row, if one exists.
    pub fn league_settings(&self) -> Result<Option<LeagueSettings>, StoreError> {
        let conn = self.conn();
        read_settings(&conn)
    }

    /// Write the league settings row, replacing any previous values.
    pub fn save_settings(&self, settings: &LeagueSettings) -> Result<(), StoreError> {
        let conn = self.conn();
        write_settings(&conn, settings)
    }

    /// Ensure a settings row exists, seeding defaults on a fresh store.
    /// Returns the current settings either way.
    pub fn ensure_default_settings(&self) -> Result<LeagueSettings, StoreError> {
        let conn = self.conn();
        if let Some(existing) = read_settings(&conn)? {
            return Ok(existing);
        }
        let defaults = LeagueSettings::default();
        write_settings(&conn, &defaults)?;
        info!("seeded default league settings");
        Ok(defaults)
    }

    /// Validate and apply a partial settings update in one transaction,
    /// seeding defaults first if no row exists. Returns the new settings.
    pub fn update_settings(&self, update: &SettingsUpdate) -> Result<LeagueSettings, StoreError> {
        update.validate()?;

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut settings = read_settings(&tx)?.unwrap_or_default();
        update.apply(&mut settings);
        write_settings(&tx, &settings)?;
        tx.commit()?;
        Ok(settings)
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    /// Insert a single player. Primarily used by tests and seeding; bulk
    /// ingestion goes through `replace_players`.
    pub fn insert_player(
        &self,
        name: &str,
        position: Position,
        team: &str,
        projected_points: Option<f64>,
        bye_week: u32,
    ) -> Result<PlayerId, StoreError> {
        let conn = self.conn();
        let id = conn.query_row(
            "INSERT INTO players (name, position, team, projected_points, bye_week)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id",
            params![
                name,
                position.display_str(),
                team,
                projected_points,
                bye_week
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Load all players with their drafted state for one session.
    pub fn players(&self, session: &DraftSessionId) -> Result<Vec<Player>, StoreError> {
        let conn = self.conn();
        read_players(&conn, session)
    }

    /// Read league settings and the full player set in one transaction so
    /// a scoring request observes a single consistent view.
    pub fn snapshot(&self, session: &DraftSessionId) -> Result<Snapshot, StoreError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let settings = read_settings(&tx)?;
        let players = read_players(&tx, session)?;
        tx.commit()?;
        Ok(Snapshot { settings, players })
    }

    /// Replace the entire player set in one transaction. All pick rows are
    /// cleared as well; the old player ids they reference no longer exist.
    /// Returns the inserted count.
    pub fn replace_players(&self, players: &[ImportedPlayer]) -> Result<usize, StoreError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM draft_picks", [])?;
        tx.execute("DELETE FROM players", [])?;
        // Reset the rowid sequence so a re-import starts from id 1.
        tx.execute("DELETE FROM sqlite_sequence WHERE name = 'players'", [])
            .ok();

        for player in players {
            tx.execute(
                "INSERT INTO players (name, position, team, projected_points, bye_week, predicted_pick)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    player.name,
                    player.position.display_str(),
                    player.team,
                    player.projected_points,
                    player.bye_week,
                    player.predicted_pick,
                ],
            )?;
        }

        tx.commit()?;
        info!("replaced player pool with {} players", players.len());
        Ok(players.len())
    }

    /// Set a player's target status.
    pub fn set_target_status(
        &self,
        player_id: PlayerId,
        status: TargetStatus,
    ) -> Result<(), StoreError> {
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE players SET target_status = ?1 WHERE id = ?2",
            params![status.as_str(), player_id],
        )?;
        if changed == 0 {
            return Err(StoreError::PlayerNotFound(player_id));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Pick assignment
    // ------------------------------------------------------------------

    /// Draft a player: assign the next overall pick number.
    ///
    /// The pick number is computed and inserted in a single statement, so
    /// two concurrent calls cannot both observe the same maximum. The
    /// `(session, pick_number)` uniqueness constraint is the backstop; a
    /// violation surfaces as [`StoreError::PickConflict`].
    pub fn assign_pick(
        &self,
        session: &DraftSessionId,
        player_id: PlayerId,
    ) -> Result<u32, StoreError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        if !player_exists(&tx, player_id)? {
            return Err(StoreError::PlayerNotFound(player_id));
        }
        let drafted: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM draft_picks WHERE session_id = ?1 AND player_id = ?2)",
            params![session.as_str(), player_id],
            |row| row.get(0),
        )?;
        if drafted {
            return Err(StoreError::AlreadyDrafted(player_id));
        }

        let pick_number: u32 = tx
            .query_row(
                "INSERT INTO draft_picks (session_id, player_id, pick_number)
                 SELECT ?1, ?2, COALESCE(MAX(pick_number), 0) + 1
                 FROM draft_picks WHERE session_id = ?1
                 RETURNING pick_number",
                params![session.as_str(), player_id],
                |row| row.get(0),
            )
            .map_err(map_pick_conflict)?;

        tx.commit()?;
        info!("drafted player {player_id} at pick {pick_number} in {session}");
        Ok(pick_number)
    }

    /// Undraft a player: clear the pick number without renumbering anyone.
    /// Gaps in the pick sequence are expected after undrafts.
    pub fn clear_pick(
        &self,
        session: &DraftSessionId,
        player_id: PlayerId,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        if !player_exists(&tx, player_id)? {
            return Err(StoreError::PlayerNotFound(player_id));
        }
        let removed = tx.execute(
            "DELETE FROM draft_picks WHERE session_id = ?1 AND player_id = ?2",
            params![session.as_str(), player_id],
        )?;
        if removed == 0 {
            return Err(StoreError::NotDrafted(player_id));
        }

        tx.commit()?;
        info!("undrafted player {player_id} in {session}");
        Ok(())
    }

    /// Clear every pick in the session in one statement. Returns the
    /// number of picks cleared.
    pub fn reset_picks(&self, session: &DraftSessionId) -> Result<usize, StoreError> {
        let conn = self.conn();
        let cleared = conn.execute(
            "DELETE FROM draft_picks WHERE session_id = ?1",
            params![session.as_str()],
        )?;
        info!("reset {cleared} picks in {session}");
        Ok(cleared)
    }

    // ------------------------------------------------------------------
    // Session management
    // ------------------------------------------------------------------

    /// Key used in the draft_state table to store the current session id.
    const SESSION_KEY: &'static str = "current_session_id";

    /// Retrieve the stored session id, if one has been set.
    pub fn current_session(&self) -> Result<Option<DraftSessionId>, StoreError> {
        let conn = self.conn();
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM draft_state WHERE key = ?1",
                params![Self::SESSION_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.map(DraftSessionId::new))
    }

    /// Persist the current session id.
    pub fn set_current_session(&self, session: &DraftSessionId) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO draft_state (key, value) VALUES (?1, ?2)",
            params![Self::SESSION_KEY, session.as_str()],
        )?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row mapping helpers
// ---------------------------------------------------------------------------

fn player_exists(tx: &Transaction<'_>, player_id: PlayerId) -> Result<bool, rusqlite::Error> {
    tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM players WHERE id = ?1)",
        params![player_id],
        |row| row.get(0),
    )
}

fn map_pick_conflict(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::PickConflict
        }
        _ => StoreError::Sqlite(err),
    }
}

fn read_settings(conn: &Connection) -> Result<Option<LeagueSettings>, StoreError> {
    let row = conn
        .query_row(
            "SELECT total_teams, qb_slots, rb_slots, wr_slots, te_slots, flex_slots, flex_eligibility
             FROM league_settings WHERE id = 1",
            [],
            |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, u32>(3)?,
                    row.get::<_, u32>(4)?,
                    row.get::<_, u32>(5)?,
                    row.get::<_, String>(6)?,
                ))
            },
        )
        .optional()?;

    let Some((total_teams, qb, rb, wr, te, flex, eligibility_json)) = row else {
        return Ok(None);
    };

    let flex_eligibility: Vec<Position> = serde_json::from_str(&eligibility_json)?;
    Ok(Some(LeagueSettings {
        total_teams,
        qb_slots: qb,
        rb_slots: rb,
        wr_slots: wr,
        te_slots: te,
        flex_slots: flex,
        flex_eligibility,
    }))
}

fn write_settings(conn: &Connection, settings: &LeagueSettings) -> Result<(), StoreError> {
    let eligibility_json = serde_json::to_string(&settings.flex_eligibility)?;
    conn.execute(
        "INSERT INTO league_settings
            (id, total_teams, qb_slots, rb_slots, wr_slots, te_slots, flex_slots, flex_eligibility)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
            total_teams      = excluded.total_teams,
            qb_slots         = excluded.qb_slots,
            rb_slots         = excluded.rb_slots,
            wr_slots         = excluded.wr_slots,
            te_slots         = excluded.te_slots,
            flex_slots       = excluded.flex_slots,
            flex_eligibility = excluded.flex_eligibility",
        params![
            settings.total_teams,
            settings.qb_slots,
            settings.rb_slots,
            settings.wr_slots,
            settings.te_slots,
            settings.flex_slots,
            eligibility_json,
        ],
    )?;
    Ok(())
}

fn read_players(conn: &Connection, session: &DraftSessionId) -> Result<Vec<Player>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.name, p.position, p.team, p.projected_points, p.bye_week,
                p.predicted_pick, p.target_status, dp.pick_number
         FROM players p
         LEFT JOIN draft_picks dp
           ON dp.player_id = p.id AND dp.session_id = ?1
         ORDER BY p.id",
    )?;

    let rows = stmt.query_map(params![session.as_str()], |row| {
        Ok((
            row.get::<_, PlayerId>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<f64>>(4)?,
            row.get::<_, u32>(5)?,
            row.get::<_, Option<u32>>(6)?,
            row.get::<_, String>(7)?,
            row.get::<_, Option<u32>>(8)?,
        ))
    })?;

    let mut players = Vec::new();
    for row in rows {
        let (id, name, position, team, projected_points, bye_week, predicted_pick, status, pick) =
            row?;
        let position = Position::from_str_pos(&position)
            .ok_or_else(|| StoreError::BadStoredPosition(position.clone()))?;
        let target_status = TargetStatus::from_str_status(&status)
            .ok_or_else(|| StoreError::BadStoredStatus(status.clone()))?;
        players.push(Player {
            id,
            name,
            position,
            team,
            projected_points,
            bye_week,
            predicted_pick,
            target_status,
            pick_number: pick,
        });
    }
    Ok(players)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
