use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use itertools::Itertools;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use strum::IntoEnumIterator;
use tracing::debug;

use crate::box_score::columns::PlayerStat;
use crate::box_score::identity::{Person, PersonKind};
use crate::box_score::records::{InningScore, PlayerGameRecord, TeamGameRecord, UmpireGameRecord};
use crate::store::{BoxscoreUpdate, Store, StoreTransaction, TeamRecordId};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS manager (
        first_name VARCHAR(511),
        last_name VARCHAR(511),
        link VARCHAR(1023) PRIMARY KEY
    );

    CREATE TABLE IF NOT EXISTS player (
        first_name VARCHAR(511),
        last_name VARCHAR(511),
        link VARCHAR(1023) PRIMARY KEY
    );

    CREATE TABLE IF NOT EXISTS boxscore (
        team_one_name VARCHAR(125),
        team_two_name VARCHAR(125),
        date DATETIME,
        link VARCHAR(1023) PRIMARY KEY,
        html_path VARCHAR(1023),
        attendance INTEGER,
        game_time INTEGER,
        field_used VARCHAR(255),
        away_team_game_record INTEGER,
        home_team_game_record INTEGER,
        winning_pitcher VARCHAR(1023),
        losing_pitcher VARCHAR(1023),
        saving_pitcher VARCHAR(1023),
        weather_description VARCHAR(1023)
    );

    CREATE TABLE IF NOT EXISTS team_game_record (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        team_name VARCHAR(125),
        team_link VARCHAR(1023),
        score INTEGER,
        hits INTEGER,
        errors INTEGER,
        left_on_base INTEGER,
        manager VARCHAR(1023) REFERENCES manager(link)
    );

    CREATE TABLE IF NOT EXISTS inning_score (
        game_record_id INTEGER REFERENCES team_game_record(id),
        inning INTEGER,
        score INTEGER
    );

    CREATE TABLE IF NOT EXISTS umpire_game_record (
        name VARCHAR(255),
        boxscore_link VARCHAR(1023) REFERENCES boxscore(link),
        position VARCHAR(7)
    );

    CREATE INDEX IF NOT EXISTS idx_inning_score_record ON inning_score(game_record_id);
    CREATE INDEX IF NOT EXISTS idx_umpire_boxscore ON umpire_game_record(boxscore_link);
"#;

/// `player_game_record` has one column per [`PlayerStat`], so its DDL is generated.
fn player_game_record_schema() -> String {
    let stats = PlayerStat::iter().map(|s| format!("{s} INTEGER")).join(",\n        ");
    format!(
        "CREATE TABLE IF NOT EXISTS player_game_record (
        game_record_id INTEGER REFERENCES team_game_record(id),
        player_link VARCHAR(1023) REFERENCES player(link),
        fielding_pos VARCHAR(7),
        batting_pos INTEGER,
        {stats}
    );
    CREATE INDEX IF NOT EXISTS idx_player_game_record_record ON player_game_record(game_record_id);"
    )
}

fn person_table(kind: PersonKind) -> &'static str {
    match kind {
        PersonKind::Player => "player",
        PersonKind::Manager => "manager",
    }
}

fn opt_int(v: Option<u32>) -> Value {
    v.map_or(Value::Null, |v| Value::Integer(v.into()))
}

fn opt_text(v: Option<&str>) -> Value {
    v.map_or(Value::Null, |v| Value::Text(v.to_string()))
}

/// A registered boxscore still waiting for (or open to) extraction.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PendingBoxscore {
    pub link: String,
    pub html_path: Option<String>,
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Unable to open database {}", path.display()))?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        self.conn.execute_batch(&player_game_record_schema())?;
        Ok(())
    }

    /// Creates the boxscore row extraction later fills in. Returns false if the link was already known.
    pub fn register_boxscore(&self, link: &str, html_path: Option<&str>, date: NaiveDateTime) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO boxscore (link, html_path, date) VALUES (?1, ?2, ?3)",
            params![link, html_path, date.format(DATE_FORMAT).to_string()],
        )?;
        Ok(inserted > 0)
    }

    /// Registered boxscores, by default only those no extraction has filled in yet.
    pub fn pending_boxscores(&self, include_extracted: bool) -> Result<Vec<PendingBoxscore>> {
        let sql = if include_extracted {
            "SELECT link, html_path FROM boxscore ORDER BY link"
        } else {
            "SELECT link, html_path FROM boxscore WHERE away_team_game_record IS NULL ORDER BY link"
        };
        let mut stmt = self.conn.prepare(sql)?;
        let pending = stmt
            .query_map([], |row| {
                Ok(PendingBoxscore {
                    link: row.get(0)?,
                    html_path: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(pending)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

pub struct SqliteTransaction<'a> {
    tx: rusqlite::Transaction<'a>,
}

impl Store for SqliteStore {
    type Transaction<'a> = SqliteTransaction<'a>;

    fn transaction(&mut self) -> Result<Self::Transaction<'_>> {
        Ok(SqliteTransaction {
            tx: self.conn.transaction()?,
        })
    }
}

impl StoreTransaction for SqliteTransaction<'_> {
    fn boxscore_exists(&mut self, link: &str) -> Result<bool> {
        let found = self
            .tx
            .query_row("SELECT 1 FROM boxscore WHERE link = ?1", params![link], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn ensure_person(&mut self, kind: PersonKind, person: &Person) -> Result<()> {
        let sql = format!(
            "INSERT OR IGNORE INTO {} (first_name, last_name, link) VALUES (?1, ?2, ?3)",
            person_table(kind)
        );
        self.tx
            .execute(&sql, params![person.first_name, person.last_name, person.link])?;
        Ok(())
    }

    fn clear_game_records(&mut self, link: &str) -> Result<()> {
        let stale: Option<(Option<i64>, Option<i64>)> = self
            .tx
            .query_row(
                "SELECT away_team_game_record, home_team_game_record FROM boxscore WHERE link = ?1",
                params![link],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        for id in stale.into_iter().flat_map(|(away, home)| [away, home]).flatten() {
            debug!("Clearing team game record {id} of {link}");
            self.tx
                .execute("DELETE FROM inning_score WHERE game_record_id = ?1", params![id])?;
            self.tx
                .execute("DELETE FROM player_game_record WHERE game_record_id = ?1", params![id])?;
            self.tx
                .execute("DELETE FROM team_game_record WHERE id = ?1", params![id])?;
        }
        self.tx
            .execute("DELETE FROM umpire_game_record WHERE boxscore_link = ?1", params![link])?;
        Ok(())
    }

    fn insert_team_record(&mut self, team: &TeamGameRecord) -> Result<TeamRecordId> {
        self.tx.execute(
            "INSERT INTO team_game_record (team_name, team_link, score, hits, errors, left_on_base, manager)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                team.team_name,
                team.team_link,
                team.score,
                team.hits,
                team.errors,
                team.left_on_base,
                team.manager
            ],
        )?;
        Ok(self.tx.last_insert_rowid())
    }

    fn insert_inning_score(&mut self, team_record: TeamRecordId, inning: &InningScore) -> Result<()> {
        self.tx.execute(
            "INSERT INTO inning_score (game_record_id, inning, score) VALUES (?1, ?2, ?3)",
            params![team_record, inning.inning, inning.runs],
        )?;
        Ok(())
    }

    fn insert_player_record(&mut self, team_record: TeamRecordId, record: &PlayerGameRecord) -> Result<()> {
        let columns = ["game_record_id", "player_link", "fielding_pos", "batting_pos"]
            .into_iter()
            .map(str::to_string)
            .chain(PlayerStat::iter().map(|s| s.to_string()))
            .collect::<Vec<String>>();
        let values = [
            Value::Integer(team_record),
            Value::Text(record.player.clone()),
            opt_text(record.fielding_position.as_deref()),
            opt_int(record.batting_order),
        ]
        .into_iter()
        .chain(PlayerStat::iter().map(|s| opt_int(record.stat(s))))
        .collect::<Vec<Value>>();
        let sql = format!(
            "INSERT INTO player_game_record ({}) VALUES ({})",
            columns.join(", "),
            (1..=columns.len()).map(|i| format!("?{i}")).join(", ")
        );
        self.tx.execute(&sql, params_from_iter(values))?;
        Ok(())
    }

    fn insert_umpire(&mut self, link: &str, umpire: &UmpireGameRecord) -> Result<()> {
        self.tx.execute(
            "INSERT INTO umpire_game_record (name, boxscore_link, position) VALUES (?1, ?2, ?3)",
            params![umpire.name, link, umpire.position],
        )?;
        Ok(())
    }

    fn update_boxscore(&mut self, link: &str, update: &BoxscoreUpdate) -> Result<()> {
        self.tx.execute(
            "UPDATE boxscore SET date = ?2, field_used = ?3, attendance = ?4, game_time = ?5,
                weather_description = ?6, away_team_game_record = ?7, home_team_game_record = ?8,
                winning_pitcher = ?9, losing_pitcher = ?10, saving_pitcher = ?11
             WHERE link = ?1",
            params![
                link,
                update.date.format(DATE_FORMAT).to_string(),
                update.venue,
                update.attendance,
                update.duration_minutes,
                update.weather,
                update.away_team_record,
                update.home_team_record,
                update.winning_pitcher,
                update.losing_pitcher,
                update.saving_pitcher
            ],
        )?;
        Ok(())
    }

    fn commit(self) -> Result<()> {
        self.tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::box_score::records::Side;

    fn midnight() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2013, 4, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn count(store: &SqliteStore, table: &str) -> i64 {
        store
            .connection()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_schema_is_reentrant() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.init_schema().unwrap();
        assert_eq!(count(&store, "player_game_record"), 0);
    }

    #[test]
    fn test_register_and_pending() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store
            .register_boxscore("/boxes/ATL/ATL201304020.shtml", Some("ATL201304020.shtml"), midnight())
            .unwrap());
        assert!(!store
            .register_boxscore("/boxes/ATL/ATL201304020.shtml", None, midnight())
            .unwrap());
        let pending = store.pending_boxscores(false).unwrap();
        assert_eq!(
            pending,
            vec![PendingBoxscore {
                link: "/boxes/ATL/ATL201304020.shtml".into(),
                html_path: Some("ATL201304020.shtml".into()),
            }]
        );
    }

    #[test]
    fn test_duplicate_person_and_rollback() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        {
            let mut tx = store.transaction().unwrap();
            tx.ensure_person(PersonKind::Player, &Person::new("Chase Utley", "/u"))
                .unwrap();
            tx.ensure_person(PersonKind::Player, &Person::new("C. Utley", "/u"))
                .unwrap();
            tx.commit().unwrap();
        }
        {
            let mut tx = store.transaction().unwrap();
            tx.ensure_person(PersonKind::Player, &Person::new("Ryan Howard", "/h"))
                .unwrap();
        }
        assert_eq!(count(&store, "player"), 1);
        let first: String = store
            .connection()
            .query_row("SELECT first_name FROM player WHERE link = '/u'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(first, "Chase");
    }

    #[test]
    fn test_player_record_columns() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let team = TeamGameRecord {
            team_name: "Phillies".into(),
            team_link: "/teams/PHI/2013.shtml".into(),
            score: 2,
            hits: Some(7),
            errors: Some(2),
            left_on_base: None,
            manager: "/managers/manuech01.shtml".into(),
            innings: vec![],
        };
        let mut record = PlayerGameRecord::new("/u".into(), Side::Away);
        record.set_stat(PlayerStat::GroundedIntoDoublePlay, Some(1));
        record.batting_order = Some(2);

        let mut tx = store.transaction().unwrap();
        tx.ensure_person(PersonKind::Manager, &Person::new("Charlie Manuel", "/managers/manuech01.shtml"))
            .unwrap();
        tx.ensure_person(PersonKind::Player, &Person::new("Chase Utley", "/u"))
            .unwrap();
        let id = tx.insert_team_record(&team).unwrap();
        tx.insert_player_record(id, &record).unwrap();
        tx.commit().unwrap();
        let (order, gidp, hits): (Option<u32>, Option<u32>, Option<u32>) = store
            .connection()
            .query_row(
                "SELECT batting_pos, grounded_into_double_play, hits FROM player_game_record WHERE game_record_id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!((order, gidp, hits), (Some(2), Some(1), None));
    }
}
