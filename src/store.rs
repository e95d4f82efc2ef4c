//! Writes an extracted record set to storage.
//!
//! A [`Store`] hands out one [`StoreTransaction`] per document. Everything a page
//! produces goes through that transaction, so a failure part way leaves no trace of
//! the page behind.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::box_score::error::ExtractError;
use crate::box_score::identity::{Person, PersonId, PersonKind};
use crate::box_score::records::{
    BoxscoreRecords, InningScore, Matchup, PlayerGameRecord, Side, TeamGameRecord, UmpireGameRecord,
};

/// Generated key of a stored `team_game_record` row.
pub type TeamRecordId = i64;

/// The fields extraction fills in on an existing boxscore row.
#[derive(Debug, Eq, PartialEq, Clone, Serialize)]
pub struct BoxscoreUpdate {
    pub date: NaiveDateTime,
    pub venue: String,
    pub attendance: Option<u32>,
    pub duration_minutes: u32,
    pub weather: Option<String>,
    pub away_team_record: TeamRecordId,
    pub home_team_record: TeamRecordId,
    pub winning_pitcher: Option<PersonId>,
    pub losing_pitcher: Option<PersonId>,
    pub saving_pitcher: Option<PersonId>,
}

impl BoxscoreUpdate {
    pub fn new(records: &BoxscoreRecords, team_records: &Matchup<TeamRecordId>) -> Self {
        Self {
            date: records.meta.date,
            venue: records.meta.venue.clone(),
            attendance: records.meta.attendance,
            duration_minutes: records.meta.duration_minutes,
            weather: records.weather.clone(),
            away_team_record: team_records.away,
            home_team_record: team_records.home,
            winning_pitcher: records.pitchers.winning.clone(),
            losing_pitcher: records.pitchers.losing.clone(),
            saving_pitcher: records.pitchers.saving.clone(),
        }
    }
}

pub trait Store {
    type Transaction<'a>: StoreTransaction
    where
        Self: 'a;

    fn transaction(&mut self) -> Result<Self::Transaction<'_>>;
}

/// Dropping a transaction without calling [`StoreTransaction::commit`] discards its writes.
pub trait StoreTransaction {
    fn boxscore_exists(&mut self, link: &str) -> Result<bool>;

    /// Insert-if-absent keyed by link; an existing person is left untouched.
    fn ensure_person(&mut self, kind: PersonKind, person: &Person) -> Result<()>;

    /// Removes the team, inning, player and umpire rows a previous run attached to this boxscore.
    fn clear_game_records(&mut self, link: &str) -> Result<()>;

    fn insert_team_record(&mut self, team: &TeamGameRecord) -> Result<TeamRecordId>;

    fn insert_inning_score(&mut self, team_record: TeamRecordId, inning: &InningScore) -> Result<()>;

    fn insert_player_record(&mut self, team_record: TeamRecordId, record: &PlayerGameRecord) -> Result<()>;

    fn insert_umpire(&mut self, link: &str, umpire: &UmpireGameRecord) -> Result<()>;

    fn update_boxscore(&mut self, link: &str, update: &BoxscoreUpdate) -> Result<()>;

    fn commit(self) -> Result<()>;
}

/// Writes one page's records in a single transaction, replacing any earlier run of the same page.
pub fn persist<S: Store>(store: &mut S, records: &BoxscoreRecords) -> Result<()> {
    let mut tx = store.transaction()?;
    if !tx.boxscore_exists(&records.link)? {
        return Err(ExtractError::UnregisteredBoxscore(records.link.clone()).into());
    }

    for kind in [PersonKind::Manager, PersonKind::Player] {
        for person in records.people.people(kind) {
            tx.ensure_person(kind, person)?;
        }
    }

    tx.clear_game_records(&records.link)?;
    let mut team_records = Matchup::<TeamRecordId>::default();
    for side in [Side::Away, Side::Home] {
        let team = records.teams.get(side);
        let id = tx.insert_team_record(team)?;
        for inning in &team.innings {
            tx.insert_inning_score(id, inning)?;
        }
        for record in records.player_records(side) {
            tx.insert_player_record(id, record)?;
        }
        *team_records.get_mut(side) = id;
    }
    for umpire in &records.umpires {
        tx.insert_umpire(&records.link, umpire)?;
    }
    tx.update_boxscore(&records.link, &BoxscoreUpdate::new(records, &team_records))?;
    tx.commit()
}
