use std::collections::BTreeMap;

use anyhow::Result;
use chrono::NaiveDateTime;

use crate::box_score::identity::{Person, PersonId, PersonKind};
use crate::box_score::records::{InningScore, PlayerGameRecord, TeamGameRecord, UmpireGameRecord};
use crate::store::{BoxscoreUpdate, Store, StoreTransaction, TeamRecordId};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BoxscoreRow {
    pub html_path: Option<String>,
    pub date: NaiveDateTime,
    pub update: Option<BoxscoreUpdate>,
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
struct Tables {
    boxscores: BTreeMap<String, BoxscoreRow>,
    players: BTreeMap<PersonId, Person>,
    managers: BTreeMap<PersonId, Person>,
    team_records: BTreeMap<TeamRecordId, TeamGameRecord>,
    inning_scores: Vec<(TeamRecordId, InningScore)>,
    player_records: Vec<(TeamRecordId, PlayerGameRecord)>,
    umpires: Vec<(String, UmpireGameRecord)>,
    last_team_id: TeamRecordId,
}

impl Tables {
    fn people_mut(&mut self, kind: PersonKind) -> &mut BTreeMap<PersonId, Person> {
        match kind {
            PersonKind::Player => &mut self.players,
            PersonKind::Manager => &mut self.managers,
        }
    }
}

/// Keeps every table in memory. Transactions work on a copy that replaces the
/// tables on commit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Tables,
}

impl MemoryStore {
    pub fn register_boxscore(&mut self, link: &str, html_path: Option<&str>, date: NaiveDateTime) {
        self.tables
            .boxscores
            .entry(link.to_string())
            .or_insert_with(|| BoxscoreRow {
                html_path: html_path.map(str::to_string),
                date,
                update: None,
            });
    }

    pub fn boxscore(&self, link: &str) -> Option<&BoxscoreRow> {
        self.tables.boxscores.get(link)
    }

    pub fn person(&self, kind: PersonKind, link: &str) -> Option<&Person> {
        match kind {
            PersonKind::Player => self.tables.players.get(link),
            PersonKind::Manager => self.tables.managers.get(link),
        }
    }

    pub fn people_count(&self, kind: PersonKind) -> usize {
        match kind {
            PersonKind::Player => self.tables.players.len(),
            PersonKind::Manager => self.tables.managers.len(),
        }
    }

    pub fn team_record(&self, id: TeamRecordId) -> Option<&TeamGameRecord> {
        self.tables.team_records.get(&id)
    }

    pub fn team_record_count(&self) -> usize {
        self.tables.team_records.len()
    }

    pub fn inning_scores(&self, team_record: TeamRecordId) -> Vec<&InningScore> {
        self.tables
            .inning_scores
            .iter()
            .filter(|(id, _)| *id == team_record)
            .map(|(_, inning)| inning)
            .collect()
    }

    pub fn player_records(&self, team_record: TeamRecordId) -> Vec<&PlayerGameRecord> {
        self.tables
            .player_records
            .iter()
            .filter(|(id, _)| *id == team_record)
            .map(|(_, record)| record)
            .collect()
    }

    pub fn player_record_count(&self) -> usize {
        self.tables.player_records.len()
    }

    pub fn umpires(&self, link: &str) -> Vec<&UmpireGameRecord> {
        self.tables
            .umpires
            .iter()
            .filter(|(l, _)| l == link)
            .map(|(_, umpire)| umpire)
            .collect()
    }
}

pub struct MemoryTransaction<'a> {
    committed: &'a mut Tables,
    working: Tables,
}

impl Store for MemoryStore {
    type Transaction<'a> = MemoryTransaction<'a>;

    fn transaction(&mut self) -> Result<Self::Transaction<'_>> {
        let working = self.tables.clone();
        Ok(MemoryTransaction {
            committed: &mut self.tables,
            working,
        })
    }
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn boxscore_exists(&mut self, link: &str) -> Result<bool> {
        Ok(self.working.boxscores.contains_key(link))
    }

    fn ensure_person(&mut self, kind: PersonKind, person: &Person) -> Result<()> {
        self.working
            .people_mut(kind)
            .entry(person.link.clone())
            .or_insert_with(|| person.clone());
        Ok(())
    }

    fn clear_game_records(&mut self, link: &str) -> Result<()> {
        let Some(update) = self.working.boxscores.get(link).and_then(|b| b.update.as_ref()) else {
            return Ok(());
        };
        let stale = [update.away_team_record, update.home_team_record];
        let tables = &mut self.working;
        tables.team_records.retain(|id, _| !stale.contains(id));
        tables.inning_scores.retain(|(id, _)| !stale.contains(id));
        tables.player_records.retain(|(id, _)| !stale.contains(id));
        tables.umpires.retain(|(l, _)| l != link);
        Ok(())
    }

    fn insert_team_record(&mut self, team: &TeamGameRecord) -> Result<TeamRecordId> {
        self.working.last_team_id += 1;
        let id = self.working.last_team_id;
        let row = TeamGameRecord {
            innings: vec![],
            ..team.clone()
        };
        self.working.team_records.insert(id, row);
        Ok(id)
    }

    fn insert_inning_score(&mut self, team_record: TeamRecordId, inning: &InningScore) -> Result<()> {
        self.working.inning_scores.push((team_record, *inning));
        Ok(())
    }

    fn insert_player_record(&mut self, team_record: TeamRecordId, record: &PlayerGameRecord) -> Result<()> {
        self.working.player_records.push((team_record, record.clone()));
        Ok(())
    }

    fn insert_umpire(&mut self, link: &str, umpire: &UmpireGameRecord) -> Result<()> {
        self.working.umpires.push((link.to_string(), umpire.clone()));
        Ok(())
    }

    fn update_boxscore(&mut self, link: &str, update: &BoxscoreUpdate) -> Result<()> {
        if let Some(row) = self.working.boxscores.get_mut(link) {
            row.date = update.date;
            row.update = Some(update.clone());
        }
        Ok(())
    }

    fn commit(self) -> Result<()> {
        *self.committed = self.working;
        Ok(())
    }
}
