//! The normalized rows produced for one page.
//!
//! A [`BoxscoreRecords`] is filled in by every extraction pass and committed once.
//! Until commit, a team record is keyed by its [`Side`]; the store assigns the
//! generated `team_game_record` id when the set is written.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;
use strum_macros::{Display, EnumIter};

use crate::box_score::columns::{PitcherOfRecord, PlayerStat, TeamStat};
use crate::box_score::identity::{IdentityRegistry, Person, PersonId, PersonKind};

#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Display, EnumIter, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Away,
    Home,
}

impl Side {
    /// Splits an annotation identifier such as `2bvisitor` into its side and statistic key.
    pub fn split_suffix(id: &str) -> (Option<Self>, &str) {
        if let Some(key) = id.strip_suffix("visitor") {
            (Some(Self::Away), key)
        } else if let Some(key) = id.strip_suffix("home") {
            (Some(Self::Home), key)
        } else {
            (None, id)
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize)]
pub struct Matchup<T> {
    pub away: T,
    pub home: T,
}

impl<T> Matchup<T> {
    pub const fn new(away: T, home: T) -> Self {
        Self { away, home }
    }

    pub const fn get(&self, side: Side) -> &T {
        match side {
            Side::Away => &self.away,
            Side::Home => &self.home,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Away => &mut self.away,
            Side::Home => &mut self.home,
        }
    }
}

impl<T: Default> Default for Matchup<T> {
    fn default() -> Self {
        Self::new(T::default(), T::default())
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize)]
pub struct GameMeta {
    pub date: NaiveDateTime,
    pub venue: String,
    pub attendance: Option<u32>,
    pub duration_minutes: u32,
}

#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize)]
pub struct InningScore {
    pub inning: u32,
    pub runs: u32,
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize)]
pub struct TeamGameRecord {
    pub team_name: String,
    pub team_link: String,
    pub score: u32,
    pub hits: Option<u32>,
    pub errors: Option<u32>,
    pub left_on_base: Option<u32>,
    pub manager: PersonId,
    pub innings: Vec<InningScore>,
}

impl TeamGameRecord {
    pub fn add_stat(&mut self, stat: TeamStat, count: u32) {
        let field = match stat {
            TeamStat::LeftOnBase => &mut self.left_on_base,
        };
        *field = Some(field.unwrap_or_default() + count);
    }

    pub fn stat(&self, stat: TeamStat) -> Option<u32> {
        match stat {
            TeamStat::LeftOnBase => self.left_on_base,
        }
    }

    pub fn inning_runs(&self) -> u32 {
        self.innings.iter().map(|i| i.runs).sum()
    }
}

/// Where a fielding position came from. Batting-table positions outrank the pitching
/// table's literal `p`, whichever pass runs first.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSource {
    PitchingTable,
    BattingTable,
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize)]
pub struct PlayerGameRecord {
    pub player: PersonId,
    pub side: Side,
    pub fielding_position: Option<String>,
    #[serde(skip)]
    position_source: Option<PositionSource>,
    pub batting_order: Option<u32>,
    pub stats: BTreeMap<PlayerStat, u32>,
}

impl PlayerGameRecord {
    pub fn new(player: PersonId, side: Side) -> Self {
        Self {
            player,
            side,
            fielding_position: None,
            position_source: None,
            batting_order: None,
            stats: BTreeMap::new(),
        }
    }

    pub fn stat(&self, stat: PlayerStat) -> Option<u32> {
        self.stats.get(&stat).copied()
    }

    /// Table cells overwrite; a blank cell leaves the column null.
    pub fn set_stat(&mut self, stat: PlayerStat, value: Option<u32>) {
        match value {
            Some(v) => {
                self.stats.insert(stat, v);
            }
            None => {
                self.stats.remove(&stat);
            }
        }
    }

    /// Annotation events accumulate.
    pub fn add_stat(&mut self, stat: PlayerStat, count: u32) {
        *self.stats.entry(stat).or_default() += count;
    }

    pub fn set_fielding_position(&mut self, position: Option<String>, source: PositionSource) {
        let Some(position) = position else { return };
        if self.position_source.map_or(true, |current| source >= current) {
            self.fielding_position = Some(position);
            self.position_source = Some(source);
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize)]
pub struct UmpireGameRecord {
    pub name: String,
    pub position: String,
}

#[derive(Debug, Eq, PartialEq, Clone, Default, Serialize)]
pub struct PitchersOfRecord {
    pub winning: Option<PersonId>,
    pub losing: Option<PersonId>,
    pub saving: Option<PersonId>,
}

impl PitchersOfRecord {
    pub fn set(&mut self, role: PitcherOfRecord, player: PersonId) {
        let slot = match role {
            PitcherOfRecord::Winning => &mut self.winning,
            PitcherOfRecord::Losing => &mut self.losing,
            PitcherOfRecord::Saving => &mut self.saving,
        };
        *slot = Some(player);
    }
}

/// Non-fatal losses while reading annotation prose.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Default, Serialize)]
pub struct ExtractionReport {
    pub unresolved_names: usize,
    pub ambiguous_names: usize,
    pub dropped_events: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoxscoreRecords {
    pub link: String,
    pub meta: GameMeta,
    pub weather: Option<String>,
    pub teams: Matchup<TeamGameRecord>,
    pub pitchers: PitchersOfRecord,
    pub umpires: Vec<UmpireGameRecord>,
    pub people: IdentityRegistry,
    player_records: Matchup<Vec<PlayerGameRecord>>,
    pub report: ExtractionReport,
}

impl BoxscoreRecords {
    pub fn new(
        link: &str,
        meta: GameMeta,
        teams: Matchup<TeamGameRecord>,
        pitchers: PitchersOfRecord,
        people: IdentityRegistry,
    ) -> Self {
        Self {
            link: link.to_string(),
            meta,
            weather: None,
            teams,
            pitchers,
            umpires: vec![],
            people,
            player_records: Matchup::default(),
            report: ExtractionReport::default(),
        }
    }

    /// The game record for this player on this side, created on first reference.
    pub fn ensure_player_record(&mut self, side: Side, name: &str, link: &str) -> &mut PlayerGameRecord {
        let player = self.people.ensure(PersonKind::Player, name, link);
        let records = self.player_records.get_mut(side);
        let i = match records.iter().position(|r| r.player == player) {
            Some(i) => i,
            None => {
                records.push(PlayerGameRecord::new(player, side));
                records.len() - 1
            }
        };
        &mut records[i]
    }

    pub fn player_record(&self, side: Side, link: &str) -> Option<&PlayerGameRecord> {
        self.player_records.get(side).iter().find(|r| r.player == link)
    }

    pub fn player_record_mut(&mut self, side: Side, link: &str) -> Option<&mut PlayerGameRecord> {
        self.player_records
            .get_mut(side)
            .iter_mut()
            .find(|r| r.player == link)
    }

    pub fn player_records(&self, side: Side) -> &[PlayerGameRecord] {
        self.player_records.get(side)
    }

    /// People with a game record on the given side (or either side), in creation order.
    pub fn candidates(&self, side: Option<Side>) -> Vec<(Side, &Person)> {
        let sides = match side {
            Some(s) => vec![s],
            None => vec![Side::Away, Side::Home],
        };
        sides
            .into_iter()
            .flat_map(|s| {
                self.player_records
                    .get(s)
                    .iter()
                    .filter_map(move |r| self.people.get(PersonKind::Player, &r.player).map(|p| (s, p)))
            })
            .collect()
    }
}
