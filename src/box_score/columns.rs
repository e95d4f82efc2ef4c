//! Lookup tables mapping page field identifiers onto persisted columns.
//!
//! These stay plain data so the mapping can be audited (and tested) without
//! reading the extractors.

use serde::Serialize;
use strum_macros::{Display, EnumIter, EnumString};

use crate::box_score::records::Side;

/// A persisted `player_game_record` statistic column.
#[derive(
    Debug, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Display, EnumIter, EnumString, Serialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlayerStat {
    AtBats,
    RunsScored,
    Hits,
    RunsBattedIn,
    BasesOnBalls,
    IntentionalBasesOnBalls,
    HitByPitch,
    HittingStrikeOuts,
    GroundedIntoDoublePlay,
    PlateAppearances,
    Doubles,
    Triples,
    HomeRuns,
    StrikesSeen,
    PitchesSeen,
    InningsPitchedWhole,
    InningsPitchedPart,
    HitsAllowed,
    RunsAllowed,
    EarnedRunsAllowed,
    HomeRunsAllowed,
    BasesOnBallsAllowed,
    PitchingStrikeOuts,
    BattersFaced,
    PitchesThrown,
    StrikesTotal,
    StrikesContact,
    StrikesSwinging,
    StrikesLooking,
    GroundBalls,
    FlyBalls,
    LineDrives,
    InheritedRunners,
    PutOuts,
    Assists,
    DoublePlays,
    Errors,
}

/// A `team_game_record` column that annotation blocks can feed.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Display, EnumIter, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TeamStat {
    LeftOnBase,
}

/// Header identifier of the player cell in batting and pitching tables.
pub const PLAYER_COLUMN: &str = "player";
/// Header identifier of a decorative spacer column.
pub const BLANK_COLUMN: &str = "blank";
/// Name-cell text of the summary row at the bottom of every stat table.
pub const TEAM_TOTALS: &str = "Team Totals";

pub const AT_BATS_COLUMN: &str = "ab";
pub const INNINGS_PITCHED_COLUMN: &str = "ip";

pub const HITTING_COLUMNS: [(&str, PlayerStat); 10] = [
    ("a", PlayerStat::Assists),
    ("bb", PlayerStat::BasesOnBalls),
    ("h", PlayerStat::Hits),
    ("pa", PlayerStat::PlateAppearances),
    ("so", PlayerStat::HittingStrikeOuts),
    ("rbi", PlayerStat::RunsBattedIn),
    ("r", PlayerStat::RunsScored),
    ("po", PlayerStat::PutOuts),
    ("strikes_total", PlayerStat::StrikesSeen),
    ("pitches", PlayerStat::PitchesSeen),
];

// `ip` is decoded into the whole/part pair before this table is consulted.
pub const PITCHING_COLUMNS: [(&str, PlayerStat); 16] = [
    ("h", PlayerStat::HitsAllowed),
    ("r", PlayerStat::RunsAllowed),
    ("er", PlayerStat::EarnedRunsAllowed),
    ("bb", PlayerStat::BasesOnBallsAllowed),
    ("so", PlayerStat::PitchingStrikeOuts),
    ("hr", PlayerStat::HomeRunsAllowed),
    ("batters_faced", PlayerStat::BattersFaced),
    ("pitches", PlayerStat::PitchesThrown),
    ("strikes_total", PlayerStat::StrikesTotal),
    ("strikes_contact", PlayerStat::StrikesContact),
    ("strikes_swinging", PlayerStat::StrikesSwinging),
    ("strikes_looking", PlayerStat::StrikesLooking),
    ("inplay_gb_total", PlayerStat::GroundBalls),
    ("inplay_fb_total", PlayerStat::FlyBalls),
    ("inplay_ld", PlayerStat::LineDrives),
    ("inherited_runners", PlayerStat::InheritedRunners),
];

/// Derived or redundant table columns that are never persisted.
pub const SKIPPED_COLUMNS: [&str; 17] = [
    "batting_avg",
    "onbase_perc",
    "slugging_perc",
    "onbase_plus_slugging",
    "wpa_bat_neg",
    "details",
    "wpa_bat_pos",
    "wpa_bat",
    "re24_bat",
    "leverage_index_avg",
    "earned_run_avg",
    "inplay_unk",
    "game_score",
    "inherited_score",
    "wpa_def",
    "re24_def",
    BLANK_COLUMN,
];

/// Batting-order and player columns of the starting lineups table, per side.
pub const LINEUP_COLUMNS: [(Side, &str, &str); 2] = [
    (Side::Away, "bat_order_visitor", "player_visitor"),
    (Side::Home, "bat_order_home", "player_home"),
];

pub const ANNOTATION_PLAYER_COLUMNS: [(&str, PlayerStat); 8] = [
    ("2b", PlayerStat::Doubles),
    ("3b", PlayerStat::Triples),
    ("hr", PlayerStat::HomeRuns),
    ("ibb", PlayerStat::IntentionalBasesOnBalls),
    ("hbp", PlayerStat::HitByPitch),
    ("gidp", PlayerStat::GroundedIntoDoublePlay),
    ("dp", PlayerStat::DoublePlays),
    ("errors", PlayerStat::Errors),
];

pub const ANNOTATION_TEAM_COLUMNS: [(&str, TeamStat); 1] = [("teamlob", TeamStat::LeftOnBase)];

pub const SKIPPED_ANNOTATIONS: [&str; 2] = ["tb", "teamrisp"];

/// Keys given, in order, to annotation text that carries no identifier.
pub const POSITIONAL_BLOCK_ORDER: [PositionalBlock; 5] = [
    PositionalBlock::Umpires,
    PositionalBlock::GameTime,
    PositionalBlock::Attendance,
    PositionalBlock::FieldCondition,
    PositionalBlock::Weather,
];

#[derive(Debug, Eq, PartialEq, Copy, Clone, Display)]
#[strum(serialize_all = "snake_case")]
pub enum PositionalBlock {
    Umpires,
    GameTime,
    Attendance,
    FieldCondition,
    Weather,
}

/// Positional fields of a team summary cell. Only some of them are kept.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SummaryField {
    TeamShortName,
    Score,
    Record,
    Links,
    Standings,
    Manager,
}

pub const TEAM_SUMMARY_ORDER: [SummaryField; 6] = [
    SummaryField::TeamShortName,
    SummaryField::Score,
    SummaryField::Record,
    SummaryField::Links,
    SummaryField::Standings,
    SummaryField::Manager,
];

#[derive(Debug, Eq, PartialEq, Copy, Clone, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PitcherOfRecord {
    Winning,
    Losing,
    Saving,
}

pub const PITCHER_ORDER: [PitcherOfRecord; 3] = [
    PitcherOfRecord::Winning,
    PitcherOfRecord::Losing,
    PitcherOfRecord::Saving,
];

pub const MONTHS: [(&str, u32); 12] = [
    ("January", 1),
    ("February", 2),
    ("March", 3),
    ("April", 4),
    ("May", 5),
    ("June", 6),
    ("July", 7),
    ("August", 8),
    ("September", 9),
    ("October", 10),
    ("November", 11),
    ("December", 12),
];

fn lookup<T: Copy>(table: &[(&str, T)], key: &str) -> Option<T> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

pub fn hitting_column(key: &str) -> Option<PlayerStat> {
    lookup(&HITTING_COLUMNS, key)
}

pub fn pitching_column(key: &str) -> Option<PlayerStat> {
    lookup(&PITCHING_COLUMNS, key)
}

pub fn annotation_player_column(key: &str) -> Option<PlayerStat> {
    lookup(&ANNOTATION_PLAYER_COLUMNS, key)
}

pub fn annotation_team_column(key: &str) -> Option<TeamStat> {
    lookup(&ANNOTATION_TEAM_COLUMNS, key)
}

pub fn month_number(name: &str) -> Option<u32> {
    lookup(&MONTHS, name)
}

pub fn is_skipped_column(key: &str) -> bool {
    SKIPPED_COLUMNS.contains(&key)
}

pub fn is_skipped_annotation(key: &str) -> bool {
    SKIPPED_ANNOTATIONS.contains(&key)
}
