//! Batting, pitching and lineup tables.
//!
//! Every table is read the same way: header cells name the columns, data rows are
//! decoded cell by cell against them. Table values are *set* on the player's game
//! record, so running the passes in any order leaves the same record behind.

use lazy_static::lazy_static;
use scraper::{ElementRef, Selector};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};
use tracing::{debug, warn};

use crate::box_score::columns::{
    hitting_column, is_skipped_column, pitching_column, PlayerStat, AT_BATS_COLUMN,
    INNINGS_PITCHED_COLUMN, LINEUP_COLUMNS, PLAYER_COLUMN, TEAM_TOTALS,
};
use crate::box_score::error::{Mismatch, PageResult};
use crate::box_score::navigator::{advance, text_of, Anchor, Axis, LinkRef};
use crate::box_score::records::{BoxscoreRecords, PositionSource, Side};
use crate::util::{parse_int, parse_positive_int};

lazy_static! {
    // The first stats table lists the day's other games.
    static ref STAT_TABLES: Anchor = Anchor::new("stat tables", "table.stats_table", 1);
    static ref HEADER: Selector = Selector::parse("th[data-stat]").unwrap();
    static ref ROW: Selector = Selector::parse("tr").unwrap();
    static ref CELL: Selector = Selector::parse("td").unwrap();
    static ref PLAYER_ANCHOR: Selector = Selector::parse("a[href]").unwrap();
}

const PITCHER_POSITION: &str = "p";

#[derive(Debug, Eq, PartialEq, Copy, Clone, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum StatTable {
    AwayBatting,
    HomeBatting,
    AwayPitching,
    HomePitching,
    Lineups,
}

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
enum TableKind {
    Batting,
    Pitching,
    Lineups,
}

impl StatTable {
    fn kind(self) -> TableKind {
        match self {
            Self::AwayBatting | Self::HomeBatting => TableKind::Batting,
            Self::AwayPitching | Self::HomePitching => TableKind::Pitching,
            Self::Lineups => TableKind::Lineups,
        }
    }

    fn side(self) -> Side {
        match self {
            Self::AwayBatting | Self::AwayPitching => Side::Away,
            // Lineups carry both sides; this is never consulted for them.
            Self::HomeBatting | Self::HomePitching | Self::Lineups => Side::Home,
        }
    }
}

/// `"5.2"` is five full innings and two outs, not five and two tenths.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct InningsPitched {
    pub whole: u32,
    pub part: u32,
}

impl InningsPitched {
    pub fn parse(cell: &str) -> Option<Self> {
        let cell = cell.trim();
        let (whole, part) = match cell.split_once('.') {
            Some((whole, part)) => (parse_int::<u32>(whole)?, parse_int::<u32>(part)?),
            None => (parse_int::<u32>(cell)?, 0),
        };
        (part < 3).then_some(Self { whole, part })
    }

    pub const fn outs(self) -> u32 {
        self.whole * 3 + self.part
    }
}

/// Header identifiers in column order.
fn column_map(table: ElementRef) -> Vec<String> {
    table
        .select(&HEADER)
        .filter_map(|th| th.value().attr("data-stat"))
        .map(str::to_string)
        .collect()
}

fn data_rows<'a>(table: ElementRef<'a>) -> impl Iterator<Item = Vec<ElementRef<'a>>> + 'a {
    table
        .select(&ROW)
        .map(|tr| tr.select(&CELL).collect::<Vec<ElementRef>>())
        .filter(|cells| !cells.is_empty())
}

fn column_index(columns: &[String], name: &str, table: StatTable) -> PageResult<usize> {
    columns
        .iter()
        .position(|c| c == name)
        .ok_or_else(|| Mismatch::new(table.to_string(), format!("no {name} column")))
}

/// The player anchor of a name cell and whatever text trails it.
fn player_cell(cell: ElementRef) -> Option<(LinkRef, String)> {
    if text_of(cell) == TEAM_TOTALS {
        return None;
    }
    let anchor = cell.select(&PLAYER_ANCHOR).next()?;
    let link = LinkRef::from_anchor(anchor, PLAYER_COLUMN).ok()?;
    let trailing = advance(*anchor, 1, Axis::Sibling)
        .and_then(|n| n.value().as_text().map(|t| t.to_string()))
        .unwrap_or_default();
    Some((link, trailing))
}

pub fn extract_stat_tables(root: ElementRef, records: &mut BoxscoreRecords) -> PageResult<()> {
    let tables = STAT_TABLES.find_all(root);
    if tables.len() < StatTable::iter().count() {
        return Err(Mismatch::new(
            STAT_TABLES.name,
            format!("expected {} tables, found {}", StatTable::iter().count(), tables.len()),
        ));
    }
    for (table, el) in StatTable::iter().zip(tables) {
        match table.kind() {
            TableKind::Lineups => read_lineups(el, records)?,
            TableKind::Batting | TableKind::Pitching => read_player_table(table, el, records)?,
        }
    }
    Ok(())
}

fn read_player_table(table: StatTable, el: ElementRef, records: &mut BoxscoreRecords) -> PageResult<()> {
    let columns = column_map(el);
    let player_index = column_index(&columns, PLAYER_COLUMN, table)?;
    let side = table.side();
    let pitching = table.kind() == TableKind::Pitching;

    for cells in data_rows(el) {
        let Some((link, trailing)) = cells.get(player_index).and_then(|c| player_cell(*c)) else {
            debug!("Skipping {table} row without a player");
            continue;
        };
        let record = records.ensure_player_record(side, &link.name, &link.link);
        if pitching {
            record.set_fielding_position(Some(PITCHER_POSITION.to_string()), PositionSource::PitchingTable);
        } else {
            let position = trailing.split_whitespace().last().map(str::to_lowercase);
            record.set_fielding_position(position, PositionSource::BattingTable);
        }

        for (column, cell) in columns.iter().zip(&cells) {
            let column = column.as_str();
            if column == PLAYER_COLUMN || is_skipped_column(column) {
                continue;
            }
            let text = text_of(*cell);
            if pitching && column == INNINGS_PITCHED_COLUMN {
                let ip = InningsPitched::parse(&text);
                record.set_stat(PlayerStat::InningsPitchedWhole, ip.map(|ip| ip.whole));
                record.set_stat(PlayerStat::InningsPitchedPart, ip.map(|ip| ip.part));
                continue;
            }
            if !pitching && column == AT_BATS_COLUMN {
                record.set_stat(PlayerStat::AtBats, parse_int(&text));
                continue;
            }
            let stat = if pitching {
                pitching_column(column)
            } else {
                hitting_column(column)
            };
            match stat {
                Some(stat) => record.set_stat(stat, parse_int(&text)),
                None => debug!("Ignoring unmapped {table} column {column}"),
            }
        }
    }
    Ok(())
}

/// Sets batting order on records the batting pass already created.
fn read_lineups(el: ElementRef, records: &mut BoxscoreRecords) -> PageResult<()> {
    let columns = column_map(el);
    let mut lookups = vec![];
    for (side, order_column, player_column) in LINEUP_COLUMNS {
        lookups.push((
            side,
            column_index(&columns, order_column, StatTable::Lineups)?,
            column_index(&columns, player_column, StatTable::Lineups)?,
        ));
    }

    for cells in data_rows(el) {
        for &(side, order_index, player_index) in &lookups {
            let Some((link, _)) = cells.get(player_index).and_then(|c| player_cell(*c)) else {
                continue;
            };
            let order = cells
                .get(order_index)
                .and_then(|c| parse_positive_int::<u32>(&text_of(*c)));
            match records.player_record_mut(side, &link.link) {
                Some(record) => record.batting_order = order,
                None => warn!("Lineup lists {} ({side}) who has no batting line", link.name),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;
    use crate::box_score::identity::{IdentityRegistry, PersonKind};
    use crate::box_score::meta::{extract_meta, find_scorebox};
    use crate::box_score::team::extract_teams;

    const PAGE: &str = include_str!("fixtures/ATL201304020.shtml");

    fn page_records(html: &Html) -> BoxscoreRecords {
        let scorebox = find_scorebox(html.root_element()).unwrap();
        let meta = extract_meta(scorebox).unwrap();
        let mut people = IdentityRegistry::default();
        let summary = extract_teams(scorebox, &mut people).unwrap();
        BoxscoreRecords::new("/boxes/ATL/ATL201304020.shtml", meta, summary.teams, summary.pitchers, people)
    }

    #[test]
    fn test_innings_pitched() {
        assert_eq!(InningsPitched::parse("5.2"), Some(InningsPitched { whole: 5, part: 2 }));
        assert_eq!(InningsPitched::parse("7.0"), Some(InningsPitched { whole: 7, part: 0 }));
        assert_eq!(InningsPitched::parse("4"), Some(InningsPitched { whole: 4, part: 0 }));
        assert_eq!(InningsPitched::parse("5.2").map(InningsPitched::outs), Some(17));
        assert_eq!(InningsPitched::parse("5.5"), None);
        assert_eq!(InningsPitched::parse(""), None);
    }

    #[test]
    fn test_batting_and_pitching_rows() {
        let html = Html::parse_document(PAGE);
        let mut records = page_records(&html);
        extract_stat_tables(html.root_element(), &mut records).unwrap();

        let away = records.player_records(Side::Away);
        assert_eq!(away.len(), 5);
        let rollins = records
            .player_record(Side::Away, "/players/r/rolliji01.shtml")
            .unwrap();
        assert_eq!(rollins.fielding_position.as_deref(), Some("ss"));
        assert_eq!(rollins.stat(PlayerStat::AtBats), Some(4));
        assert_eq!(rollins.stat(PlayerStat::Hits), Some(2));
        assert_eq!(rollins.stat(PlayerStat::PitchesSeen), Some(15));
        assert_eq!(rollins.stat(PlayerStat::PutOuts), Some(2));
        assert_eq!(rollins.batting_order, Some(1));

        let lee = records
            .player_record(Side::Away, "/players/l/leecl02.shtml")
            .unwrap();
        assert_eq!(lee.fielding_position.as_deref(), Some("p"));
        assert_eq!(lee.stat(PlayerStat::Hits), Some(0));
        assert_eq!(lee.stat(PlayerStat::HitsAllowed), Some(5));
        assert_eq!(lee.stat(PlayerStat::InningsPitchedWhole), Some(6));
        assert_eq!(lee.stat(PlayerStat::InningsPitchedPart), Some(2));
        assert_eq!(lee.stat(PlayerStat::PitchesSeen), None);
        assert_eq!(lee.stat(PlayerStat::InheritedRunners), None);
        assert_eq!(lee.batting_order, Some(9));

        let bastardo = records
            .player_record(Side::Away, "/players/b/bastaan01.shtml")
            .unwrap();
        assert_eq!(bastardo.fielding_position.as_deref(), Some("p"));
        assert_eq!(bastardo.stat(PlayerStat::InheritedRunners), Some(1));
        assert_eq!(bastardo.batting_order, None);

        let upton = records
            .player_record(Side::Home, "/players/u/uptonju01.shtml")
            .unwrap();
        assert_eq!(upton.fielding_position.as_deref(), Some("lf"));
        assert_eq!(upton.batting_order, Some(2));
        assert!(records.player_record(Side::Away, "/players/u/uptonju01.shtml").is_none());
    }

    #[test]
    fn test_team_totals_never_create_players() {
        let html = Html::parse_document(PAGE);
        let mut records = page_records(&html);
        extract_stat_tables(html.root_element(), &mut records).unwrap();
        // Three pitchers of record were already known; tables add the other seven players.
        assert_eq!(records.people.people(PersonKind::Player).len(), 10);
        assert_eq!(records.player_records(Side::Home).len(), 5);
        assert!(records
            .people
            .people(PersonKind::Player)
            .iter()
            .all(|p| p.full_name() != TEAM_TOTALS));
    }

    #[test]
    fn test_missing_tables_are_a_mismatch() {
        let html = Html::parse_document(PAGE);
        let mut records = page_records(&html);
        let truncated = Html::parse_document("<table class=\"stats_table\"></table><table class=\"stats_table\"></table>");
        let err = extract_stat_tables(truncated.root_element(), &mut records).unwrap_err();
        assert_eq!(err.field, "stat tables");
    }

    #[test]
    fn test_lineup_without_batting_line_is_skipped() {
        let html = Html::parse_document(PAGE);
        let mut records = page_records(&html);
        let lineups = Html::parse_document(
            "<table><tr><th data-stat=\"bat_order_visitor\"></th><th data-stat=\"player_visitor\"></th>\
             <th data-stat=\"blank\"></th><th data-stat=\"bat_order_home\"></th><th data-stat=\"player_home\"></th></tr>\
             <tr><td>4</td><td><a href=\"/players/x/nobody01.shtml\">No Body</a> C</td><td></td><td></td><td></td></tr></table>",
        );
        let table = lineups
            .root_element()
            .select(&Selector::parse("table").unwrap())
            .next()
            .unwrap();
        read_lineups(table, &mut records).unwrap();
        assert!(records.player_records(Side::Away).is_empty());
        assert!(records.player_records(Side::Home).is_empty());
    }
}
