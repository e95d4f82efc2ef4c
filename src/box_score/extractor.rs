use anyhow::Result;
use scraper::{ElementRef, Html};
use tracing::{info, warn};

use crate::box_score::annotation::extract_annotations;
use crate::box_score::error::{ExtractError, PageResult};
use crate::box_score::identity::IdentityRegistry;
use crate::box_score::meta::{extract_meta, find_scorebox};
use crate::box_score::records::BoxscoreRecords;
use crate::box_score::stat_table::extract_stat_tables;
use crate::box_score::team::{extract_teams, TeamSummary};
use crate::store::{persist, Store};

/// Reads every record a box score page holds. Nothing is written anywhere.
pub fn extract(html: &str, link: &str) -> Result<BoxscoreRecords, ExtractError> {
    let document = Html::parse_document(html);
    let records = extract_from(document.root_element(), link).map_err(|m| m.at(link))?;
    let report = records.report;
    if report.unresolved_names + report.ambiguous_names + report.dropped_events > 0 {
        warn!(
            "{link}: {} unresolved names, {} ambiguous names, {} dropped events",
            report.unresolved_names, report.ambiguous_names, report.dropped_events
        );
    }
    Ok(records)
}

fn extract_from(root: ElementRef, link: &str) -> PageResult<BoxscoreRecords> {
    let scorebox = find_scorebox(root)?;
    let meta = extract_meta(scorebox)?;
    let mut people = IdentityRegistry::default();
    let TeamSummary { teams, pitchers } = extract_teams(scorebox, &mut people)?;
    let mut records = BoxscoreRecords::new(link, meta, teams, pitchers, people);
    extract_stat_tables(root, &mut records)?;
    extract_annotations(root, &mut records);
    Ok(records)
}

/// Extracts a page and commits its records in one transaction.
pub fn process_document<S: Store>(store: &mut S, link: &str, html: &str) -> Result<()> {
    let records = extract(html, link)?;
    persist(store, &records)?;
    info!("Stored {link}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;
    use crate::box_score::columns::{PlayerStat, TeamStat};
    use crate::box_score::identity::PersonKind;
    use crate::box_score::records::Side;
    use crate::store::memory::MemoryStore;
    use crate::store::sqlite::SqliteStore;

    const PAGE: &str = include_str!("fixtures/ATL201304020.shtml");
    const LINK: &str = "http://www.baseball-reference.com/boxes/ATL/ATL201304020.shtml";

    fn midnight() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2013, 4, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_extract_page() {
        let records = extract(PAGE, LINK).unwrap();
        assert_eq!(records.meta.venue, "Turner Field");
        assert_eq!(
            records.weather.as_deref(),
            Some("57° F, Wind 8mph out to Leftfield, Night, No Precipitation")
        );
        assert_eq!(records.umpires.len(), 4);
        assert_eq!(records.umpires[2].name, "Jim Joyce");
        assert_eq!(records.teams.away.stat(TeamStat::LeftOnBase), Some(6));
        assert_eq!(records.teams.home.stat(TeamStat::LeftOnBase), Some(5));

        let away = |link: &str| records.player_record(Side::Away, link).unwrap();
        let home = |link: &str| records.player_record(Side::Home, link).unwrap();
        assert_eq!(away("/players/r/rolliji01.shtml").stat(PlayerStat::Doubles), Some(1));
        assert_eq!(away("/players/r/rolliji01.shtml").stat(PlayerStat::Errors), Some(2));
        assert_eq!(away("/players/h/howarry01.shtml").stat(PlayerStat::Doubles), Some(1));
        assert_eq!(away("/players/u/utleych01.shtml").stat(PlayerStat::GroundedIntoDoublePlay), Some(1));
        assert_eq!(away("/players/u/utleych01.shtml").stat(PlayerStat::HitByPitch), Some(1));
        assert_eq!(home("/players/u/uptonju01.shtml").stat(PlayerStat::HomeRuns), Some(1));
        assert_eq!(home("/players/u/uptonju01.shtml").stat(PlayerStat::IntentionalBasesOnBalls), Some(1));
        assert_eq!(home("/players/s/simmoan01.shtml").stat(PlayerStat::DoublePlays), Some(1));
        assert_eq!(home("/players/f/freemfr01.shtml").stat(PlayerStat::DoublePlays), Some(1));

        // "J Smith" is on neither roster.
        assert_eq!(records.report.unresolved_names, 1);
        assert_eq!(records.report.dropped_events, 1);
        assert_eq!(records.report.ambiguous_names, 0);
    }

    #[test]
    fn test_structural_mismatch_names_link_and_field() {
        let broken = PAGE.replace("<div>Attendance: 24,591, Time of Game: 2:51</div>", "");
        match extract(&broken, LINK) {
            Err(ExtractError::StructuralMismatch { link, source }) => {
                assert_eq!(link, LINK);
                assert_eq!(source.field, "meta block");
            }
            other => panic!("expected a structural mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_process_document_writes_nothing_on_mismatch() {
        let mut store = MemoryStore::default();
        store.register_boxscore(LINK, None, midnight());
        let truncated = &PAGE[..PAGE.find("PhiladelphiaPhilliespitching").unwrap()];
        let err = process_document(&mut store, LINK, truncated).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ExtractError>().and_then(ExtractError::field),
            Some("stat tables")
        );
        assert_eq!(store.boxscore(LINK).unwrap().update, None);
        assert_eq!(store.team_record_count(), 0);
        assert_eq!(store.people_count(PersonKind::Manager), 0);
    }

    #[test]
    fn test_unregistered_boxscore_is_rejected() {
        let mut store = MemoryStore::default();
        let err = process_document(&mut store, LINK, PAGE).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExtractError>(),
            Some(ExtractError::UnregisteredBoxscore(link)) if link == LINK
        ));
        assert_eq!(store.people_count(PersonKind::Player), 0);
        assert_eq!(store.team_record_count(), 0);
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let mut store = MemoryStore::default();
        store.register_boxscore(LINK, None, midnight());
        process_document(&mut store, LINK, PAGE).unwrap();
        let first = store.boxscore(LINK).cloned().unwrap();
        process_document(&mut store, LINK, PAGE).unwrap();
        let second = store.boxscore(LINK).cloned().unwrap();

        assert_eq!(store.team_record_count(), 2);
        assert_eq!(store.player_record_count(), 10);
        assert_eq!(store.people_count(PersonKind::Player), 10);
        assert_eq!(store.people_count(PersonKind::Manager), 2);
        assert_eq!(store.umpires(LINK).len(), 4);

        let update = second.update.unwrap();
        assert_eq!(first.update.map(|u| u.venue), Some(update.venue.clone()));
        assert_eq!(second.date, NaiveDate::from_ymd_opt(2013, 4, 2).unwrap().and_hms_opt(19, 10, 0).unwrap());
        assert_eq!(update.attendance, Some(24591));
        assert_eq!(update.duration_minutes, 171);
        assert_eq!(update.winning_pitcher.as_deref(), Some("/players/m/medlekr01.shtml"));

        let away = store.team_record(update.away_team_record).unwrap();
        assert_eq!((away.team_name.as_str(), away.hits, away.errors), ("Phillies", Some(7), Some(2)));
        let innings = store.inning_scores(update.away_team_record);
        assert_eq!(innings.len(), 9);
        assert_eq!(innings.iter().map(|i| i.runs).sum::<u32>(), away.score);
        assert_eq!(store.inning_scores(update.home_team_record).len(), 8);
        assert_eq!(store.player_records(update.home_team_record).len(), 5);
    }

    #[test]
    fn test_sqlite_round_trip() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.register_boxscore(LINK, Some("ATL201304020.shtml"), midnight()).unwrap();
        process_document(&mut store, LINK, PAGE).unwrap();
        process_document(&mut store, LINK, PAGE).unwrap();

        let count = |table: &str| -> i64 {
            store
                .connection()
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
                .unwrap()
        };
        assert_eq!(count("team_game_record"), 2);
        assert_eq!(count("inning_score"), 17);
        assert_eq!(count("player_game_record"), 10);
        assert_eq!(count("umpire_game_record"), 4);
        assert_eq!(count("player"), 10);
        assert!(store.pending_boxscores(false).unwrap().is_empty());

        let (date, attendance, weather): (String, Option<u32>, Option<String>) = store
            .connection()
            .query_row(
                "SELECT date, attendance, weather_description FROM boxscore WHERE link = ?1",
                [LINK],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(date, "2013-04-02 19:10:00");
        assert_eq!(attendance, Some(24591));
        assert!(weather.unwrap().starts_with("57° F"));

        let lee: (u32, u32, String) = store
            .connection()
            .query_row(
                "SELECT innings_pitched_whole, innings_pitched_part, fielding_pos FROM player_game_record
                 WHERE player_link = '/players/l/leecl02.shtml'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(lee, (6, 2, "p".to_string()));
    }
}
