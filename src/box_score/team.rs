use lazy_static::lazy_static;
use scraper::ElementRef;
use tracing::{debug, warn};

use crate::box_score::columns::{SummaryField, PITCHER_ORDER, TEAM_SUMMARY_ORDER};
use crate::box_score::error::{Mismatch, PageResult};
use crate::box_score::identity::{IdentityRegistry, PersonKind};
use crate::box_score::navigator::{
    advance_to, element_children, expect_link, expect_text, find_link, text_of, Anchor, Axis,
};
use crate::box_score::records::{InningScore, Matchup, PitchersOfRecord, Side, TeamGameRecord};
use crate::util::parse_int;

lazy_static! {
    static ref AWAY_SUMMARY: Anchor = Anchor::new("away summary", "td[align=center]", 0);
    static ref HOME_SUMMARY: Anchor = Anchor::new("home summary", "td[align=center]", 2);
    static ref PITCHERS: Anchor = Anchor::new("pitchers of record", "td[align=left]", 0);
    static ref LINESCORE: Anchor = Anchor::new("linescore", "td[align=left] pre", 0);
    static ref TEAM_LINK: Anchor = Anchor::new("linescore team", "a", 0);
}

#[derive(Debug, Clone)]
pub struct TeamSummary {
    pub teams: Matchup<TeamGameRecord>,
    pub pitchers: PitchersOfRecord,
}

/// One team's line: runs per played inning, then the R/H/E totals.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct Linescore {
    pub innings: Vec<InningScore>,
    pub runs: u32,
    pub hits: u32,
    pub errors: u32,
    /// Whether a placeholder (such as the `X` of an unplayed bottom ninth) was dropped.
    pub incomplete: bool,
}

impl Linescore {
    pub fn parse(tokens: &str) -> Option<Self> {
        let mut incomplete = false;
        let mut values = vec![];
        for token in tokens.split_whitespace() {
            match parse_int::<u32>(token) {
                Some(v) => values.push(v),
                None => incomplete = true,
            }
        }
        let split = values.len().checked_sub(3)?;
        let (innings, totals) = values.split_at(split);
        Some(Self {
            innings: innings
                .iter()
                .zip(1..)
                .map(|(&runs, inning)| InningScore { inning, runs })
                .collect(),
            runs: totals[0],
            hits: totals[1],
            errors: totals[2],
            incomplete,
        })
    }
}

pub fn extract_teams(scorebox: ElementRef, people: &mut IdentityRegistry) -> PageResult<TeamSummary> {
    let away = read_summary(AWAY_SUMMARY.find(scorebox)?, people)?;
    let home = read_summary(HOME_SUMMARY.find(scorebox)?, people)?;
    let mut teams = Matchup::new(away, home);

    let pre = LINESCORE.find(scorebox)?;
    let team_links = TEAM_LINK.find_all(pre);
    if team_links.len() < 2 {
        return Err(Mismatch::new(
            "linescore",
            format!("expected 2 team lines, found {}", team_links.len()),
        ));
    }
    for (side, anchor) in [Side::Away, Side::Home].into_iter().zip(team_links) {
        let tokens = expect_text(advance_to(*anchor, 1, Axis::Sibling, "linescore")?, "linescore")?;
        let linescore = Linescore::parse(tokens)
            .ok_or_else(|| Mismatch::new("linescore", format!("no R/H/E totals in {tokens:?}")))?;
        apply_linescore(teams.get_mut(side), side, linescore);
    }

    let pitchers = read_pitchers(PITCHERS.find(scorebox)?, people)?;
    Ok(TeamSummary { teams, pitchers })
}

fn read_summary(cell: ElementRef, people: &mut IdentityRegistry) -> PageResult<TeamGameRecord> {
    let fields = element_children(cell).collect::<Vec<ElementRef>>();
    if fields.len() < TEAM_SUMMARY_ORDER.len() {
        return Err(Mismatch::new(
            "team summary",
            format!("expected {} fields, found {}", TEAM_SUMMARY_ORDER.len(), fields.len()),
        ));
    }
    let mut team = None;
    let mut score = None;
    let mut manager = None;
    for (field, el) in TEAM_SUMMARY_ORDER.into_iter().zip(fields) {
        match field {
            SummaryField::TeamShortName => team = Some(expect_link(el, "team name")?),
            SummaryField::Score => {
                let text = text_of(el);
                score = Some(
                    parse_int::<u32>(&text)
                        .ok_or_else(|| Mismatch::new("score", format!("not a number: {text:?}")))?,
                );
            }
            SummaryField::Manager => {
                let link = expect_link(el, "manager")?;
                manager = Some(people.ensure(PersonKind::Manager, &link.name, &link.link));
            }
            _ => debug!("Discarding team summary field {field}"),
        }
    }
    match (team, score, manager) {
        (Some(team), Some(score), Some(manager)) => Ok(TeamGameRecord {
            team_name: team.name,
            team_link: team.link,
            score,
            hits: None,
            errors: None,
            left_on_base: None,
            manager,
            innings: vec![],
        }),
        _ => Err(Mismatch::new("team summary", "missing a persisted field")),
    }
}

fn apply_linescore(team: &mut TeamGameRecord, side: Side, linescore: Linescore) {
    let inning_runs: u32 = linescore.innings.iter().map(|i| i.runs).sum();
    if !linescore.incomplete && inning_runs != team.score {
        warn!(
            "{side} linescore innings sum to {inning_runs} but {} scored {}",
            team.team_name, team.score
        );
    }
    if linescore.runs != team.score {
        warn!(
            "{side} linescore total {} disagrees with summary score {}",
            linescore.runs, team.score
        );
    }
    team.hits = Some(linescore.hits);
    team.errors = Some(linescore.errors);
    team.innings = linescore.innings;
}

fn read_pitchers(cell: ElementRef, people: &mut IdentityRegistry) -> PageResult<PitchersOfRecord> {
    let container = element_children(cell)
        .next()
        .ok_or_else(|| Mismatch::new("pitchers of record", "empty cell"))?;
    let mut pitchers = PitchersOfRecord::default();
    for (role, line) in PITCHER_ORDER.into_iter().zip(element_children(container)) {
        match find_link(line) {
            Some(link) => pitchers.set(role, people.ensure(PersonKind::Player, &link.name, &link.link)),
            None => debug!("No {role} pitcher listed"),
        }
    }
    Ok(pitchers)
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;
    use crate::box_score::meta::find_scorebox;

    const PAGE: &str = include_str!("fixtures/ATL201304020.shtml");

    fn scorebox_page(away_line: &str, home_line: &str, away_score: u32, home_score: u32) -> String {
        let summary = |team: &str, score: u32, manager: &str| {
            format!(
                "<td align=\"center\"><div><a href=\"/teams/{team}/2013.shtml\">{team}</a></div>\
                 <div>{score}</div><div>1-0</div><div></div><div></div>\
                 <div><a href=\"/managers/{manager}.shtml\">Some Manager</a></div></td>"
            )
        };
        format!(
            "<html><body><table class=\"stats_table\"></table>\n<div class=\"scorebox\">\
             <div><div>d</div><div>v</div><div>a</div></div><table><tr>{}<td align=\"center\"></td>{}</tr>\
             <tr><td align=\"left\"><div></div></td><td align=\"left\"><pre>\
             <a href=\"/teams/AAA/2013.shtml\">AAA</a> {away_line}\n\
             <a href=\"/teams/BBB/2013.shtml\">BBB</a> {home_line}\n</pre></td></tr></table></div></body></html>",
            summary("AAA", away_score, "aaa01"),
            summary("BBB", home_score, "bbb01"),
        )
    }

    fn teams_of(page: &str) -> PageResult<TeamSummary> {
        let html = Html::parse_document(page);
        let scorebox = find_scorebox(html.root_element())?;
        extract_teams(scorebox, &mut IdentityRegistry::default())
    }

    #[test]
    fn test_linescore_parse() {
        let line = Linescore::parse("0 1 0 0 0 2 0 0 X    3  6  0").unwrap();
        assert_eq!(line.innings.len(), 8);
        assert_eq!(line.innings[5], InningScore { inning: 6, runs: 2 });
        assert_eq!((line.runs, line.hits, line.errors), (3, 6, 0));
        assert!(line.incomplete);
        assert!(Linescore::parse("3 6").is_none());
    }

    #[test]
    fn test_extract_teams_from_page() {
        let html = Html::parse_document(PAGE);
        let scorebox = find_scorebox(html.root_element()).unwrap();
        let mut people = IdentityRegistry::default();
        let TeamSummary { teams, pitchers } = extract_teams(scorebox, &mut people).unwrap();

        assert_eq!(teams.away.team_name, "Phillies");
        assert_eq!(teams.away.team_link, "/teams/PHI/2013.shtml");
        assert_eq!(teams.away.score, 2);
        assert_eq!(teams.away.hits, Some(7));
        assert_eq!(teams.away.errors, Some(2));
        assert_eq!(teams.away.manager, "/managers/manuech01.shtml");
        assert_eq!(teams.away.innings.len(), 9);
        assert_eq!(teams.away.inning_runs(), teams.away.score);

        assert_eq!(teams.home.score, 3);
        assert_eq!(teams.home.innings.len(), 8);
        assert_eq!(teams.home.inning_runs(), 3);
        assert_eq!(teams.home.left_on_base, None);

        let manager = people
            .get(PersonKind::Manager, "/managers/gonzafr99.shtml")
            .unwrap();
        assert_eq!((manager.first_name.as_str(), manager.last_name.as_str()), ("Fredi", "Gonzalez"));

        assert_eq!(pitchers.winning.as_deref(), Some("/players/m/medlekr01.shtml"));
        assert_eq!(pitchers.losing.as_deref(), Some("/players/l/leecl02.shtml"));
        assert_eq!(pitchers.saving.as_deref(), Some("/players/k/kimbrcr01.shtml"));
        assert_eq!(people.people(PersonKind::Player).len(), 3);
    }

    #[test]
    fn test_extra_innings() {
        let page = scorebox_page("0 0 1 0 0 0 0 1 0 0  2 8 1", "0 0 0 0 2 0 0 0 0 1  3 9 0", 2, 3);
        let teams = teams_of(&page).unwrap().teams;
        assert_eq!(teams.away.innings.len(), 10);
        assert_eq!(teams.home.innings.len(), 10);
        assert_eq!(teams.home.innings[9], InningScore { inning: 10, runs: 1 });
        assert_eq!(teams.away.inning_runs(), 2);
        assert_eq!(teams.home.inning_runs(), 3);
    }

    #[test]
    fn test_missing_pitchers_are_tolerated() {
        let page = scorebox_page("0 0 0 0 0 0 0 0 0  0 2 0", "1 0 0 0 0 0 0 0 X  1 4 0", 0, 1);
        let summary = teams_of(&page).unwrap();
        assert_eq!(summary.pitchers, PitchersOfRecord::default());
        assert_eq!(summary.teams.home.innings.len(), 8);
    }

    #[test]
    fn test_broken_linescore_is_a_mismatch() {
        let page = scorebox_page("0 0", "0 0", 0, 0);
        assert_eq!(teams_of(&page).unwrap_err().field, "linescore");
        let page = scorebox_page("0 0 0 0 0 0 0 0 0  0 2 0", "0 0 0 0 0 0 0 0 0  0 2 0", 0, 0)
            .replace("<div>0</div>", "<div>zero</div>");
        assert_eq!(teams_of(&page).unwrap_err().field, "score");
    }
}
