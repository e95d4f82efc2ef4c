//! Free-text notes printed under the stat tables.
//!
//! Keyed blocks (`<div id="2bvisitor">`) hold `;`-separated events such as
//! `"Rollins (1, off Medlen); Howard (1, off Medlen)"`. Each event is a count and one
//! or more printed names that must be matched back to players already seen in the
//! tables. Unkeyed text holds the umpires and weather, in a fixed order.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Node};
use tracing::{debug, warn};

use crate::box_score::columns::{
    annotation_player_column, annotation_team_column, is_skipped_annotation, PositionalBlock,
    POSITIONAL_BLOCK_ORDER,
};
use crate::box_score::identity::{resolve_name, Resolution};
use crate::box_score::navigator::Anchor;
use crate::box_score::records::{BoxscoreRecords, Side, UmpireGameRecord};
use crate::util::{normalize_ws, parse_int};

lazy_static! {
    static ref ANNOTATION_BLOCKS: Anchor = Anchor::new("annotations", "div[class=\"small_text\"]", 0);
    static ref ASIDE: Regex = Regex::new(r"\([^)]*\)").unwrap();
    static ref COUNT: Regex = Regex::new(r"[0-9]+").unwrap();
}

const UMPIRES_KEY: &str = "umpires";
const WEATHER_KEY: &str = "weather";

/// One `;`-separated event: how many times it happened and to whom.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct AnnotationEvent {
    pub count: u32,
    pub names: Vec<String>,
}

pub fn parse_events(text: &str) -> Vec<AnnotationEvent> {
    ASIDE
        .replace_all(text, "")
        .split(';')
        .filter(|event| !event.trim().is_empty())
        .map(|event| {
            let (count, rest) = match COUNT.find(event) {
                Some(m) => (
                    parse_int::<u32>(m.as_str()).unwrap_or(1),
                    format!("{}{}", &event[..m.start()], &event[m.end()..]),
                ),
                None => (1, event.to_string()),
            };
            let names = rest
                .split('-')
                .map(clean_name)
                .filter(|name| !name.is_empty())
                .collect();
            AnnotationEvent { count, names }
        })
        .collect()
}

/// Drops everything but letters, spaces, apostrophes and periods, then trims stray punctuation.
fn clean_name(fragment: &str) -> String {
    let kept: String = fragment
        .chars()
        .map(|c| if c == '\u{a0}' || c == 'Â' { ' ' } else { c })
        .filter(|&c| c.is_alphabetic() || matches!(c, ' ' | '\'' | '.'))
        .collect();
    normalize_ws(&kept)
        .trim_matches(|c: char| matches!(c, '.' | ',' | ' '))
        .to_string()
}

/// `"HP - Joe West, 1B - Bob Davidson."` into one record per umpire.
pub fn parse_umpires(text: &str) -> Vec<UmpireGameRecord> {
    text.trim()
        .trim_end_matches('.')
        .split(',')
        .filter_map(|pair| {
            let (position, name) = pair.split_once('-')?;
            let (position, name) = (normalize_ws(position), normalize_ws(name));
            (!position.is_empty() && !name.is_empty()).then_some(UmpireGameRecord { name, position })
        })
        .collect()
}

fn parse_weather(text: &str) -> String {
    text.trim().trim_end_matches('.').trim_end().to_string()
}

/// Text of a keyed block without its leading `<strong>` label.
fn block_text(el: ElementRef) -> String {
    let text = el
        .children()
        .map(|node| match ElementRef::wrap(node) {
            Some(child) if child.value().name() == "strong" => String::new(),
            Some(child) => child.text().collect(),
            None => node.value().as_text().map(|t| t.to_string()).unwrap_or_default(),
        })
        .collect::<String>();
    normalize_ws(&text)
}

pub fn extract_annotations(root: ElementRef, records: &mut BoxscoreRecords) {
    let mut positional = vec![];
    for block in ANNOTATION_BLOCKS.find_all(root) {
        for node in block.children() {
            match node.value() {
                Node::Element(el) => {
                    if let (Some(id), Some(child)) = (el.id(), ElementRef::wrap(node)) {
                        apply_keyed(records, id, &block_text(child));
                    }
                }
                Node::Text(text) if !text.trim().is_empty() => positional.push(normalize_ws(text)),
                _ => {}
            }
        }
    }

    let surplus = positional.len().saturating_sub(POSITIONAL_BLOCK_ORDER.len());
    if surplus > 0 {
        debug!("Dropping {surplus} leading unkeyed annotation blocks");
    }
    for (key, text) in POSITIONAL_BLOCK_ORDER.into_iter().zip(&positional[surplus..]) {
        match key {
            PositionalBlock::Umpires => records.umpires.extend(parse_umpires(text)),
            PositionalBlock::Weather => records.weather = Some(parse_weather(text)),
            PositionalBlock::GameTime | PositionalBlock::Attendance | PositionalBlock::FieldCondition => {
                debug!("Discarding {key} annotation {text:?}")
            }
        }
    }
}

fn apply_keyed(records: &mut BoxscoreRecords, id: &str, text: &str) {
    let (side, key) = Side::split_suffix(id);
    match key {
        UMPIRES_KEY => records.umpires.extend(parse_umpires(text)),
        WEATHER_KEY => records.weather = Some(parse_weather(text)),
        _ if is_skipped_annotation(key) => debug!("Skipping {id} annotation"),
        _ => apply_events(records, side, key, text),
    }
}

fn apply_events(records: &mut BoxscoreRecords, side: Option<Side>, key: &str, text: &str) {
    let player_stat = annotation_player_column(key);
    let team_stat = annotation_team_column(key);
    if player_stat.is_none() && team_stat.is_none() {
        debug!("No column for annotation {key}");
        return;
    }

    for event in parse_events(text) {
        let mut resolved = vec![];
        for name in &event.names {
            let resolution = {
                let candidates = records.candidates(side);
                resolve_name(name, candidates.iter().map(|(_, p)| *p))
            };
            match resolution {
                Resolution::Resolved(player) => resolved.push(player),
                Resolution::Ambiguous { chosen, matches } => {
                    warn!("{name:?} in {key} matches {matches} players, using {chosen}");
                    records.report.ambiguous_names += 1;
                    resolved.push(chosen);
                }
                Resolution::Unresolved => {
                    warn!("Could not resolve {name:?} in {key} annotation");
                    records.report.unresolved_names += 1;
                }
            }
        }

        match (player_stat, team_stat, side) {
            (Some(stat), _, _) if !resolved.is_empty() => {
                for player in resolved {
                    let owner = [Side::Away, Side::Home]
                        .into_iter()
                        .filter(|s| side.map_or(true, |wanted| wanted == *s))
                        .find(|s| records.player_record(*s, &player).is_some());
                    if let Some(record) = owner.and_then(|s| records.player_record_mut(s, &player)) {
                        record.add_stat(stat, event.count);
                    }
                }
            }
            (_, Some(stat), Some(side)) if resolved.is_empty() => {
                records.teams.get_mut(side).add_stat(stat, event.count);
            }
            _ => {
                debug!("Dropping {key} event {event:?}");
                records.report.dropped_events += 1;
            }
        }
    }
}
