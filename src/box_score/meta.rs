use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::ElementRef;

use crate::box_score::columns::month_number;
use crate::box_score::error::{Mismatch, PageResult};
use crate::box_score::navigator::{advance_to, element_children, expect_element, text_of, Anchor, Axis};
use crate::box_score::records::GameMeta;
use crate::util::parse_int;

lazy_static! {
    static ref META_LANDMARK: Anchor = Anchor::new("meta landmark", "table.stats_table", 0);
    static ref ATTENDANCE_LINE: Regex = Regex::new(
        r"^Attendance: *(?P<attendance>[0-9,]+|Not Given), *Time of Game: *(?P<hours>[0-9]+):(?P<minutes>[0-9]{2})"
    )
    .unwrap();
}

/// The container holding the meta block, both team summaries and the linescore.
pub fn find_scorebox(root: ElementRef) -> PageResult<ElementRef> {
    let landmark = META_LANDMARK.find(root)?;
    let scorebox = advance_to(*landmark, 1, Axis::Sibling, "scorebox")?;
    expect_element(scorebox, "scorebox")
}

pub fn extract_meta(scorebox: ElementRef) -> PageResult<GameMeta> {
    let block = expect_element(advance_to(*scorebox, 1, Axis::Document, "meta block")?, "meta block")?;
    let lines = element_children(block).map(text_of).collect::<Vec<String>>();
    let [date_line, venue_line, attendance_line] = match lines.get(..3) {
        Some([a, b, c]) => [a, b, c],
        _ => {
            return Err(Mismatch::new(
                "meta block",
                format!("expected 3 lines, found {}", lines.len()),
            ))
        }
    };
    let (attendance, duration_minutes) = parse_attendance_line(attendance_line)?;
    Ok(GameMeta {
        date: parse_date(date_line)?,
        venue: parse_venue(venue_line),
        attendance,
        duration_minutes,
    })
}

/// `"Tuesday, April 2, 2013, 7:10 PM"`. A missing or empty time means the start time
/// is unknown and the game is dated at midnight.
pub fn parse_date(line: &str) -> PageResult<NaiveDateTime> {
    let mismatch = |detail: &str| Mismatch::new("date", format!("{detail} in {line:?}"));
    let parts = line.split(',').map(str::trim).collect::<Vec<&str>>();
    if parts.len() < 3 {
        return Err(mismatch("too few fields"));
    }
    let (month_name, day) = parts[1]
        .split_once(' ')
        .ok_or_else(|| mismatch("no month and day"))?;
    let month = month_number(month_name).ok_or_else(|| mismatch("unknown month"))?;
    let day = parse_int::<u32>(day).ok_or_else(|| mismatch("bad day"))?;
    let year = parse_int::<i32>(parts[2]).ok_or_else(|| mismatch("bad year"))?;
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| mismatch("no such day"))?;

    let time = match parts.get(3).filter(|t| !t.is_empty()) {
        Some(t) => NaiveTime::parse_from_str(t, "%I:%M %p").map_err(|e| mismatch(&e.to_string()))?,
        None => NaiveTime::MIN,
    };
    Ok(date.and_time(time))
}

/// `"Attendance: 24,591, Time of Game: 2:51"` into (attendance, minutes).
pub fn parse_attendance_line(line: &str) -> PageResult<(Option<u32>, u32)> {
    let captures = ATTENDANCE_LINE
        .captures(line)
        .ok_or_else(|| Mismatch::new("attendance", format!("unrecognized line {line:?}")))?;
    let attendance = parse_int::<u32>(&captures["attendance"]);
    let hours = parse_int::<u32>(&captures["hours"]).unwrap_or_default();
    let minutes = parse_int::<u32>(&captures["minutes"]).unwrap_or_default();
    let duration = hours
        .checked_mul(60)
        .and_then(|h| h.checked_add(minutes))
        .ok_or_else(|| Mismatch::new("attendance", format!("game time out of range in {line:?}")))?;
    Ok((attendance, duration))
}

fn parse_venue(line: &str) -> String {
    line.strip_prefix(',').unwrap_or(line).trim_start().to_string()
}
