use std::str::FromStr;

use num_traits::PrimInt;

/// Parses an integer cell, tolerating surrounding whitespace and thousands separators.
/// Blank or malformed cells come back as `None`.
pub(crate) fn parse_int<T: PrimInt + FromStr>(int_str: &str) -> Option<T> {
    let cleaned = int_str.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<T>().ok()
}

pub(crate) fn parse_positive_int<T: PrimInt + FromStr>(int_str: &str) -> Option<T> {
    parse_int::<T>(int_str).filter(|i| !i.is_zero())
}

/// Collapses runs of whitespace (including non-breaking spaces) into single spaces.
pub(crate) fn normalize_ws(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|w| !w.is_empty())
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Splits a printed name into (first, last): first token vs. everything after it.
pub(crate) fn split_name(name: &str) -> (String, String) {
    let name = normalize_ws(name);
    match name.split_once(' ') {
        Some((first, last)) => (first.to_string(), last.to_string()),
        None => (name, String::new()),
    }
}
