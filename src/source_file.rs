use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;

const LINK_PREFIX: &str = "http://www.baseball-reference.com/boxes";

lazy_static! {
    static ref PAGE_STEM: Regex =
        Regex::new(r"^(?P<team>[A-Z0-9]{3})(?P<year>[0-9]{4})(?P<month>[0-9]{2})(?P<day>[0-9]{2})(?P<game>[0-9])$")
            .unwrap();
}

/// A saved box score page, named `<TEAM><YYYYMMDD><n>.shtml` after its home team.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub link: String,
    /// Midnight of the game day until extraction reads the start time.
    pub date: NaiveDateTime,
}

impl SourceFile {
    pub fn new(path: &Path) -> Result<Self> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("Unable to read file name of {}", path.display()))?;
        let Some(captures) = PAGE_STEM.captures(stem) else {
            bail!("{} is not named like a saved box score", path.display());
        };
        let date = NaiveDate::from_ymd_opt(
            captures["year"].parse()?,
            captures["month"].parse()?,
            captures["day"].parse()?,
        )
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .with_context(|| format!("{} names an impossible date", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            link: format!("{LINK_PREFIX}/{}/{stem}.shtml", &captures["team"]),
            date,
        })
    }
}
