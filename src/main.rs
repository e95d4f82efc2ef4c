#![allow(dead_code)]
#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::cargo)]
#![warn(
    clippy::nursery,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::module_name_repetitions, clippy::significant_drop_tightening)]

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use glob::{glob, GlobError};
use rayon::prelude::*;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::box_score::error::ExtractError;
use crate::box_score::extractor::extract;
use crate::box_score::records::BoxscoreRecords;
use crate::source_file::SourceFile;
use crate::store::memory::MemoryStore;
use crate::store::persist;
use crate::store::sqlite::SqliteStore;

mod box_score;
mod source_file;
mod store;
mod util;

const ABOUT: &str = "Extracts structured game records from saved Baseball-Reference box score pages.";

#[derive(Parser, Debug)]
#[command(name = "boxscore-extract", about = ABOUT)]
struct Opt {
    /// SQLite database holding registered boxscores and extracted records
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Glob of saved pages; without it, the pages registered in the database are read
    #[arg(short, long)]
    input: Option<String>,

    /// Register matched pages as boxscores before extracting them
    #[arg(short, long)]
    register: bool,

    /// Re-extract boxscores that were already extracted
    #[arg(short, long)]
    force: bool,

    /// Print the extracted records as JSON instead of writing them
    #[arg(long)]
    dry_run: bool,

    #[arg(short, long)]
    verbose: bool,
}

/// A saved page and the boxscore link it is stored under.
#[derive(Debug, Clone)]
struct Page {
    link: String,
    path: PathBuf,
}

impl Page {
    fn extract(&self) -> Result<BoxscoreRecords> {
        let html = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Unable to read {}", self.path.display()))?;
        Ok(extract(&html, &self.link)?)
    }
}

impl From<SourceFile> for Page {
    fn from(source: SourceFile) -> Self {
        Self {
            link: source.link,
            path: source.path,
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    stored: usize,
    skipped: usize,
    failed: usize,
}

/// Commits into a throwaway store so a dry run still surfaces gateway errors.
fn rehearse(page: &Page, records: &BoxscoreRecords) -> Result<MemoryStore> {
    let mut scratch = MemoryStore::default();
    scratch.register_boxscore(&records.link, page.path.to_str(), records.meta.date);
    persist(&mut scratch, records)?;
    Ok(scratch)
}

struct FileProcessor {
    opt: Opt,
    store: Option<SqliteStore>,
}

impl FileProcessor {
    pub fn new(opt: Opt) -> Result<Self> {
        let store = opt.database.as_deref().map(SqliteStore::open).transpose()?;
        if store.is_none() && !opt.dry_run {
            bail!("--database is required unless --dry-run is given");
        }
        Ok(Self { opt, store })
    }

    fn already_extracted(store: &SqliteStore) -> Result<HashSet<String>> {
        let pending = store
            .pending_boxscores(false)?
            .into_iter()
            .map(|p| p.link)
            .collect::<HashSet<String>>();
        Ok(store
            .pending_boxscores(true)?
            .into_iter()
            .map(|p| p.link)
            .filter(|link| !pending.contains(link))
            .collect())
    }

    fn registered_pages(store: &SqliteStore, include_extracted: bool) -> Result<Vec<Page>> {
        Ok(store
            .pending_boxscores(include_extracted)?
            .into_iter()
            .filter_map(|p| match p.html_path {
                Some(path) => Some(Page {
                    link: p.link,
                    path: PathBuf::from(path),
                }),
                None => {
                    warn!("No saved page for {}, skipping", p.link);
                    None
                }
            })
            .collect())
    }

    fn pages(&self) -> Result<Vec<Page>> {
        let Some(pattern) = &self.opt.input else {
            let store = self
                .store
                .as_ref()
                .context("Either --input or --database is needed to find pages")?;
            return Self::registered_pages(store, self.opt.force);
        };

        let mut files = glob(pattern)?.collect::<Result<Vec<PathBuf>, GlobError>>()?;
        files.par_sort();
        let mut sources = files
            .iter()
            .filter_map(|f| match SourceFile::new(f) {
                Ok(source) => Some(source),
                Err(e) => {
                    warn!("{e:#}");
                    None
                }
            })
            .collect::<Vec<SourceFile>>();

        if let Some(store) = &self.store {
            if self.opt.register && !self.opt.dry_run {
                let mut registered = 0;
                for source in &sources {
                    if store.register_boxscore(&source.link, source.path.to_str(), source.date)? {
                        registered += 1;
                    }
                }
                info!("Registered {registered} new boxscores");
            }
            if !self.opt.force {
                let done = Self::already_extracted(store)?;
                sources.retain(|s| {
                    let fresh = !done.contains(&s.link);
                    if !fresh {
                        debug!("{} was already extracted", s.link);
                    }
                    fresh
                });
            }
        }
        Ok(sources.into_iter().map(Page::from).collect())
    }

    fn commit(&mut self, page: &Page, records: &BoxscoreRecords) -> Result<()> {
        if self.opt.dry_run {
            rehearse(page, records)?;
            println!("{}", serde_json::to_string_pretty(records)?);
            return Ok(());
        }
        let store = self.store.as_mut().context("No database to write to")?;
        persist(store, records)
    }

    pub fn process_files(&mut self) -> Result<Tally> {
        let pages = self.pages()?;
        info!("Extracting {} pages", pages.len());

        let extracted = pages
            .par_iter()
            .map(|page| (page, page.extract()))
            .collect::<Vec<(&Page, Result<BoxscoreRecords>)>>();

        let mut tally = Tally::default();
        for (page, result) in extracted {
            match result.and_then(|records| self.commit(page, &records)) {
                Ok(()) => tally.stored += 1,
                Err(e) => match e.downcast_ref::<ExtractError>() {
                    Some(ExtractError::StructuralMismatch { .. }) => {
                        warn!("Skipping {}: {e:#}", page.path.display());
                        tally.skipped += 1;
                    }
                    _ => {
                        error!("Failed on {}: {e:#}", page.path.display());
                        tally.failed += 1;
                    }
                },
            }
        }
        Ok(tally)
    }
}

#[allow(clippy::expect_used)]
fn main() {
    let opt: Opt = Opt::parse();
    let level = if opt.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to initialize trace");

    let start = Instant::now();
    let tally = FileProcessor::new(opt)
        .and_then(|mut processor| processor.process_files())
        .expect("Error occurred while processing files");

    info!(
        "Stored {}, skipped {}, failed {}",
        tally.stored, tally.skipped, tally.failed
    );
    info!("Elapsed: {:?}", start.elapsed());
}
