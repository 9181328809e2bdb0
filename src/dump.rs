//! Streaming extraction of MediaWiki SQL table dumps.
//!
//! The `page`, `redirect` and `pagelinks` dumps arrive as gzip-compressed
//! SQL full of multi-megabyte `INSERT INTO ... VALUES (...),(...)` lines.
//! Extraction streams each dump once, splits the value tuples, keeps only
//! namespace-0 rows and the columns the build pass needs, and writes them
//! as tab-separated working tables. Rows that fail to parse are counted
//! and skipped; a handful of malformed tuples is normal for these dumps.

use crate::config::IO_BUF_SIZE;
use crate::models::{LinkRow, PageRow, RedirectRow};
use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use indicatif::ProgressBar;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Column kinds appearing in the table layouts.
#[derive(Clone, Copy)]
enum Col {
    Uint,
    Int,
    Float,
    Str,
}

impl Col {
    fn pattern(self) -> &'static str {
        match self {
            Col::Uint => "[0-9]+",
            Col::Int => "-?[0-9]+",
            Col::Float => r"[0-9]+\.[0-9]+",
            Col::Str => r"(?:'.*?')|(?:NULL)",
        }
    }
}

/// Anchored regex capturing every column of one value tuple.
fn tuple_regex(cols: &[Col]) -> Regex {
    let body = cols
        .iter()
        .map(|c| format!("({})", c.pattern()))
        .collect::<Vec<_>>()
        .join(",");
    Regex::new(&format!("^{}$", body)).expect("table regex must compile")
}

use Col::{Float, Int, Str, Uint};

static PAGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    tuple_regex(&[
        Uint, Int, Str, Str, Int, Int, Float, Str, Str, Uint, Int, Str, Str,
    ])
});
static REDIRECT_REGEX: Lazy<Regex> = Lazy::new(|| tuple_regex(&[Uint, Int, Str, Str, Str]));
static PAGELINKS_REGEX: Lazy<Regex> = Lazy::new(|| tuple_regex(&[Uint, Int, Str, Int]));

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Page,
    Redirect,
    Pagelinks,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Page, Table::Redirect, Table::Pagelinks];

    pub fn name(self) -> &'static str {
        match self {
            Table::Page => "page",
            Table::Redirect => "redirect",
            Table::Pagelinks => "pagelinks",
        }
    }

    /// File name of the extracted working table.
    pub fn working_file(self) -> &'static str {
        match self {
            Table::Page => "page.tsv",
            Table::Redirect => "redirect.tsv",
            Table::Pagelinks => "pagelinks.tsv",
        }
    }

    fn regex(self) -> &'static Regex {
        match self {
            Table::Page => &PAGE_REGEX,
            Table::Redirect => &REDIRECT_REGEX,
            Table::Pagelinks => &PAGELINKS_REGEX,
        }
    }

    /// Indices of namespace columns; a row survives only if all are 0.
    fn namespace_cols(self) -> &'static [usize] {
        match self {
            Table::Page => &[1],
            Table::Redirect => &[1],
            Table::Pagelinks => &[1, 3],
        }
    }
}

#[derive(Debug, Default)]
pub struct TableCounts {
    pub rows_kept: u64,
    pub rows_filtered: u64,
    pub rows_malformed: u64,
}

/// Strip the surrounding single quotes of a SQL string literal. `NULL` and
/// anything unquoted comes back as `None`.
fn unquote(value: &str) -> Option<&str> {
    value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
}

/// Extract one table from a decompressed SQL stream into a TSV writer.
pub fn extract_table<R: BufRead, W: Write>(
    table: Table,
    reader: R,
    writer: &mut csv::Writer<W>,
) -> Result<TableCounts> {
    let mut counts = TableCounts::default();
    let line_start = format!("INSERT INTO `{}` VALUES ", table.name());
    let regex = table.regex();

    for line in reader.lines() {
        let line = line.context("Failed to read dump line")?;
        if !line.starts_with(&line_start) {
            continue;
        }
        let values = match line.split(" VALUES ").nth(1) {
            Some(v) if v.len() > 3 => &v[1..v.len() - 2],
            _ => {
                counts.rows_malformed += 1;
                continue;
            }
        };
        for tuple in values.split("),(") {
            let captures = match regex.captures(tuple) {
                Some(c) => c,
                None => {
                    counts.rows_malformed += 1;
                    warn!(table = table.name(), tuple, "Failed to parse tuple");
                    continue;
                }
            };
            if table
                .namespace_cols()
                .iter()
                .any(|&i| &captures[i + 1] != "0")
            {
                counts.rows_filtered += 1;
                continue;
            }
            if write_row(table, &captures, writer)? {
                counts.rows_kept += 1;
            } else {
                counts.rows_malformed += 1;
            }
        }
    }

    writer.flush().context("Failed to flush working table")?;
    Ok(counts)
}

/// Serialize the columns the build pass needs. Returns false when a value
/// the row depends on is NULL or unparseable.
fn write_row<W: Write>(
    table: Table,
    captures: &regex::Captures<'_>,
    writer: &mut csv::Writer<W>,
) -> Result<bool> {
    match table {
        Table::Page => {
            let id = match captures[1].parse() {
                Ok(id) => id,
                Err(_) => return Ok(false),
            };
            let title = match unquote(&captures[3]) {
                Some(t) => t.to_string(),
                None => return Ok(false),
            };
            let is_redirect = &captures[5] != "0";
            writer
                .serialize(PageRow { id, title, is_redirect })
                .context("Failed to write page row")?;
        }
        Table::Redirect => {
            let from_id = match captures[1].parse() {
                Ok(id) => id,
                Err(_) => return Ok(false),
            };
            let target_title = match unquote(&captures[3]) {
                Some(t) => t.to_string(),
                None => return Ok(false),
            };
            writer
                .serialize(RedirectRow { from_id, target_title })
                .context("Failed to write redirect row")?;
        }
        Table::Pagelinks => {
            let from_id = match captures[1].parse() {
                Ok(id) => id,
                Err(_) => return Ok(false),
            };
            let to_title = match unquote(&captures[3]) {
                Some(t) => t.to_string(),
                None => return Ok(false),
            };
            writer
                .serialize(LinkRow { from_id, to_title })
                .context("Failed to write link row")?;
        }
    }
    Ok(true)
}

/// Locate the single `*-<table>.sql.gz` dump for a table in the data
/// directory. Zero or multiple candidates are both errors the user has to
/// resolve.
pub fn find_dump(data_dir: &Path, table: Table) -> Result<PathBuf> {
    let suffix = format!("-{}.sql.gz", table.name());
    let entries = fs::read_dir(data_dir)
        .with_context(|| format!("Failed to read data directory: {:?}", data_dir))?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(&suffix))
        })
        .collect();

    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        0 => bail!(
            "No dump found for table '{}'. Download the 'page', 'redirect' and 'pagelinks' \
             tables from https://dumps.wikimedia.org/ as .sql.gz files and place them in {:?}.",
            table.name(),
            data_dir
        ),
        _ => {
            candidates.sort();
            bail!(
                "Multiple dumps found for table '{}': {:?}. Move or delete all but one.",
                table.name(),
                candidates
            )
        }
    }
}

/// Extract all three working tables into the output directory, skipping
/// tables that were already extracted by an earlier run.
pub fn run_extraction(data_dir: &Path, output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    for table in Table::ALL {
        let out_path = output_dir.join(table.working_file());
        if out_path.exists() {
            info!(table = table.name(), "Working table already extracted, skipping");
            continue;
        }
        let dump_path = find_dump(data_dir, table)?;
        info!(table = table.name(), dump = ?dump_path, "Extracting table");

        let file = File::open(&dump_path)
            .with_context(|| format!("Failed to open dump: {:?}", dump_path))?;
        let compressed_size = file.metadata().map(|m| m.len()).unwrap_or(0);
        let pb = ProgressBar::new(compressed_size);
        let reader = BufReader::with_capacity(IO_BUF_SIZE, GzDecoder::new(pb.wrap_read(file)));

        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_path(&out_path)
            .with_context(|| format!("Failed to create working table: {:?}", out_path))?;

        let counts = extract_table(table, reader, &mut writer)?;
        pb.finish_and_clear();
        info!(
            table = table.name(),
            kept = counts.rows_kept,
            filtered = counts.rows_filtered,
            malformed = counts.rows_malformed,
            "Table extracted"
        );
    }

    Ok(())
}
