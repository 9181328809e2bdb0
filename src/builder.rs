//! Turns the raw link table into the adjacency store.
//!
//! Each record names a source page by id and a target page by raw title.
//! Targets resolve either directly against the catalog or through the
//! redirect resolver; anything else is a broken link, counted and skipped.
//! The build is single-threaded and the graph is never touched again once
//! it is handed to a traversal, so the counters are plain integers.

use crate::catalog::{build_catalog, CatalogStats, PageCatalog, RedirectResolver};
use crate::config::PROGRESS_INTERVAL;
use crate::dump::Table;
use crate::graph::LinkGraph;
use crate::models::{LinkRow, PageId, PageRow, RedirectRow};
use crate::store;
use crate::titles::decode_title;
use anyhow::{bail, Context, Result};
use indicatif::ProgressBar;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::info;

/// Counters reported after a build pass.
#[derive(Debug, Default)]
pub struct BuildStats {
    pub records: u64,
    pub edges_inserted: u64,
    pub duplicate_edges: u64,
    pub broken_links: u64,
    pub skipped_sources: u64,
}

/// Stream link records into a new graph sized by the catalog's `max_id`.
///
/// With `reverse` set, every resolved edge `(from, target)` is inserted as
/// `(target, from)` instead, so "who links here" questions run the same
/// traversal code against a mirrored store.
pub fn build_graph(
    links: impl Iterator<Item = Result<LinkRow>>,
    catalog: &PageCatalog,
    resolver: &RedirectResolver,
    reverse: bool,
) -> Result<(LinkGraph, BuildStats)> {
    let mut graph = LinkGraph::new(catalog.max_id());
    let mut stats = BuildStats::default();
    let pb = ProgressBar::new_spinner();

    for row in links {
        let row = row?;
        stats.records += 1;
        if stats.records % PROGRESS_INTERVAL == 0 {
            pb.tick();
        }

        if !catalog.contains_id(row.from_id) {
            stats.skipped_sources += 1;
            continue;
        }

        let target = decode_title(&row.to_title)
            .and_then(|title| catalog.id(&title).or_else(|| resolver.resolve(&title)));
        let target = match target {
            Some(id) => id,
            None => {
                stats.broken_links += 1;
                continue;
            }
        };

        let (from, to) = if reverse {
            (target, row.from_id)
        } else {
            (row.from_id, target)
        };
        if graph.add_edge(from, to) {
            stats.edges_inserted += 1;
        } else {
            stats.duplicate_edges += 1;
        }
    }

    pb.finish_and_clear();

    info!(
        records = stats.records,
        edges = stats.edges_inserted,
        duplicates = stats.duplicate_edges,
        broken = stats.broken_links,
        skipped = stats.skipped_sources,
        reverse,
        "Graph built"
    );

    Ok((graph, stats))
}

/// Everything a `build` run reports back to the CLI.
pub struct BuildSummary {
    pub catalog: CatalogStats,
    pub build: BuildStats,
    pub pages: usize,
    pub max_id: PageId,
    pub present: usize,
}

fn table_rows<T: DeserializeOwned + 'static>(
    output_dir: &Path,
    table: Table,
) -> Result<impl Iterator<Item = Result<T>>> {
    let path = output_dir.join(table.working_file());
    if !path.exists() {
        bail!(
            "Working table not found: {:?}. Run `ariadne extract` first.",
            path
        );
    }
    let reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(&path)
        .with_context(|| format!("Failed to open working table: {:?}", path))?;
    let name = table.name();
    Ok(reader
        .into_deserialize()
        .map(move |row| row.with_context(|| format!("Malformed {} row", name))))
}

/// Full build pass over the extracted working tables: construct the
/// catalog and redirect resolver, stream the link table into a graph of
/// the requested direction, and persist both. One direction per run --
/// forward and reversed graphs are never resident together.
pub fn run_build(output_dir: &Path, reverse: bool) -> Result<BuildSummary> {
    let (catalog, resolver, catalog_stats) = build_catalog(
        table_rows::<PageRow>(output_dir, Table::Page)?,
        table_rows::<RedirectRow>(output_dir, Table::Redirect)?,
    )?;
    if catalog.is_empty() {
        bail!("The page table produced no canonical pages; nothing to build.");
    }

    let (graph, build_stats) = build_graph(
        table_rows::<LinkRow>(output_dir, Table::Pagelinks)?,
        &catalog,
        &resolver,
        reverse,
    )?;

    store::save_catalog(&catalog, output_dir)?;
    store::save_graph(&graph, reverse, output_dir)?;

    Ok(BuildSummary {
        catalog: catalog_stats,
        build: build_stats,
        pages: catalog.len(),
        max_id: catalog.max_id(),
        present: graph.present_count(),
    })
}
