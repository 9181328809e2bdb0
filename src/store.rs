//! On-disk persistence for the graph snapshot and the page catalog.
//!
//! The graph is one bincode blob with a small metadata header; loads
//! verify the format version and the build direction, and cap the
//! deserializer's allocation at the file size. Writes go through a temp
//! file and a rename so a crash never leaves a half-written snapshot
//! behind. The catalog is a plain tab-separated table of (id, title).

use crate::catalog::PageCatalog;
use crate::config::{
    GRAPH_FILE, GRAPH_REVERSE_FILE, IO_BUF_SIZE, PAGES_FILE, SNAPSHOT_VERSION,
};
use crate::graph::LinkGraph;
use crate::models::PageId;
use anyhow::{bail, Context, Result};
use bincode::Options;
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Serialize, Deserialize)]
struct SnapshotMetadata {
    version: u32,
    reverse: bool,
    max_id: PageId,
    edge_count: u64,
}

/// Borrows the graph to avoid cloning tens of millions of sets on save.
#[derive(Serialize)]
struct SnapshotSer<'a> {
    metadata: SnapshotMetadata,
    graph: &'a LinkGraph,
}

#[derive(Deserialize)]
struct SnapshotDe {
    metadata: SnapshotMetadata,
    graph: LinkGraph,
}

pub fn graph_path(output_dir: &Path, reverse: bool) -> PathBuf {
    output_dir.join(if reverse { GRAPH_REVERSE_FILE } else { GRAPH_FILE })
}

pub fn pages_path(output_dir: &Path) -> PathBuf {
    output_dir.join(PAGES_FILE)
}

/// Serialize the graph by reference and write atomically via rename.
pub fn save_graph(graph: &LinkGraph, reverse: bool, output_dir: &Path) -> Result<()> {
    let path = graph_path(output_dir, reverse);
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {:?}", output_dir))?;

    let snapshot = SnapshotSer {
        metadata: SnapshotMetadata {
            version: SNAPSHOT_VERSION,
            reverse,
            max_id: graph.max_id(),
            edge_count: graph.edge_count(),
        },
        graph,
    };

    let tmp_path = path.with_extension("bin.tmp");
    let file = File::create(&tmp_path)
        .with_context(|| format!("Failed to create temp snapshot file: {:?}", tmp_path))?;
    let writer = BufWriter::with_capacity(IO_BUF_SIZE, file);

    bincode::DefaultOptions::new()
        .serialize_into(writer, &snapshot)
        .context("Failed to serialize graph snapshot")?;

    fs::rename(&tmp_path, &path)
        .with_context(|| format!("Failed to rename temp snapshot file to: {:?}", path))?;

    info!(
        edges = graph.edge_count(),
        present = graph.present_count(),
        reverse,
        path = ?path,
        "Graph snapshot saved"
    );

    Ok(())
}

/// Load a snapshot, verifying version and direction. Any mismatch or
/// corruption is fatal; there is no degraded mode to fall back to.
pub fn load_graph(output_dir: &Path, reverse: bool) -> Result<LinkGraph> {
    let path = graph_path(output_dir, reverse);
    if !path.exists() {
        bail!(
            "Graph snapshot not found: {:?}. Run `ariadne build{}` first.",
            path,
            if reverse { " --reverse" } else { "" }
        );
    }

    let file_size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    let file =
        File::open(&path).with_context(|| format!("Failed to open snapshot: {:?}", path))?;
    let pb = ProgressBar::new(file_size);
    let reader = BufReader::with_capacity(IO_BUF_SIZE, pb.wrap_read(file));

    let options = bincode::options().with_limit(file_size.saturating_add(1024));
    let snapshot: SnapshotDe = options
        .deserialize_from(reader)
        .context("Failed to deserialize graph snapshot (corrupt file?)")?;
    pb.finish_and_clear();

    if snapshot.metadata.version != SNAPSHOT_VERSION {
        bail!(
            "Snapshot version mismatch: file has {}, this build expects {}. Rebuild the graph.",
            snapshot.metadata.version,
            SNAPSHOT_VERSION
        );
    }
    if snapshot.metadata.reverse != reverse {
        bail!(
            "Snapshot direction mismatch: {:?} was built with reverse={}",
            path,
            snapshot.metadata.reverse
        );
    }

    info!(
        edges = snapshot.metadata.edge_count,
        max_id = snapshot.metadata.max_id,
        reverse,
        "Graph snapshot loaded"
    );

    Ok(snapshot.graph)
}

/// Write the catalog as a tab-separated (id, title) table, sorted by id.
pub fn save_catalog(catalog: &PageCatalog, output_dir: &Path) -> Result<()> {
    let path = pages_path(output_dir);
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {:?}", output_dir))?;

    let mut pairs: Vec<(PageId, &str)> = catalog.iter().collect();
    pairs.sort_unstable_by_key(|&(id, _)| id);

    let tmp_path = path.with_extension("tsv.tmp");
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(&tmp_path)
        .with_context(|| format!("Failed to create temp catalog file: {:?}", tmp_path))?;

    for (id, title) in pairs {
        writer
            .serialize((id, title))
            .context("Failed to write catalog record")?;
    }
    writer.flush().context("Failed to flush catalog table")?;
    drop(writer);

    fs::rename(&tmp_path, &path)
        .with_context(|| format!("Failed to rename temp catalog file to: {:?}", path))?;

    info!(pages = catalog.len(), path = ?path, "Catalog saved");
    Ok(())
}

pub fn load_catalog(output_dir: &Path) -> Result<PageCatalog> {
    let path = pages_path(output_dir);
    if !path.exists() {
        bail!(
            "Page catalog not found: {:?}. Run `ariadne build` first.",
            path
        );
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(&path)
        .with_context(|| format!("Failed to open catalog: {:?}", path))?;

    let mut pairs = Vec::new();
    for record in reader.deserialize() {
        let (id, title): (PageId, String) = record.context("Malformed catalog record")?;
        pairs.push((id, title));
    }

    let catalog = PageCatalog::from_pairs(pairs);
    info!(pages = catalog.len(), "Catalog loaded");
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn sample_graph() -> LinkGraph {
        let mut graph = LinkGraph::new(100);
        graph.add_edge(0, 1);
        graph.add_edge(0, 99);
        graph.add_edge(42, 7);
        graph
    }

    #[test]
    fn graph_roundtrip_preserves_structure() {
        let dir = TempDir::new().unwrap();
        let original = sample_graph();
        save_graph(&original, false, dir.path()).unwrap();
        let loaded = load_graph(dir.path(), false).unwrap();

        assert_eq!(loaded.max_id(), original.max_id());
        assert_eq!(loaded.edge_count(), original.edge_count());
        assert_eq!(loaded.present_count(), original.present_count());
        for id in 0..=original.max_id() {
            match (original.neighbors(id), loaded.neighbors(id)) {
                (None, None) => {}
                (Some(a), Some(b)) => assert_eq!(a, b),
                _ => panic!("slot {} presence differs after reload", id),
            }
        }
    }

    #[test]
    fn forward_and_reverse_snapshots_are_separate_files() {
        let dir = TempDir::new().unwrap();
        let graph = sample_graph();
        save_graph(&graph, false, dir.path()).unwrap();
        save_graph(&graph, true, dir.path()).unwrap();
        assert!(graph_path(dir.path(), false).exists());
        assert!(graph_path(dir.path(), true).exists());
        assert_ne!(graph_path(dir.path(), false), graph_path(dir.path(), true));
    }

    #[test]
    fn loading_missing_snapshot_fails_with_hint() {
        let dir = TempDir::new().unwrap();
        let err = load_graph(dir.path(), false).unwrap_err();
        assert!(err.to_string().contains("ariadne build"));
    }

    #[test]
    fn corrupt_snapshot_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = graph_path(dir.path(), false);
        let mut file = File::create(&path).unwrap();
        file.write_all(b"not a bincode snapshot").unwrap();
        assert!(load_graph(dir.path(), false).is_err());
    }

    #[test]
    fn catalog_roundtrip_with_awkward_titles() {
        let dir = TempDir::new().unwrap();
        let catalog = PageCatalog::from_pairs(vec![
            (1, "Plain".to_string()),
            (2, "With spaces and (parens)".to_string()),
            (3, "Quote \" in title".to_string()),
            (4, "Tab\tinside".to_string()),
        ]);
        save_catalog(&catalog, dir.path()).unwrap();
        let loaded = load_catalog(dir.path()).unwrap();

        assert_eq!(loaded.len(), 4);
        assert_eq!(loaded.id("Plain"), Some(1));
        assert_eq!(loaded.id("With spaces and (parens)"), Some(2));
        assert_eq!(loaded.id("Quote \" in title"), Some(3));
        assert_eq!(loaded.id("Tab\tinside"), Some(4));
        assert_eq!(loaded.title(4), Some("Tab\tinside"));
        assert_eq!(loaded.max_id(), 4);
    }

    #[test]
    fn loading_missing_catalog_fails_with_hint() {
        let dir = TempDir::new().unwrap();
        let err = load_catalog(dir.path()).unwrap_err();
        assert!(err.to_string().contains("ariadne build"));
    }
}
