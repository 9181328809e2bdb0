//! Title-to-id mapping and redirect resolution.
//!
//! Built once from the extracted `page` and `redirect` working tables,
//! read-only afterwards. Canonical (non-redirect) pages go into the
//! [`PageCatalog`]; redirect pages only contribute an alias entry in the
//! [`RedirectResolver`] when both ends of the redirect check out.

use crate::models::{PageId, PageRow, RedirectRow};
use crate::titles::decode_title;
use anyhow::Result;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

/// Bidirectional id <-> decoded-title mapping over canonical pages.
#[derive(Debug)]
pub struct PageCatalog {
    title_to_id: FxHashMap<String, PageId>,
    id_to_title: FxHashMap<PageId, String>,
    max_id: PageId,
}

impl PageCatalog {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (PageId, String)>) -> Self {
        let mut title_to_id = FxHashMap::default();
        let mut id_to_title = FxHashMap::default();
        let mut max_id = 0;
        for (id, title) in pairs {
            max_id = max_id.max(id);
            title_to_id.insert(title.clone(), id);
            id_to_title.insert(id, title);
        }
        Self {
            title_to_id,
            id_to_title,
            max_id,
        }
    }

    pub fn id(&self, title: &str) -> Option<PageId> {
        self.title_to_id.get(title).copied()
    }

    pub fn title(&self, id: PageId) -> Option<&str> {
        self.id_to_title.get(&id).map(String::as_str)
    }

    pub fn contains_id(&self, id: PageId) -> bool {
        self.id_to_title.contains_key(&id)
    }

    /// Largest canonical page id; sizes the graph's slot array.
    pub fn max_id(&self) -> PageId {
        self.max_id
    }

    pub fn len(&self) -> usize {
        self.id_to_title.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_title.is_empty()
    }

    /// Iterate `(id, title)` pairs, order unspecified.
    pub fn iter(&self) -> impl Iterator<Item = (PageId, &str)> {
        self.id_to_title.iter().map(|(&id, t)| (id, t.as_str()))
    }
}

/// Maps a redirect's source title to the canonical id it resolves to.
/// Resolution is a single hop by construction; chains cannot form because
/// targets are stored as ids, not titles.
pub struct RedirectResolver {
    targets: FxHashMap<String, PageId>,
}

impl RedirectResolver {
    pub fn resolve(&self, title: &str) -> Option<PageId> {
        self.targets.get(title).copied()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct CatalogStats {
    pub canonical_pages: u64,
    pub redirect_pages: u64,
    pub undecodable_titles: u64,
    pub redirects_kept: u64,
    pub redirects_dropped: u64,
}

/// Build the catalog and resolver from the two working tables.
///
/// A redirect row is kept only when its declared target decodes to a known
/// canonical title and its source id was itself recorded as a redirect
/// page. Anything else is a dangling or unregistered redirect and is
/// dropped without error.
pub fn build_catalog(
    page_rows: impl Iterator<Item = Result<PageRow>>,
    redirect_rows: impl Iterator<Item = Result<RedirectRow>>,
) -> Result<(PageCatalog, RedirectResolver, CatalogStats)> {
    let mut stats = CatalogStats::default();
    let mut pairs = Vec::new();
    // redirect page id -> its own decoded source title
    let mut redirect_sources: FxHashMap<PageId, String> = FxHashMap::default();

    for row in page_rows {
        let row = row?;
        let title = match decode_title(&row.title) {
            Some(t) => t,
            None => {
                stats.undecodable_titles += 1;
                debug!(raw = %row.title, id = row.id, "Skipping undecodable title");
                continue;
            }
        };
        if row.is_redirect {
            stats.redirect_pages += 1;
            redirect_sources.insert(row.id, title);
        } else {
            stats.canonical_pages += 1;
            pairs.push((row.id, title));
        }
    }

    let catalog = PageCatalog::from_pairs(pairs);

    let mut targets = FxHashMap::default();
    for row in redirect_rows {
        let row = row?;
        let target_id = decode_title(&row.target_title)
            .and_then(|target| catalog.id(&target));
        match (target_id, redirect_sources.get(&row.from_id)) {
            (Some(id), Some(source)) => {
                stats.redirects_kept += 1;
                targets.insert(source.clone(), id);
            }
            _ => stats.redirects_dropped += 1,
        }
    }

    info!(
        pages = catalog.len(),
        max_id = catalog.max_id(),
        redirects = targets.len(),
        dropped = stats.redirects_dropped,
        "Catalog built"
    );

    Ok((catalog, RedirectResolver { targets }, stats))
}
