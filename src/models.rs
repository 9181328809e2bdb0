use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page identifier as assigned by MediaWiki. Dense, bounded above by the
/// largest id seen among canonical (non-redirect) pages.
pub type PageId = u32;

/// A row of the extracted `page` working table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRow {
    pub id: PageId,
    /// Raw title as stored in the dump (underscores, backslash escapes)
    pub title: String,
    pub is_redirect: bool,
}

/// A row of the extracted `redirect` working table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectRow {
    pub from_id: PageId,
    pub target_title: String,
}

/// A row of the extracted `pagelinks` working table: one outgoing link
/// candidate, target still unresolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRow {
    pub from_id: PageId,
    pub to_title: String,
}

/// Failures a traversal query can report. Unreachable targets are not
/// errors; they come back as an empty result.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("no page titled {0:?} exists")]
    UnknownTitle(String),
    #[error("the graph contains no pages with outgoing links")]
    EmptyGraph,
}
