//! Ariadne: reachability analysis over the Wikipedia link graph
//!
//! This crate turns the MediaWiki `page`, `redirect` and `pagelinks` SQL
//! dumps into an in-memory link graph and answers reachability questions
//! about it:
//!
//! 1. **Extraction Pass** -- Stream the gzip-compressed SQL dumps, keep the
//!    namespace-0 rows and the columns the build needs, write tab-separated
//!    working tables
//! 2. **Build Pass** -- Construct the page catalog and redirect resolver,
//!    resolve every link candidate to a canonical page id, and assemble the
//!    adjacency store (forward or reversed, one direction per run); persist
//!    the catalog and a versioned graph snapshot
//! 3. **Query Pass** -- Load the snapshot and run breadth-first traversals:
//!    shortest path, furthest page, pseudo-diameter estimation
//!
//! # Architecture
//!
//! The graph is large (tens of millions of page ids) but sparse, so the
//! design centers on one resource decision: an index-addressed `Vec` of
//! optional neighbor sets, sized by the largest canonical page id, instead
//! of a general hash map or one allocation per node. Everything else is
//! staged around it:
//!
//! - **Streaming extraction** -- Dumps are never held in memory; INSERT
//!   lines are parsed as they decompress
//! - **Build-then-query** -- The store is mutated only during the build
//!   pass and is strictly read-only once traversals start
//! - **Single direction resident** -- Forward and reversed graphs are
//!   separate snapshots; a run holds at most one
//!
//! # Key Modules
//!
//! - [`dump`] -- Streaming SQL dump extraction with gzip decompression
//! - [`titles`] -- Raw title decoding (underscores, byte escapes)
//! - [`catalog`] -- Page catalog and redirect resolver construction
//! - [`graph`] -- Sparse index-addressed adjacency store
//! - [`builder`] -- Link resolution and graph assembly
//! - [`traverse`] -- BFS shortest path, furthest page, pseudo-diameter
//! - [`store`] -- Snapshot and catalog persistence
//! - [`shell`] -- Interactive query loop
//! - [`models`] -- Core data types (PageId, table rows, QueryError)
//! - [`config`] -- Constants for extraction, build and traversal
//!
//! # Example Usage
//!
//! ```bash
//! # Extract working tables from the SQL dumps in data/
//! ariadne extract -i data/ -o out/
//!
//! # Build the forward graph and page catalog
//! ariadne build -o out/
//!
//! # One-shot queries
//! ariadne path -o out/ --from "Rust (programming language)" --to "Philosophy"
//! ariadne diameter -o out/
//!
//! # Or explore interactively
//! ariadne shell -o out/
//! ```

pub mod builder;
pub mod catalog;
pub mod config;
pub mod dump;
pub mod graph;
pub mod models;
pub mod shell;
pub mod store;
pub mod titles;
pub mod traverse;
