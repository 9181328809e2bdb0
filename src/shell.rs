//! Interactive query loop.
//!
//! Reads one request per line, dispatches on a small request enum, prints
//! human-readable answers. The catalog stays resident for the whole
//! session; graph snapshots load lazily, and only one direction is ever
//! held in memory -- asking for the other direction drops the current one
//! first.

use crate::catalog::PageCatalog;
use crate::graph::LinkGraph;
use crate::models::QueryError;
use crate::store;
use crate::traverse::TraversalEngine;
use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;

/// The request kinds a shell session understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Help,
    Links,
    Path,
    Furthest,
    Max,
    Diameter,
    Exit,
}

impl Request {
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "help" => Some(Request::Help),
            "links" => Some(Request::Links),
            "path" => Some(Request::Path),
            "furthest" => Some(Request::Furthest),
            "max" => Some(Request::Max),
            "diameter" => Some(Request::Diameter),
            "exit" | "quit" => Some(Request::Exit),
            _ => None,
        }
    }
}

pub struct Shell {
    output_dir: PathBuf,
    catalog: PageCatalog,
    /// Loaded snapshot and the direction it was built with.
    graph: Option<(bool, LinkGraph)>,
    stall_limit: u32,
}

impl Shell {
    pub fn new(output_dir: PathBuf, stall_limit: u32) -> Result<Self> {
        let catalog = store::load_catalog(&output_dir)?;
        Ok(Self {
            output_dir,
            catalog,
            graph: None,
            stall_limit,
        })
    }

    /// Make sure the snapshot for `reverse` is resident, dropping the
    /// opposite direction first so both never coexist.
    fn ensure_graph(&mut self, reverse: bool) -> Result<()> {
        if matches!(&self.graph, Some((dir, _)) if *dir == reverse) {
            return Ok(());
        }
        if self.graph.take().is_some() {
            info!(reverse, "Swapping graph direction");
        }
        let graph = store::load_graph(&self.output_dir, reverse)?;
        self.graph = Some((reverse, graph));
        Ok(())
    }

    fn engine(&self) -> TraversalEngine<'_> {
        let (_, graph) = self.graph.as_ref().expect("graph loaded by ensure_graph");
        TraversalEngine::new(graph, &self.catalog)
    }

    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();

        loop {
            print!("ariadne> ");
            io::stdout().flush().context("Failed to flush stdout")?;
            let line = match lines.next() {
                Some(line) => line.context("Failed to read request")?,
                None => return Ok(()),
            };
            let word = line.trim();
            if word.is_empty() {
                continue;
            }

            match Request::parse(word) {
                Some(Request::Exit) => return Ok(()),
                Some(request) => {
                    if let Err(e) = self.dispatch(request, &mut lines) {
                        // I/O and snapshot failures are fatal; bad titles are not
                        match e.downcast::<QueryError>() {
                            Ok(query_err) => println!("{}", query_err),
                            Err(fatal) => return Err(fatal),
                        }
                    }
                }
                None => println!("Unknown request. Try 'help'."),
            }
            println!();
        }
    }

    fn dispatch(
        &mut self,
        request: Request,
        lines: &mut impl Iterator<Item = io::Result<String>>,
    ) -> Result<()> {
        match request {
            Request::Help => {
                println!("links     - List all the links on a page");
                println!("path      - Find the shortest path from one page to another");
                println!("furthest  - Find the page furthest away from a starting point");
                println!("max       - Find the maximal number of steps needed to reach a page from anywhere");
                println!("diameter  - Estimate how far apart the two most distant pages are");
                println!("exit");
            }
            Request::Links => {
                let page = read_title("Page:", lines)?;
                self.ensure_graph(false)?;
                let links = self.engine().links(&page)?;
                println!("{} links:", links.len());
                for link in links {
                    println!("{}", link);
                }
            }
            Request::Path => {
                let start = read_title("Start page:", lines)?;
                let end = read_title("Target page:", lines)?;
                self.ensure_graph(false)?;
                println!();
                let query = self.engine().shortest_path(&start, &end)?;
                match query.titles {
                    Some(titles) => {
                        println!("Reachable in {} steps:", titles.len() - 1);
                        for title in titles {
                            println!("{}", title);
                        }
                    }
                    None => println!("No path found ({} pages explored).", query.visited),
                }
            }
            Request::Furthest => {
                let start = read_title("Start page:", lines)?;
                self.ensure_graph(false)?;
                println!();
                let query = self.engine().furthest(&start)?;
                println!(
                    "The furthest page is '{}' at {} steps.",
                    query.title, query.distance
                );
            }
            Request::Max => {
                let target = read_title("Target page:", lines)?;
                self.ensure_graph(true)?;
                println!();
                let query = self.engine().furthest(&target)?;
                println!(
                    "The maximal number of steps needed is {} from page '{}'.",
                    query.distance, query.title
                );
            }
            Request::Diameter => {
                self.ensure_graph(false)?;
                let query = self.engine().estimate_diameter(self.stall_limit)?;
                println!("The estimated diameter is {}.", query.distance);
                println!("when going from '{}'", query.start);
                println!("to '{}'.", query.end);
            }
            Request::Exit => unreachable!("handled by the caller"),
        }
        Ok(())
    }
}

fn read_title(
    prompt: &str,
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> Result<String> {
    print!("{} ", prompt);
    io::stdout().flush().context("Failed to flush stdout")?;
    let line = lines
        .next()
        .context("Input closed while reading a page title")?
        .context("Failed to read page title")?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_request_words_parse() {
        assert_eq!(Request::parse("help"), Some(Request::Help));
        assert_eq!(Request::parse("links"), Some(Request::Links));
        assert_eq!(Request::parse("path"), Some(Request::Path));
        assert_eq!(Request::parse("furthest"), Some(Request::Furthest));
        assert_eq!(Request::parse("max"), Some(Request::Max));
        assert_eq!(Request::parse("diameter"), Some(Request::Diameter));
        assert_eq!(Request::parse("exit"), Some(Request::Exit));
        assert_eq!(Request::parse("quit"), Some(Request::Exit));
    }

    #[test]
    fn unknown_request_words_do_not_parse() {
        assert_eq!(Request::parse(""), None);
        assert_eq!(Request::parse("HELP"), None);
        assert_eq!(Request::parse("pathfinder"), None);
    }
}
