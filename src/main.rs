use anyhow::Result;
use ariadne::builder;
use ariadne::dump;
use ariadne::shell::Shell;
use ariadne::store;
use ariadne::traverse::TraversalEngine;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "ariadne")]
#[command(about = "Analyze reachability in the Wikipedia link graph")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract working tables from gzip-compressed SQL table dumps
    Extract(ExtractArgs),
    /// Build the page catalog and a graph snapshot from the working tables
    Build(BuildArgs),
    /// Find the shortest link chain between two pages
    Path(PathArgs),
    /// Find the page furthest away from a starting page
    Furthest(FurthestArgs),
    /// Find the maximal number of steps needed to reach a page from anywhere
    Max(MaxArgs),
    /// Estimate the diameter of the link graph
    Diameter(DiameterArgs),
    /// List all links on a page
    Links(LinksArgs),
    /// Interactive query shell
    Shell(ShellArgs),
}

#[derive(Args)]
struct ExtractArgs {
    /// Directory containing the *-page, *-redirect and *-pagelinks .sql.gz dumps
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for working tables and snapshots
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct BuildArgs {
    /// Output directory holding the extracted working tables
    #[arg(short, long)]
    output: PathBuf,

    /// Build the reversed graph (who links here) instead of the forward one
    #[arg(long)]
    reverse: bool,
}

#[derive(Args)]
struct PathArgs {
    /// Output directory holding the built snapshot
    #[arg(short, long)]
    output: PathBuf,

    /// Start page title
    #[arg(long)]
    from: String,

    /// Target page title
    #[arg(long)]
    to: String,
}

#[derive(Args)]
struct FurthestArgs {
    /// Output directory holding the built snapshot
    #[arg(short, long)]
    output: PathBuf,

    /// Start page title
    #[arg(long)]
    from: String,
}

#[derive(Args)]
struct MaxArgs {
    /// Output directory holding the built reverse snapshot
    #[arg(short, long)]
    output: PathBuf,

    /// Target page title
    #[arg(long)]
    to: String,
}

#[derive(Args)]
struct DiameterArgs {
    /// Output directory holding the built snapshot
    #[arg(short, long)]
    output: PathBuf,

    /// Consecutive non-improving sweeps before estimation stops
    #[arg(long, default_value_t = ariadne::config::DIAMETER_STALL_LIMIT)]
    stall_limit: u32,
}

#[derive(Args)]
struct LinksArgs {
    /// Output directory holding the built snapshot
    #[arg(short, long)]
    output: PathBuf,

    /// Page title
    #[arg(long)]
    page: String,
}

#[derive(Args)]
struct ShellArgs {
    /// Output directory holding the built snapshots
    #[arg(short, long)]
    output: PathBuf,

    /// Consecutive non-improving sweeps before diameter estimation stops
    #[arg(long, default_value_t = ariadne::config::DIAMETER_STALL_LIMIT)]
    stall_limit: u32,
}

fn run_extract(args: ExtractArgs) -> Result<()> {
    let start = Instant::now();
    dump::run_extraction(&args.input, &args.output)?;
    info!(
        duration_secs = start.elapsed().as_secs_f64(),
        "Extraction complete"
    );
    Ok(())
}

fn run_build(args: BuildArgs) -> Result<()> {
    let start = Instant::now();
    let summary = builder::run_build(&args.output, args.reverse)?;
    let duration = start.elapsed();

    println!();
    println!("=== Summary ===");
    println!("Build time:         {:.2}s", duration.as_secs_f64());
    println!("Direction:          {}", if args.reverse { "reversed" } else { "forward" });
    println!();
    println!("Canonical pages:    {}", summary.pages);
    println!("Largest page id:    {}", summary.max_id);
    println!("Redirects kept:     {}", summary.catalog.redirects_kept);
    println!("Redirects dropped:  {}", summary.catalog.redirects_dropped);
    println!("Undecodable titles: {}", summary.catalog.undecodable_titles);
    println!();
    println!("Link records:       {}", summary.build.records);
    println!("Edges inserted:     {}", summary.build.edges_inserted);
    println!("Duplicate edges:    {}", summary.build.duplicate_edges);
    println!("Broken links:       {}", summary.build.broken_links);
    println!("Skipped sources:    {}", summary.build.skipped_sources);
    println!("Pages with links:   {}", summary.present);

    Ok(())
}

fn run_path(args: PathArgs) -> Result<()> {
    let catalog = store::load_catalog(&args.output)?;
    let graph = store::load_graph(&args.output, false)?;
    let engine = TraversalEngine::new(&graph, &catalog);

    let query = engine.shortest_path(&args.from, &args.to)?;
    match query.titles {
        Some(titles) => {
            println!("Reachable in {} steps:", titles.len() - 1);
            for title in titles {
                println!("{}", title);
            }
        }
        None => println!("No path found ({} pages explored).", query.visited),
    }
    Ok(())
}

fn run_furthest(args: FurthestArgs) -> Result<()> {
    let catalog = store::load_catalog(&args.output)?;
    let graph = store::load_graph(&args.output, false)?;
    let engine = TraversalEngine::new(&graph, &catalog);

    let query = engine.furthest(&args.from)?;
    println!(
        "The furthest page is '{}' at {} steps.",
        query.title, query.distance
    );
    Ok(())
}

fn run_max(args: MaxArgs) -> Result<()> {
    let catalog = store::load_catalog(&args.output)?;
    let graph = store::load_graph(&args.output, true)?;
    let engine = TraversalEngine::new(&graph, &catalog);

    let query = engine.furthest(&args.to)?;
    println!(
        "The maximal number of steps needed is {} from page '{}'.",
        query.distance, query.title
    );
    Ok(())
}

fn run_diameter(args: DiameterArgs) -> Result<()> {
    let catalog = store::load_catalog(&args.output)?;
    let graph = store::load_graph(&args.output, false)?;
    let engine = TraversalEngine::new(&graph, &catalog);

    let query = engine.estimate_diameter(args.stall_limit)?;
    println!("The estimated diameter is {}.", query.distance);
    println!("when going from '{}'", query.start);
    println!("to '{}'.", query.end);
    Ok(())
}

fn run_links(args: LinksArgs) -> Result<()> {
    let catalog = store::load_catalog(&args.output)?;
    let graph = store::load_graph(&args.output, false)?;
    let engine = TraversalEngine::new(&graph, &catalog);

    let links = engine.links(&args.page)?;
    println!("{} links:", links.len());
    for link in links {
        println!("{}", link);
    }
    Ok(())
}

fn run_shell(args: ShellArgs) -> Result<()> {
    Shell::new(args.output, args.stall_limit)?.run()
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Commands::Extract(args) => run_extract(args),
        Commands::Build(args) => run_build(args),
        Commands::Path(args) => run_path(args),
        Commands::Furthest(args) => run_furthest(args),
        Commands::Max(args) => run_max(args),
        Commands::Diameter(args) => run_diameter(args),
        Commands::Links(args) => run_links(args),
        Commands::Shell(args) => run_shell(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
