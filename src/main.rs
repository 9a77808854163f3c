// Command-line entry point for hitgraph.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use hitgraph::api::server::{self, ServerOptions};
use hitgraph::application::Session;
use hitgraph::config::Config;
use hitgraph::infrastructure::{
    read_capture_log, run_selection_loop, DotRenderer, JsonTableView, TextTableView,
};
use hitgraph::ports::TableView;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a capture log through a session and write the call graph
    Replay(ReplayArgs),

    /// Serve capture sessions to a debugger hook over TCP
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Capture log (JSON lines, one breakpoint hit per line)
    #[arg(short, long)]
    input: PathBuf,

    /// Directory for the DOT files
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Breakpoint location the log was captured at (defaults to the file stem)
    #[arg(short, long)]
    location: Option<String>,

    /// Capture index to highlight after completion (repeatable)
    #[arg(short, long)]
    select: Vec<usize>,

    /// Read row selections from stdin after completion
    #[arg(long)]
    interactive: bool,

    /// Locals table format
    #[arg(short, long, value_enum, default_value_t = TableFormat::Text)]
    format: TableFormat,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Port to listen on (localhost only)
    #[arg(short, long, default_value_t = 4599)]
    port: u16,

    /// Directory for the DOT files; renders stay in memory when omitted
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum TableFormat {
    Text,
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load_or_default(cli.config.as_deref())?;
    match cli.command {
        Command::Replay(args) => replay(&config, args),
        Command::Serve(args) => server::start_server(
            args.port,
            ServerOptions {
                config,
                output_dir: args.output_dir,
            },
        ),
    }
}

fn replay(config: &Config, args: ReplayArgs) -> Result<()> {
    let records = read_capture_log(&args.input)?;
    if records.is_empty() {
        warn!(input = %args.input.display(), "capture log is empty");
    }

    let location = args
        .location
        .clone()
        .unwrap_or_else(|| default_location(&args.input));
    let renderer = DotRenderer::new(&args.output_dir);
    let table_view: Box<dyn TableView> = match args.format {
        TableFormat::Text => Box::new(TextTableView::new(io::stdout())),
        TableFormat::Json => Box::new(JsonTableView::new(io::stdout())),
    };

    let mut session = Session::start(&location, config, &renderer, table_view.as_ref())?;
    let mut paused = 0usize;
    for record in records {
        let (frames, locals) = record.into_parts();
        if session.on_capture(frames, locals) {
            paused += 1;
        }
    }
    if paused > 0 {
        info!(paused, "replayed captures would have paused the target");
    }

    session
        .on_complete()
        .with_context(|| format!("Failed to complete session for {}", args.input.display()))?;

    for index in &args.select {
        if let Err(e) = session.on_row_selected(*index) {
            warn!(index, "selection failed: {:#}", e);
        }
    }

    if args.interactive {
        info!("enter a stack index to highlight it, q to quit");
        let stdin = io::stdin();
        run_selection_loop(&session, stdin.lock())?;
    }

    Ok(())
}

fn default_location(input: &Path) -> String {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "call-graph".to_string())
}
