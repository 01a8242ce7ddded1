use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use metromap_runtime::cli::{self, scan_cmd::ScanFormat};
use metromap_runtime::config::Config;
use metromap_runtime::insight::DIGEST_POINTS_PER_CATEGORY;

#[derive(Parser, Debug)]
#[command(name = "metromap", version)]
#[command(about = "Turn a web page into a metro map of evidence-backed facts")]
struct Cli {
    /// Configuration file (defaults to ~/.metromap/config.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Machine-readable JSON output
    #[arg(long, global = true)]
    json: bool,

    #[arg(short, long, global = true)]
    quiet: bool,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract data points, categories and transfers from a page
    Scan {
        /// Markup file, or `-` for stdin
        input: PathBuf,
        /// URL the markup was fetched from
        #[arg(long)]
        url: String,
        #[arg(long, value_enum, default_value_t = ScanFormat::Summary)]
        format: ScanFormat,
    },
    /// Scan and compute the metro-map geometry
    Layout {
        input: PathBuf,
        #[arg(long)]
        url: String,
    },
    /// Print the insight digest for a page
    Digest {
        input: PathBuf,
        #[arg(long)]
        url: String,
        #[arg(long, default_value_t = DIGEST_POINTS_PER_CATEGORY)]
        per_category: usize,
    },
    /// Print the effective configuration
    Config,
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = match (quiet, verbose) {
        (true, _) => "metromap_runtime=warn",
        (_, true) => "metromap_runtime=debug",
        _ => "metromap_runtime=info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    for (flag, var) in [
        (args.json, "METROMAP_JSON"),
        (args.quiet, "METROMAP_QUIET"),
        (args.verbose, "METROMAP_VERBOSE"),
        (args.no_color, "METROMAP_NO_COLOR"),
    ] {
        if flag {
            std::env::set_var(var, "1");
        }
    }
    init_tracing(args.quiet, args.verbose)?;

    let config = Config::resolve(args.config.as_deref()).context("failed to load configuration")?;

    match args.command {
        Command::Scan { input, url, format } => cli::scan_cmd::run(&input, &url, format, &config).await,
        Command::Layout { input, url } => cli::layout_cmd::run(&input, &url, &config).await,
        Command::Digest {
            input,
            url,
            per_category,
        } => cli::digest_cmd::run(&input, &url, per_category, &config).await,
        Command::Config => cli::config_cmd::run(args.config.as_deref(), &config).await,
    }
}
