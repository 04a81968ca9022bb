use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wxcomp::core::WxcError;

mod cli;

#[derive(Parser)]
#[command(name = "wxcomp")]
#[command(about = "Stage, register and prune mini-program component libraries")]
#[command(version)]
struct Cli {
    /// Production build (also enabled by NODE_ENV=production)
    #[arg(long, global = true)]
    production: bool,
    /// Path to wxcomp.yaml (default: searched upwards from the current directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Compiled output directory (overrides output_dir from the config)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy configured component libraries into the output tree
    Copy,
    /// Register staged components in the manifest
    Merge,
    /// Remove components the compiled markup never uses
    Prune {
        /// Show what would be removed without touching anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Run every lifecycle phase in order (prune only for production builds)
    Build,
    /// List registered library components and whether they are used
    List,
}

#[tokio::main]
async fn main() -> Result<(), WxcError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let production = cli.production
        || std::env::var("NODE_ENV").map(|v| v == "production").unwrap_or(false);
    let opts = cli::GlobalOptions {
        production,
        config: cli.config,
        output: cli.output,
    };

    let result = match cli.command {
        Commands::Copy => cli::copy::run(&opts).await,
        Commands::Merge => cli::merge::run(&opts).await,
        Commands::Prune { dry_run } => cli::prune::run(&opts, dry_run).await,
        Commands::Build => cli::build::run(&opts).await,
        Commands::List => cli::list::run(&opts).await,
    };

    // Display error with helpful suggestions
    if let Err(ref e) = result {
        eprintln!("\n{}", wxcomp::core::format_error_with_help(e));
    }

    result
}
