//! finctx CLI — the main entry point.
//!
//! Commands:
//! - `pack`      — Pack a records file into a context card
//! - `evidence`  — Build the evidence package for a records file
//! - `context`   — Both, as one paired response
//! - `tools`     — List the tool definitions
//! - `config`    — Show, locate, validate or initialize configuration
//!
//! JSON goes to stdout; logs go to stderr.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "finctx",
    about = "finctx — token-bounded financial context cards with provenance",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.finctx/config.toml
    #[arg(short, long, global = true, env = "FINCTX_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack records into a token-bounded context card
    Pack {
        /// JSON file holding a records array (or `{"records": [...]}`); `-` reads stdin
        file: PathBuf,

        #[command(flatten)]
        packing: commands::run::PackArgs,
    },

    /// Build the evidence package for records
    Evidence {
        /// JSON file holding a records array (or `{"records": [...]}`); `-` reads stdin
        file: PathBuf,

        #[command(flatten)]
        invocation: commands::run::InvocationArgs,
    },

    /// Pack records and attach their evidence
    Context {
        /// JSON file holding a records array (or `{"records": [...]}`); `-` reads stdin
        file: PathBuf,

        #[command(flatten)]
        packing: commands::run::PackArgs,

        #[command(flatten)]
        invocation: commands::run::InvocationArgs,
    },

    /// List available tools and their argument schemas
    Tools,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Validate the configuration
    Validate,
    /// Print a config file populated with defaults
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Pack { file, packing } => {
            commands::run::pack(config_path, &file, packing).await?
        }
        Commands::Evidence { file, invocation } => {
            commands::run::evidence(config_path, &file, invocation).await?
        }
        Commands::Context {
            file,
            packing,
            invocation,
        } => commands::run::context(config_path, &file, packing, invocation).await?,
        Commands::Tools => commands::run::tools()?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(config_path)?,
            ConfigAction::Path => commands::config_cmd::path(config_path),
            ConfigAction::Validate => commands::config_cmd::validate(config_path)?,
            ConfigAction::Init => commands::config_cmd::init(),
        },
    }

    Ok(())
}
