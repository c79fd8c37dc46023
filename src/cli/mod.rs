//! CLI module for netslice
//!
//! Command-line interface definitions and handlers for the slice controller.
//!
//! # Commands
//!
//! - `apply` - Create or update a slice on its routers
//! - `check` - Run one drift check and print the status patch
//! - `delete` - Remove a slice from its routers
//! - `render` - Print the configuration documents without contacting devices
//! - `watch` - Apply, then check periodically until interrupted
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Push a slice
//! netslice apply -f slices/vpls-100.toml
//!
//! # Keep two slices in sync every 60 seconds
//! netslice watch -f vpls-100.toml -f epipe-200.json --interval 60
//! ```

pub mod completions;
pub mod config;
pub mod output;
pub mod slice;
pub mod watch;

pub use completions::handle_completions;
pub use config::handle_config_init;

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// netslice - network slice controller
#[derive(Parser, Debug)]
#[command(
    name = "netslice",
    version,
    about = "Keeps VPLS/VPRN/EPIPE services on a router fleet in sync with declared intent"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or update a slice
    Apply(PassArgs),
    /// Check a slice for drift and repair it
    Check(PassArgs),
    /// Remove a slice from every router
    Delete(PassArgs),
    /// Print rendered configuration documents
    Render(RenderArgs),
    /// Apply slices, then check them periodically
    Watch(WatchArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options shared by every command that talks to devices.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "netslice.toml")]
    pub config: PathBuf,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "NETSLICE_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Args, Debug)]
pub struct PassArgs {
    /// Intent file (TOML or JSON)
    #[arg(short, long)]
    pub file: PathBuf,

    #[command(flatten)]
    pub common: ConfigArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Intent file (TOML or JSON)
    #[arg(short, long)]
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Intent files (repeatable)
    #[arg(short = 'f', long = "file", required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub common: ConfigArgs,

    /// Override seconds between drift checks
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,

    /// Skip the initial apply pass
    #[arg(long)]
    pub no_apply: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "netslice.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
