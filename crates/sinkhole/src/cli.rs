//! Clap derive structures for the `sinkhole` CLI.
//!
//! Kept free of crate-internal imports: `build.rs` includes this file to
//! render man pages and completions.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// sinkhole -- remote control for a DNS-filtering appliance
#[derive(Debug, Parser)]
#[command(
    name = "sinkhole",
    version,
    about = "Control a DNS sinkhole appliance from the command line",
    long_about = "Sign in to a DNS-filtering appliance, check whether blocking is on,\n\
        pause it for a while, and manage the allow and deny lists.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Appliance URL (overrides the config file)
    #[arg(long, short = 's', env = "SINKHOLE_SERVER", global = true)]
    pub server: Option<String>,

    /// Output format [default: from config, else plain]
    #[arg(long, short = 'o', env = "SINKHOLE_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "SINKHOLE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds [default: from config, else 10]
    #[arg(long, env = "SINKHOLE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Plain,
    /// Pretty-printed JSON
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in to the appliance and store the password in the keyring
    Login,

    /// Show whether blocking is active
    #[command(alias = "st")]
    Status,

    /// Pause blocking for a number of seconds
    Pause(PauseArgs),

    /// Manage the allow list
    Allow(DomainArgs),

    /// Manage the deny list
    Deny(DomainArgs),

    /// Follow the blocking state until interrupted
    Watch,

    /// Inspect or edit the CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PauseArgs {
    /// How long to pause, in seconds
    pub seconds: u32,
}

#[derive(Debug, Args)]
pub struct DomainArgs {
    #[command(subcommand)]
    pub command: DomainCommand,
}

#[derive(Debug, Subcommand)]
pub enum DomainCommand {
    /// Add a domain to the list
    Add {
        /// Exact domain name
        domain: String,
    },

    /// Remove a domain from the list
    #[command(alias = "rm")]
    Remove {
        /// Exact domain name
        domain: String,
    },
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Print the config file location
    Path,

    /// Set the default appliance URL
    SetServer {
        /// Appliance URL, e.g. http://pi.hole
        url: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
