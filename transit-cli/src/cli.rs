use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use transit_auth::ClaimKind;

#[derive(Parser)]
#[command(
    name = "transit",
    version,
    about = "Inspect transit console tokens and dry-run authorization checks",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (JSON, or TOML by extension)
    #[arg(short, long, global = true, env = "TRANSIT_AUTH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,
}

/// Where to read the token from; stdin when neither is given
#[derive(clap::Args, Clone, Debug)]
pub struct TokenSource {
    /// The bearer token
    #[arg(short, long, env = "TRANSIT_TOKEN")]
    pub token: Option<String>,

    /// File containing the bearer token
    #[arg(long, conflicts_with = "token")]
    pub token_file: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Role,
    Permission,
}

impl From<KindArg> for ClaimKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Role => ClaimKind::Role,
            KindArg::Permission => ClaimKind::Permission,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode a token and show its claims, validity and resolved grants
    Inspect {
        #[command(flatten)]
        source: TokenSource,
    },

    /// Run check / check-any / check-all against a token
    Check {
        #[command(flatten)]
        source: TokenSource,

        /// Claim to check against
        #[arg(short, long, value_enum, default_value = "permission")]
        kind: KindArg,

        /// Items that must all be granted
        #[arg(long, value_delimiter = ',')]
        all: Vec<String>,

        /// Items of which at least one must be granted
        #[arg(long, value_delimiter = ',')]
        any: Vec<String>,

        /// A single item that must be granted
        item: Option<String>,
    },

    /// Show what the route guards would do with a token
    Guard {
        #[command(flatten)]
        source: TokenSource,

        /// Required permission
        #[arg(short, long)]
        permission: Option<String>,

        /// At least one of these permissions
        #[arg(long, value_delimiter = ',')]
        any_permission: Option<Vec<String>>,

        /// Redirect for denied users instead of the forbidden page
        #[arg(long)]
        fallback_path: Option<String>,
    },
}
