use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "hackdex",
    about = "Hackdex: hackathon records on decentralized storage",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file. `HACKDEX_*` variables override it.
    #[arg(short, long, global = true, env = "HACKDEX_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Kind {
    Hackathon,
    Project,
    Profile,
}

#[derive(Subcommand)]
pub enum Command {
    /// Find or create the master index
    Init,
    /// Create a record from a JSON payload
    Create(CreateArgs),
    /// Show one record
    Get(RecordArgs),
    /// Merge a JSON patch into a record
    Update(UpdateArgs),
    /// Remove a record from the index
    Delete(RecordArgs),
    /// List every record of a kind
    List(KindArgs),
    /// Search records by text and field filters
    Search(SearchArgs),
    /// List naming keys left behind by deleted records
    Orphans(KindArgs),
}

#[derive(Args)]
pub struct KindArgs {
    pub kind: Kind,
}

#[derive(Args)]
pub struct RecordArgs {
    pub kind: Kind,
    pub id: String,
}

#[derive(Args)]
pub struct CreateArgs {
    pub kind: Kind,
    /// Record fields as a JSON object
    pub data: String,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub kind: Kind,
    pub id: String,
    /// Fields to replace, as a JSON object
    pub patch: String,
}

#[derive(Args)]
pub struct SearchArgs {
    pub kind: Kind,
    /// Case-insensitive text to look for; empty matches everything
    #[arg(default_value = "")]
    pub query: String,
    /// `field=value` filter, repeatable
    #[arg(short, long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,
}

fn parse_filter(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected field=value, got {s:?}")),
    }
}
