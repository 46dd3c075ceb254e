use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "vyos-netgen")]
#[command(about = "Generate, merge and compare VyOS configuration trees")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Show the parsed structure of a template directory.
    Inspect(InspectArgs),
    /// Generate a definition tree from one inventory.
    Generate(GenerateArgs),
    /// Generate several inventories and merge the results.
    Merge(MergeArgs),
    /// Compare the definition trees generated from two inventories.
    Diff(DiffArgs),
    /// Compare two template directories.
    SchemaDiff(SchemaDiffArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct SourceArgs {
    /// Template directory. Defaults to `templates_dir` from the config.
    #[arg(long)]
    pub templates: Option<PathBuf>,
    /// Generator config TOML. Defaults to the embedded config.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    pub templates: PathBuf,
    /// Start at this schema path (e.g. `firewall/name`).
    #[arg(long)]
    pub path: Option<String>,
    #[arg(long, default_value_t = 3)]
    pub depth: usize,
    /// Show derived validation constraints.
    #[arg(long)]
    pub constraints: bool,
}

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    pub inventory: PathBuf,
    #[command(flatten)]
    pub source: SourceArgs,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Print counts and rule counters instead of the tree.
    #[arg(long)]
    pub summary: bool,
    /// Check every value against the schema; fail when issues are found.
    #[arg(long)]
    pub validate: bool,
}

#[derive(Parser, Debug)]
pub struct MergeArgs {
    #[arg(required = true, num_args = 2..)]
    pub inventories: Vec<PathBuf>,
    #[command(flatten)]
    pub source: SourceArgs,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct DiffArgs {
    pub left: PathBuf,
    pub right: PathBuf,
    #[command(flatten)]
    pub source: SourceArgs,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    #[arg(long)]
    pub summary: bool,
    /// Include identical paths.
    #[arg(long)]
    pub identical: bool,
    #[arg(long)]
    pub ignore: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct SchemaDiffArgs {
    pub left: PathBuf,
    pub right: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    #[arg(long)]
    pub summary: bool,
    /// Maximum compared depth; -1 compares everything.
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub max_depth: i32,
    #[arg(long)]
    pub identical: bool,
    #[arg(long)]
    pub ignore: Vec<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}
