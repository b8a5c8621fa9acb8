use std::path::PathBuf;

use canopy_types::Tree;
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(
    name = "canopy",
    about = "canopy -- compare JSON trees against masks and rewrite them by path",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format; overrides the config file
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Config file (defaults to ./canopy.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compare a tree against a mask and report differences
    Compare(CompareArgs),
    /// Rewrite a tree by deleting or replacing values at paths
    Map(MapArgs),
    /// Remove keys at every depth of a tree
    Prune(PruneArgs),
}

#[derive(Args)]
pub struct CompareArgs {
    /// Tree document (`-` for stdin)
    pub tree: PathBuf,
    /// Mask document
    pub mask: PathBuf,
}

#[derive(Args)]
pub struct MapArgs {
    /// Tree document (`-` for stdin)
    pub tree: PathBuf,
    /// Delete the value at PATH (`a/b`, `a[]`, `a{}`)
    #[arg(long = "delete", value_name = "PATH")]
    pub delete: Vec<String>,
    /// Replace the value at PATH with a JSON value
    #[arg(long = "set", value_name = "PATH=JSON", value_parser = parse_assignment)]
    pub set: Vec<Assignment>,
}

#[derive(Args)]
pub struct PruneArgs {
    /// Tree document (`-` for stdin)
    pub tree: PathBuf,
    /// Key name to remove; may be repeated
    #[arg(short, long = "key", value_name = "NAME", required = true)]
    pub keys: Vec<String>,
}

/// A `--set PATH=JSON` argument.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    pub path: String,
    pub value: Tree,
}

fn parse_assignment(raw: &str) -> Result<Assignment, String> {
    let Some((path, value)) = raw.split_once('=') else {
        return Err(format!("expected PATH=JSON, got '{raw}'"));
    };
    let value = Tree::from_json_str(value).map_err(|e| e.to_string())?;
    Ok(Assignment {
        path: path.to_owned(),
        value,
    })
}
