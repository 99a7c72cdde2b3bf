use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "imsto",
    about = "imsto: content-addressed image storage",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding imsto.toml (defaults to $IMSTO_CONF)
    #[arg(long, global = true)]
    pub conf: Option<PathBuf>,

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

#[derive(Subcommand)]
pub enum Command {
    /// Store a file under a roof
    Put(PutArgs),
    /// Fetch an object by id or key
    Get(GetArgs),
    /// Check whether an object exists
    Exists(TargetArgs),
    /// Delete an object
    Delete(TargetArgs),
    /// Show the metadata recorded for an object
    Meta(TargetArgs),
    /// List stored objects
    List(ListArgs),
    /// Convert between content hashes and ids
    Id(IdArgs),
    /// Show registered storage engines
    Engines,
    /// Show administrable roofs from the configuration
    Roofs,
}

#[derive(Args)]
pub struct PutArgs {
    pub roof: String,
    pub file: PathBuf,
}

#[derive(Args)]
pub struct GetArgs {
    pub roof: String,
    pub id: String,
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct TargetArgs {
    pub roof: String,
    pub id: String,
}

#[derive(Args)]
pub struct ListArgs {
    pub roof: String,
    #[arg(long)]
    pub prefix: Option<String>,
    #[arg(long)]
    pub marker: Option<String>,
    #[arg(short = 'n', long, default_value = "0")]
    pub limit: usize,
    #[arg(long)]
    pub delimiter: Option<String>,
}

#[derive(Args)]
pub struct IdArgs {
    #[command(subcommand)]
    pub action: IdAction,
}

#[derive(Subcommand)]
pub enum IdAction {
    /// Base-16 content hash to id
    Encode { hash: String },
    /// Id to base-16 content hash
    Decode { id: String },
}
