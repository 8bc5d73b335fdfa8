use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "procstore",
    about = "Inspect and maintain image record stores",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Which store to open
    #[arg(short, long, global = true, default_value = "search")]
    pub kind: StoreKind,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreKind {
    Search,
    Recognize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the records in the working directory
    List(ListArgs),
    /// Load an image file or a directory of images
    Add(AddArgs),
    /// Remove a file or a directory from the index
    Remove(RemoveArgs),
    /// Show groups of records with equal content
    Duplicates,
    /// Save every record under unique names into a folder
    Export(ExportArgs),
}

#[derive(Args)]
pub struct ListArgs {
    /// Show names made unique across directories
    #[arg(short, long)]
    pub unique: bool,
}

#[derive(Args)]
pub struct AddArgs {
    pub path: PathBuf,
}

#[derive(Args)]
pub struct RemoveArgs {
    pub path: PathBuf,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Folder name, created inside the working directory
    pub folder: String,
}
