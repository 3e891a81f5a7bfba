use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "reel",
    about = "Reel: organize recordings into folders",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Store directory
    #[arg(short, long, global = true, default_value = ".")]
    pub dir: PathBuf,

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

/// Items are addressed by `root`, a full UUID, or a unique UUID prefix.
#[derive(Subcommand)]
pub enum Command {
    /// Create an empty store
    Init(InitArgs),
    /// Print the tree, or the subtree under an item
    Tree(TreeArgs),
    /// Create a folder
    Mkdir(MkdirArgs),
    /// Add a recording, optionally importing its audio
    Add(AddArgs),
    /// Rename an item
    Rename(RenameArgs),
    /// Move an item into another folder
    Mv(MvArgs),
    /// Delete an item and everything under it
    Rm(RmArgs),
    /// Print the identifier path from the root to an item
    Path(ItemArgs),
    /// Print where a recording's audio lives
    Locate(ItemArgs),
    /// Show details of an item
    Show(ItemArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Name of the root folder
    #[arg(long)]
    pub root_name: Option<String>,
}

#[derive(Args)]
pub struct TreeArgs {
    #[arg(default_value = "root")]
    pub item: String,
}

#[derive(Args)]
pub struct MkdirArgs {
    pub parent: String,
    pub name: String,
}

#[derive(Args)]
pub struct AddArgs {
    pub parent: String,
    pub name: String,
    /// Audio file to copy into the store
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct RenameArgs {
    pub item: String,
    pub name: String,
}

#[derive(Args)]
pub struct MvArgs {
    pub item: String,
    pub folder: String,
}

#[derive(Args)]
pub struct RmArgs {
    pub item: String,
}

#[derive(Args)]
pub struct ItemArgs {
    pub item: String,
}
