use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "s3repo")]
#[command(about = "Serve package repositories from S3 buckets", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $S3REPO_CONFIG or config/s3repo.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// AWS credentials profile for repositories that do not name one
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show configured repositories and how they are served
    List(ListArgs),
    /// Download a repository file to a local path
    Fetch(FetchArgs),
    /// Write a repository file to stdout
    Cat(CatArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// Repository id
    pub repo: String,
    /// Path relative to the repository, e.g. repodata/repomd.xml
    pub path: String,
    /// Local file to write
    pub dest: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct CatArgs {
    /// Repository id
    pub repo: String,
    /// Path as the host passes it for whole reads, e.g. x86_64/repodata/repomd.xml
    pub path: String,
    /// Read the object into memory first instead of streaming it
    #[arg(long)]
    pub whole: bool,
}
