mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use s3repo::config::Config;
use s3repo::observability;
use s3repo::repo::replace_repositories;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    observability::init_logging(cli.verbose);

    let config = match cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    let host = config.host_options(cli.profile.as_deref());
    let replacement = replace_repositories(config.repositories(), &host);

    match cli.command {
        Commands::List(args) => commands::list(&replacement, args.json)?,
        Commands::Fetch(args) => commands::fetch(&replacement, &args.repo, &args.path, &args.dest)?,
        Commands::Cat(args) => commands::cat(&replacement, &args.repo, &args.path, args.whole)?,
    }

    Ok(())
}
