//! sqlstep CLI - apply numbered SQL migrations exactly once

use anyhow::Result;
use clap::Parser;
use env_logger::Env;

mod cli;
mod commands;

use cli::Cli;
use commands::{apply, ls, new, status};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.global.verbose { "debug" } else { "info" };
    env_logger::init_from_env(Env::default().default_filter_or(default_filter));

    match &cli.command {
        cli::Commands::Apply(args) => apply::execute(args, &cli.global),
        cli::Commands::Status(args) => status::execute(args, &cli.global),
        cli::Commands::Ls(args) => ls::execute(args, &cli.global),
        cli::Commands::New(args) => new::execute(args, &cli.global),
    }
}
