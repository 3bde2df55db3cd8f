//! kumiko CLI - console, offline render and object listing for kumiko patches.

mod commands;
mod console;
mod logging;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kumiko")]
#[command(author, version, about = "kumiko patching runtime", long_about = None)]
struct Cli {
    /// Engine config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit a patch interactively, one command per line on stdin
    Console(commands::console::ConsoleArgs),

    /// Render a patch offline to a WAV file
    Render(commands::render::RenderArgs),

    /// Run a patch in real time until Ctrl+C
    Run(commands::run::RunArgs),

    /// List available objects
    Objects(commands::objects::ObjectsArgs),

    /// List saved patches
    Patches,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = commands::common::load_config(cli.config.as_deref())?;
    logging::init(config.log_filter.as_deref());

    match cli.command {
        Commands::Console(args) => commands::console::run(args, &config),
        Commands::Render(args) => commands::render::run(args, &config),
        Commands::Run(args) => commands::run::run(args, &config),
        Commands::Objects(args) => commands::objects::run(&args),
        Commands::Patches => commands::patches::run(),
    }
}
