//! Interactive console command.

use std::io::{BufRead, IsTerminal, Write};

use clap::Args;
use kumiko_config::EngineConfig;
use kumiko_registry::take_print_history;

use super::common::{new_patcher, open_patch};
use crate::console::{Console, Reply};

#[derive(Args)]
pub struct ConsoleArgs {
    /// Patch to open (path or saved patch name)
    patch: Option<String>,

    /// Suppress the prompt and banner (for piped input)
    #[arg(short, long)]
    quiet: bool,
}

pub fn run(args: ConsoleArgs, config: &EngineConfig) -> anyhow::Result<()> {
    let patcher = match &args.patch {
        Some(name) => open_patch(name, config)?,
        None => new_patcher(config),
    };
    let interactive = !args.quiet && std::io::stdin().is_terminal();
    let mut console = Console::new(patcher, config.clone());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if interactive {
        writeln!(out, "kumiko console, 'help' lists commands")?;
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if interactive {
            write!(out, "> ")?;
            out.flush()?;
        }
        let Some(line) = lines.next() else { break };
        let line = line?;

        let reply = console.execute(&line);
        for printed in take_print_history() {
            writeln!(out, "{printed}")?;
        }
        match reply {
            Ok(Reply::Text(text)) if text.is_empty() => {}
            Ok(Reply::Text(text)) => writeln!(out, "{text}")?,
            Ok(Reply::Quit) => break,
            Err(error) => writeln!(out, "error: {error}")?,
        }
    }
    Ok(())
}
