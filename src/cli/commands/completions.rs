//! Completions command - print a shell completion script

use crate::cli::args::{Cli, CompletionsArgs};
use crate::error::TexsyncResult;
use clap::CommandFactory;

pub fn execute(args: CompletionsArgs) -> TexsyncResult<()> {
    let mut command = Cli::command();
    clap_complete::generate(args.shell, &mut command, "texsync", &mut std::io::stdout());
    Ok(())
}
