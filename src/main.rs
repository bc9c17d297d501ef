//! texsync - CLI entry point that dispatches to subcommands

use clap::Parser;
use console::style;
use std::process::ExitCode;
use texsync::cli::commands;
use texsync::cli::{Cli, Commands};
use texsync::config::{Config, ConfigManager};
use texsync::error::{TexsyncError, TexsyncResult};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> TexsyncResult<()> {
    let cli = Cli::parse();

    // Commands that need neither config nor logging
    let command = match cli.command {
        Commands::Init(args) => return commands::init(args).await,
        Commands::Completions(args) => return commands::completions(args),
        command => command,
    };

    let manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    let local_config = if cli.no_local {
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| TexsyncError::io("getting current directory", e))?;
        ConfigManager::find_local_config(&cwd)
    };

    let config = manager.load_merged(local_config.as_deref()).await?;
    init_logging(cli.verbose, &config);
    if let Some(ref path) = local_config {
        debug!("Using local config {}", path.display());
    }

    texsync::ui::init_theme();
    ConfigManager::ensure_state_dirs().await?;

    match command {
        Commands::Build(args) => commands::build(args, &config).await,
        Commands::Synctex(args) => commands::synctex(args, &config).await,
        Commands::Cache(args) => commands::cache(args).await,
        Commands::History(args) => commands::history(args, &config).await,
        Commands::Config(args) => commands::config(args, &config, &manager).await,
        Commands::Init(_) | Commands::Completions(_) => Ok(()),
    }
}

/// 0 = warn (spinners only), 1 = info, 2+ = debug; RUST_LOG wins when set
fn init_logging(verbose: u8, config: &Config) {
    let default = match verbose {
        0 => "texsync=warn",
        1 => "texsync=info",
        _ => "texsync=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
