//! CLI argument definitions using clap derive

use crate::build::Engine;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// texsync - incremental LaTeX builds against a remote compiler
///
/// Uploads only the files the server does not already have, follows the
/// build until it finishes, and maps between source and PDF positions.
#[derive(Parser, Debug)]
#[command(name = "texsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "TEXSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .texsync.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sync the project and run a build
    Build(BuildArgs),

    /// Map between source positions and PDF coordinates
    Synctex(SynctexArgs),

    /// Inspect or clear the local sync cache
    Cache(CacheArgs),

    /// Show recently finished builds
    History(HistoryArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),

    /// Create a project-local .texsync.toml
    Init(InitArgs),

    /// Print shell completions
    Completions(CompletionsArgs),
}

/// Output format for listing commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Project directory (defaults to current directory)
    #[arg(short, long)]
    pub project: Option<PathBuf>,

    /// Main .tex file, relative to the project root
    #[arg(short, long)]
    pub main: Option<String>,

    /// TeX engine
    #[arg(short, long)]
    pub engine: Option<Engine>,

    /// Allow \write18 during the build
    #[arg(long)]
    pub shell_escape: bool,

    /// Trigger the build without delta sync
    #[arg(long)]
    pub legacy: bool,

    /// Return once the build is accepted instead of waiting for the result
    #[arg(long)]
    pub no_wait: bool,
}

#[derive(Parser, Debug)]
pub struct SynctexArgs {
    #[command(subcommand)]
    pub action: SynctexAction,

    /// Project directory (defaults to current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum SynctexAction {
    /// Forward search: source line to PDF location
    View {
        /// Source file, relative to the project root
        #[arg(long)]
        file: String,

        /// 1-based line
        #[arg(long)]
        line: u32,

        /// 1-based column
        #[arg(long, default_value = "1")]
        column: u32,
    },

    /// Inverse search: PDF point to source position
    Edit {
        /// 1-based page
        #[arg(long)]
        page: u32,

        /// Horizontal offset in PDF points
        #[arg(short)]
        x: f64,

        /// Vertical offset in PDF points, from the top
        #[arg(short)]
        y: f64,
    },
}

#[derive(Parser, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show cached fingerprints for a project
    Show {
        /// Project directory (defaults to current directory)
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print where sync caches are stored
    Path,

    /// Forget every cached fingerprint for a project
    Clear {
        /// Project directory (defaults to current directory)
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Number of entries to show (0 = all)
    #[arg(short = 'n', long, default_value = "20")]
    pub lines: usize,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Show the global config file path
    Path,

    /// Write a default global config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite existing .texsync.toml
    #[arg(short, long)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(short, long)]
    pub path: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_parses_build_defaults() {
        let cli = Cli::parse_from(["texsync", "build"]);
        match cli.command {
            Commands::Build(args) => {
                assert!(args.project.is_none());
                assert!(args.main.is_none());
                assert!(args.engine.is_none());
                assert!(!args.legacy);
                assert!(!args.no_wait);
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn cli_parses_build_flags() {
        let cli = Cli::parse_from([
            "texsync",
            "build",
            "--main",
            "thesis.tex",
            "--engine",
            "lualatex",
            "--shell-escape",
            "--no-wait",
        ]);
        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.main.as_deref(), Some("thesis.tex"));
                assert_eq!(args.engine, Some(Engine::Lualatex));
                assert!(args.shell_escape);
                assert!(args.no_wait);
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn cli_parses_synctex_view() {
        let cli = Cli::parse_from([
            "texsync", "synctex", "view", "--file", "ch1.tex", "--line", "42",
        ]);
        match cli.command {
            Commands::Synctex(args) => match args.action {
                SynctexAction::View { file, line, column } => {
                    assert_eq!(file, "ch1.tex");
                    assert_eq!(line, 42);
                    assert_eq!(column, 1);
                }
                _ => panic!("expected view"),
            },
            _ => panic!("expected Synctex command"),
        }
    }

    #[test]
    fn cli_parses_synctex_edit() {
        let cli = Cli::parse_from([
            "texsync", "synctex", "edit", "--page", "2", "-x", "72.5", "-y", "300", "--format",
            "json",
        ]);
        match cli.command {
            Commands::Synctex(args) => {
                assert_eq!(args.format, OutputFormat::Json);
                match args.action {
                    SynctexAction::Edit { page, x, y } => {
                        assert_eq!(page, 2);
                        assert_eq!(x, 72.5);
                        assert_eq!(y, 300.0);
                    }
                    _ => panic!("expected edit"),
                }
            }
            _ => panic!("expected Synctex command"),
        }
    }

    #[test]
    fn cli_parses_cache_clear() {
        let cli = Cli::parse_from(["texsync", "cache", "clear", "--yes"]);
        match cli.command {
            Commands::Cache(CacheArgs {
                action: CacheAction::Clear { yes, project },
            }) => {
                assert!(yes);
                assert!(project.is_none());
            }
            _ => panic!("expected cache clear"),
        }
    }

    #[test]
    fn cli_parses_history_lines() {
        let cli = Cli::parse_from(["texsync", "history", "-n", "5"]);
        match cli.command {
            Commands::History(args) => assert_eq!(args.lines, 5),
            _ => panic!("expected History command"),
        }
    }

    #[test]
    fn cli_parses_init_force() {
        let cli = Cli::parse_from(["texsync", "init", "--force"]);
        match cli.command {
            Commands::Init(args) => assert!(args.force),
            _ => panic!("expected Init command"),
        }
    }

    #[test]
    fn cli_no_local_flag() {
        let cli = Cli::parse_from(["texsync", "--no-local", "history"]);
        assert!(cli.no_local);
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["texsync", "history"]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["texsync", "-v", "history"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["texsync", "-vv", "history"]);
        assert_eq!(cli.verbose, 2);
    }
}
