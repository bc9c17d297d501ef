//! Init command - create a project-local .texsync.toml

use crate::cli::args::InitArgs;
use crate::config::LOCAL_CONFIG_FILE;
use crate::error::{TexsyncError, TexsyncResult};
use crate::ui::{self, UiContext};
use tokio::fs;

/// Template for project-local config
const INIT_TEMPLATE: &str = r#"# texsync project configuration
# Values here override the global config (texsync config path)

[build]
main_file = "main.tex"
# engine = "pdflatex"                 # pdflatex, xelatex, lualatex
# shell_escape = false
# exclude = ["*.aux", "*.log", "*.pdf", "build/**"]

# [server]
# url = "https://latex.example.com/api"
# token is better kept in TEXSYNC_TOKEN

# [status]
# transport = "sse"                   # sse, socket
# socket_addr = "127.0.0.1:7070"
"#;

/// Execute the init command
pub async fn execute(args: InitArgs) -> TexsyncResult<()> {
    let ctx = UiContext::detect();

    let target_dir = match args.path {
        Some(p) => p,
        None => std::env::current_dir()
            .map_err(|e| TexsyncError::io("getting current directory", e))?,
    };
    let config_path = target_dir.join(LOCAL_CONFIG_FILE);

    if config_path.exists() && !args.force {
        return Err(TexsyncError::User(format!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        )));
    }

    fs::create_dir_all(&target_dir)
        .await
        .map_err(|e| TexsyncError::io(format!("creating directory {}", target_dir.display()), e))?;
    fs::write(&config_path, INIT_TEMPLATE)
        .await
        .map_err(|e| TexsyncError::io(format!("writing {}", config_path.display()), e))?;

    ui::step_ok_detail(&ctx, "Created project config", &config_path.display().to_string());
    Ok(())
}
