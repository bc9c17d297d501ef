//! Synctex command - forward and inverse search against the last build

use crate::cache::{JsonFileBackend, SyncCache};
use crate::cli::args::{OutputFormat, SynctexAction, SynctexArgs};
use crate::cli::commands::open_project;
use crate::config::{Config, ConfigManager};
use crate::error::{TexsyncError, TexsyncResult};
use crate::remote::HttpCompileService;
use crate::synctex::SynctexMapper;
use crate::ui::{self, UiContext};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Execute the synctex command
pub async fn execute(args: SynctexArgs, config: &Config) -> TexsyncResult<()> {
    let ctx = UiContext::detect();
    let project = open_project(args.project.as_deref())?;
    let build_id = last_build_id(&ConfigManager::cache_dir(), &project.id).await?;

    let service = Arc::new(HttpCompileService::new(&config.server)?);
    let mapper = SynctexMapper::fixed(service, Some(build_id));

    match args.action {
        SynctexAction::View { file, line, column } => {
            let result = mapper.from_cursor(&file, line, column).await?;
            print_result(&ctx, args.format, result.as_ref(), |r| {
                vec![
                    ("Page", r.page.to_string()),
                    ("Position", format!("{:.2}, {:.2}", r.x, r.y)),
                    ("Source", format!("{}:{}", r.file, r.line)),
                ]
            })
        }
        SynctexAction::Edit { page, x, y } => {
            let result = mapper.from_click(page, x, y).await?;
            print_result(&ctx, args.format, result.as_ref(), |r| {
                vec![
                    ("File", r.file.clone()),
                    ("Line", r.line.to_string()),
                    ("Column", r.col.to_string()),
                ]
            })
        }
    }
}

/// Id of the last successful build recorded for a project
async fn last_build_id(cache_dir: &Path, project_id: &str) -> TexsyncResult<String> {
    let mut cache = SyncCache::new(Box::new(JsonFileBackend::new(cache_dir)));
    cache.initialize_project(project_id).await?;
    cache
        .project(project_id)
        .and_then(|p| p.last_build_id.clone())
        .ok_or(TexsyncError::NoSuccessfulBuild)
}

fn print_result<T, F>(
    ctx: &UiContext,
    format: OutputFormat,
    result: Option<&T>,
    fields: F,
) -> TexsyncResult<()>
where
    T: Serialize,
    F: Fn(&T) -> Vec<(&'static str, String)>,
{
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => match result {
            Some(result) => {
                for (key, value) in fields(result) {
                    ui::key_value(ctx, key, &value);
                }
            }
            None => ui::remark(ctx, "No mapping for this position"),
        },
    }
    Ok(())
}
