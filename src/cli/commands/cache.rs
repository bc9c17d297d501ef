//! Cache command - inspect or clear the local sync cache

use crate::cache::{JsonFileBackend, ProjectCache, SyncCache};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::cli::commands::open_project;
use crate::config::ConfigManager;
use crate::error::TexsyncResult;
use crate::ui::{self, UiContext};
use console::style;
use std::path::{Path, PathBuf};

/// Execute the cache command
pub async fn execute(args: CacheArgs) -> TexsyncResult<()> {
    let cache_dir = ConfigManager::cache_dir();

    match args.action {
        CacheAction::Show { project, format } => {
            let project = open_project(project.as_deref())?;
            let namespace = load_namespace(&cache_dir, &project.id).await?;
            match format {
                OutputFormat::Text => print_namespace(&project.name, &namespace),
                OutputFormat::Json => print_namespace_json(&namespace)?,
            }
            Ok(())
        }
        CacheAction::Path => {
            println!("{}", cache_dir.display());
            Ok(())
        }
        CacheAction::Clear { project, yes } => {
            let ctx = UiContext::detect().with_auto_yes(yes);
            let project = open_project(project.as_deref())?;
            clear(&ctx, &cache_dir, &project.id, &project.name).await
        }
    }
}

async fn load_namespace(cache_dir: &Path, project_id: &str) -> TexsyncResult<ProjectCache> {
    let mut cache = SyncCache::new(Box::new(JsonFileBackend::new(cache_dir)));
    cache.initialize_project(project_id).await?;
    Ok(cache
        .project(project_id)
        .cloned()
        .unwrap_or_else(|| ProjectCache::new(project_id)))
}

fn print_namespace(name: &str, namespace: &ProjectCache) {
    println!("{} {}", style(name).bold(), style(&namespace.project_id).dim());

    if namespace.entries.is_empty() {
        println!("No cached files.");
        return;
    }

    println!();
    println!("{:<48} {:<14} {:>10}", "FILE", "HASH", "SIZE");
    println!("{}", "-".repeat(74));
    for entry in namespace.entries.values() {
        println!(
            "{:<48} {:<14} {:>10}",
            entry.file_name,
            short_hash(&entry.file_hash),
            format_size(entry.size_bytes)
        );
    }

    let total: u64 = namespace.entries.values().map(|e| e.size_bytes).sum();
    let synced = namespace
        .last_synced_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string());

    println!();
    println!(
        "{} files, {} | {} successful builds | last synced {}",
        namespace.entries.len(),
        format_size(total),
        namespace.build_count,
        synced
    );
    if let Some(ref build_id) = namespace.last_build_id {
        println!("Last build: {}", build_id);
    }
}

fn print_namespace_json(namespace: &ProjectCache) -> TexsyncResult<()> {
    println!("{}", serde_json::to_string_pretty(namespace)?);
    Ok(())
}

async fn clear(ctx: &UiContext, cache_dir: &Path, project_id: &str, name: &str) -> TexsyncResult<()> {
    let path: PathBuf = JsonFileBackend::new(cache_dir).path_for(project_id);
    if !path.exists() {
        ui::step_info(ctx, &format!("No sync cache for {}", name));
        return Ok(());
    }

    let prompt = format!("Forget every cached fingerprint for {}?", name);
    if !ui::confirm(ctx, &prompt, false).await? {
        ui::remark(ctx, "Cancelled");
        return Ok(());
    }

    let mut cache = SyncCache::new(Box::new(JsonFileBackend::new(cache_dir)));
    cache.clear_project(project_id).await?;
    ui::step_ok_detail(ctx, "Cleared sync cache", name);
    ui::remark(ctx, "The next build uploads every file the server does not already hold");
    Ok(())
}

fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
