//! History command - list recently finished builds

use crate::build::BuildHistory;
use crate::cli::args::{HistoryArgs, OutputFormat};
use crate::config::Config;
use crate::error::TexsyncResult;
use console::style;
use serde_json::Value;

/// Execute the history command
pub async fn execute(args: HistoryArgs, config: &Config) -> TexsyncResult<()> {
    let history = BuildHistory::new(config);
    let entries = history.tail(args.lines).await?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text if entries.is_empty() => println!("No builds recorded yet."),
        OutputFormat::Text => {
            for entry in &entries {
                println!("{}", format_entry(entry));
            }
        }
    }
    Ok(())
}

fn format_entry(entry: &Value) -> String {
    let field = |key: &str| entry[key].as_str().unwrap_or("-").to_string();

    let state = field("state");
    let state = match state.as_str() {
        "success" => style(&state).green().to_string(),
        "error" => style(&state).red().to_string(),
        _ => style(&state).yellow().to_string(),
    };
    let duration = entry["duration_ms"]
        .as_i64()
        .map(|ms| format!("{:.1}s", ms as f64 / 1000.0))
        .unwrap_or_else(|| "-".to_string());
    let timestamp = field("timestamp");
    let timestamp = timestamp.get(..19).unwrap_or(&timestamp);

    format!(
        "{}  {:<8} {:<38} {:>7}  {}",
        timestamp,
        state,
        field("build_id"),
        duration,
        field("message")
    )
}
