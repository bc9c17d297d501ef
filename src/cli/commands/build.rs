//! Build command - sync the project and follow the build to its end

use crate::build::{BuildController, BuildHistory, BuildOptions, BuildSession, BuildStart, BuildState};
use crate::cache::{JsonFileBackend, SyncCache};
use crate::cli::args::BuildArgs;
use crate::cli::commands::open_project;
use crate::config::{Config, ConfigManager};
use crate::error::{TexsyncError, TexsyncResult};
use crate::remote::{CompileService, HttpCompileService};
use crate::status::{transport_for, ChannelEvent, ReconnectPolicy, StatusChannel};
use crate::sync::ChangeSummary;
use crate::ui::{self, HashProgress, TaskSpinner, UiContext};
use std::sync::Arc;
use tracing::debug;

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config) -> TexsyncResult<()> {
    let ctx = UiContext::detect();
    let project = open_project(args.project.as_deref())?;
    let options = build_options(&args, config);

    let service: Arc<dyn CompileService> = Arc::new(HttpCompileService::new(&config.server)?);
    let cache = SyncCache::new(Box::new(JsonFileBackend::new(ConfigManager::cache_dir())));
    let mut controller = BuildController::new(service, cache)
        .with_history(BuildHistory::new(config))
        .with_hash_concurrency(config.build.hash_concurrency);
    controller.open_project(project.clone()).await?;

    ui::intro(&ctx, &format!("texsync build: {}", project.name));

    // Subscribe before triggering so no push is missed
    let mut channel = if args.no_wait {
        None
    } else {
        let transport = transport_for(config, &project.id)?;
        debug!("Following build status via {}", transport.describe());
        Some(StatusChannel::spawn(
            transport,
            ReconnectPolicy::from_config(&config.status),
        ))
    };

    let start = if args.legacy {
        controller.build(&options).await
    } else {
        let files = project.collect_files(&config.build.exclude).await?;
        let progress = HashProgress::new(&ctx, files.len());
        let start = controller
            .build_with_delta_sync(files, &options, |done, total| progress.update(done, total))
            .await;
        progress.finish();
        start
    };

    let session = match start {
        BuildStart::Started(session) => session,
        BuildStart::NothingToBuild => {
            ui::outro_warn(&ctx, "No files to build");
            return Ok(());
        }
        BuildStart::AlreadyRunning => {
            ui::outro_warn(&ctx, "A build is already running");
            return Ok(());
        }
        BuildStart::Failed(session) => {
            ui::outro_error(&ctx, &session.message);
            return Err(TexsyncError::BuildFailed {
                build_id: session.build_id,
                message: session.message,
            });
        }
    };

    if let Some(changes) = controller.changes() {
        show_changes(&ctx, changes);
    }

    let Some(channel) = channel.as_mut() else {
        ui::outro_success(&ctx, &format!("Build {} accepted", session.build_id));
        return Ok(());
    };

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&session.message);

    let finished = tokio::select! {
        session = controller.run_until_terminal_with(channel, |event| match event {
            ChannelEvent::Update(update) => spinner.message(&update.message),
            ChannelEvent::Reconnecting { attempt, delay } => spinner.message(&format!(
                "Reconnecting to build status (attempt {}, in {:.1}s)",
                attempt,
                delay.as_secs_f64()
            )),
            ChannelEvent::Connected | ChannelEvent::Unavailable => {}
        }) => session,
        _ = tokio::signal::ctrl_c() => {
            spinner.stop_warn("Stopped waiting; the build continues on the server");
            return Ok(());
        }
    };

    report(&mut spinner, finished.unwrap_or(session))
}

fn build_options(args: &BuildArgs, config: &Config) -> BuildOptions {
    let mut options = BuildOptions::from(&config.build);
    if let Some(ref main) = args.main {
        options.main_file = main.clone();
    }
    if let Some(engine) = args.engine {
        options.engine = engine;
    }
    options.shell_escape |= args.shell_escape;
    options
}

fn show_changes(ctx: &UiContext, changes: &ChangeSummary) {
    let mut lines = Vec::new();
    for (label, names) in [
        ("modified", &changes.modified),
        ("added", &changes.added),
        ("removed", &changes.removed),
    ] {
        if !names.is_empty() {
            lines.push(format!("{}: {}", label, names.join(", ")));
        }
    }

    if lines.is_empty() {
        ui::remark(ctx, &format!("{} files unchanged since the last build", changes.unchanged.len()));
    } else {
        ui::note(ctx, "Local changes", &lines.join("\n"));
    }
}

fn report(spinner: &mut TaskSpinner, session: BuildSession) -> TexsyncResult<()> {
    let elapsed = session
        .duration()
        .map(|d| format!(" in {:.1}s", d.num_milliseconds() as f64 / 1000.0))
        .unwrap_or_default();

    match session.state {
        BuildState::Success => {
            spinner.stop(&format!("Build {} succeeded{}", session.build_id, elapsed));
            Ok(())
        }
        BuildState::Error => {
            spinner.stop_error(&format!("Build {} failed{}", session.build_id, elapsed));
            Err(TexsyncError::BuildFailed {
                build_id: session.build_id,
                message: session.message,
            })
        }
        state @ (BuildState::Queued | BuildState::Running) => {
            spinner.stop_warn("Build status unavailable");
            Err(TexsyncError::StatusUnavailable {
                build_id: session.build_id,
                state: state.to_string(),
            })
        }
    }
}
