//! Build lifecycle controller
//!
//! Owns the sync cache and the one build session a client tracks. A build
//! is in flight exactly while that session exists and is not terminal, so
//! overlapping requests collapse into the running build.
//!
//! Status pushes enter through [`BuildController::update_status`], the only
//! place session state moves once a build has started.

use crate::build::history::BuildHistory;
use crate::build::session::{BuildSession, BuildState, Engine};
use crate::cache::{CacheEntry, SyncCache};
use crate::config::schema::BuildConfig;
use crate::error::{TexsyncError, TexsyncResult};
use crate::fingerprint::FileChecksum;
use crate::project::{Project, ProjectFile};
use crate::remote::{CompileService, LegacyBuildRequest, StatusEvent};
use crate::status::{ChannelEvent, StatusChannel};
use crate::sync::{ChangeSummary, DeltaManifest, Negotiator, SyncRequest};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Per-build settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub main_file: String,
    pub engine: Engine,
    pub shell_escape: bool,
}

impl From<&BuildConfig> for BuildOptions {
    fn from(config: &BuildConfig) -> Self {
        Self {
            main_file: config.main_file.clone(),
            engine: config.engine,
            shell_escape: config.shell_escape,
        }
    }
}

/// Result of asking for a build
#[derive(Debug, Clone, PartialEq)]
pub enum BuildStart {
    /// Sent to the server; terminal state arrives over the status channel
    Started(BuildSession),
    /// A build is already in flight; nothing was sent
    AlreadyRunning,
    /// The project has no files
    NothingToBuild,
    /// Initiation failed; the session is already terminal
    Failed(BuildSession),
}

/// Effect of one status push
#[derive(Debug, Clone, PartialEq)]
pub enum StatusOutcome {
    /// Unrelated build, duplicate, or session already terminal
    Ignored,
    Updated(BuildSession),
    Completed(BuildSession),
}

/// Checksums waiting for the build they were uploaded for to succeed
struct PendingSync {
    project_id: String,
    checksums: Vec<FileChecksum>,
}

pub struct BuildController {
    service: Arc<dyn CompileService>,
    cache: SyncCache,
    history: Option<BuildHistory>,
    hash_concurrency: usize,
    project: Option<Project>,
    session: Option<BuildSession>,
    pending: Option<PendingSync>,
    changes: Option<ChangeSummary>,
    sessions: watch::Sender<Option<BuildSession>>,
    last_success: watch::Sender<Option<String>>,
}

impl BuildController {
    pub fn new(service: Arc<dyn CompileService>, cache: SyncCache) -> Self {
        let (sessions, _) = watch::channel(None);
        let (last_success, _) = watch::channel(None);
        Self {
            service,
            cache,
            history: None,
            hash_concurrency: 8,
            project: None,
            session: None,
            pending: None,
            changes: None,
            sessions,
            last_success,
        }
    }

    /// Append finished builds to a history log
    pub fn with_history(mut self, history: BuildHistory) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_hash_concurrency(mut self, concurrency: usize) -> Self {
        self.hash_concurrency = concurrency.max(1);
        self
    }

    /// Make `project` the target of subsequent builds.
    ///
    /// Loads its cache namespace and restores the last successful build id
    /// so SyncTeX works before the first build of this run.
    pub async fn open_project(&mut self, project: Project) -> TexsyncResult<()> {
        self.cache.initialize_project(&project.id).await?;
        self.cache.set_current_project(&project.id);

        let last_build = self
            .cache
            .project(&project.id)
            .and_then(|p| p.last_build_id.clone());
        self.last_success.send_replace(last_build);

        info!("Opened project {} ({})", project.name, project.id);
        self.project = Some(project);
        Ok(())
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn session(&self) -> Option<&BuildSession> {
        self.session.as_ref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.is_terminal())
    }

    pub fn cache(&self) -> &SyncCache {
        &self.cache
    }

    /// Local change summary of the latest delta-synced attempt
    pub fn changes(&self) -> Option<&ChangeSummary> {
        self.changes.as_ref()
    }

    /// Session updates for observers
    pub fn subscribe(&self) -> watch::Receiver<Option<BuildSession>> {
        self.sessions.subscribe()
    }

    /// Id of the latest successful build, for scoping SyncTeX queries
    pub fn last_successful_build(&self) -> watch::Receiver<Option<String>> {
        self.last_success.subscribe()
    }

    /// Trigger a build without delta sync.
    ///
    /// The server fetches sources itself; the session's id comes from the
    /// trigger ack or, failing that, from the first pushed event.
    pub async fn build(&mut self, options: &BuildOptions) -> BuildStart {
        if self.is_in_flight() {
            info!("Build already in flight, ignoring request");
            return BuildStart::AlreadyRunning;
        }

        let session = BuildSession::queued();
        self.publish(session.clone());

        let Some(project_id) = self.project.as_ref().map(|p| p.id.clone()) else {
            return self.fail_to_start(session, no_project()).await;
        };

        let request = LegacyBuildRequest {
            main_file: options.main_file.clone(),
            engine: options.engine,
            shell_escape: options.shell_escape,
        };

        match self.service.trigger_build(&project_id, &request).await {
            Ok(ack) => {
                let mut session = session;
                match ack.build_id.as_deref() {
                    Some(build_id) => session.bind(build_id),
                    None => {
                        debug!("Trigger ack carried no build id, waiting for first push");
                        session.unbind();
                    }
                }
                session.mark_running("Compiling");
                self.pending = None;
                self.changes = None;
                info!("Build {} started", session.build_id);
                self.publish(session.clone());
                BuildStart::Started(session)
            }
            Err(e) => self.fail_to_start(session, e).await,
        }
    }

    /// Fingerprint, negotiate, and upload only what the server lacks.
    pub async fn build_with_delta_sync<F>(
        &mut self,
        files: Vec<ProjectFile>,
        options: &BuildOptions,
        on_progress: F,
    ) -> BuildStart
    where
        F: FnMut(usize, usize),
    {
        if self.is_in_flight() {
            info!("Build already in flight, ignoring request");
            return BuildStart::AlreadyRunning;
        }

        let Some(project) = self.project.clone() else {
            return self.fail_to_start(BuildSession::queued(), no_project()).await;
        };

        if files.is_empty() {
            info!("Project {} has no files, nothing to build", project.name);
            return BuildStart::NothingToBuild;
        }

        let mut session = BuildSession::queued();
        self.publish(session.clone());

        let local = self.cache.known_hashes(&project.id);
        let request = SyncRequest {
            project,
            files,
            main_file: options.main_file.clone(),
            engine: options.engine,
            shell_escape: options.shell_escape,
        };

        let result = negotiate_and_upload(
            Negotiator::new(self.service.as_ref(), self.hash_concurrency),
            &request,
            &local,
            on_progress,
        )
        .await;

        match result {
            Ok(delta) => {
                session.bind(&delta.build_id);
                session.mark_running(format!(
                    "Compiling: {} uploaded, {} cached",
                    delta.files_to_upload.len(),
                    delta.cached_files.len()
                ));
                info!("Build {} started", session.build_id);

                self.pending = Some(PendingSync {
                    project_id: request.project.id.clone(),
                    checksums: delta.checksums,
                });
                self.changes = Some(delta.changes);
                self.publish(session.clone());
                BuildStart::Started(session)
            }
            Err(e) => self.fail_to_start(session, e).await,
        }
    }

    /// Apply a pushed status event to the current session
    pub async fn update_status(&mut self, event: &StatusEvent) -> StatusOutcome {
        let Some(session) = self.session.as_mut() else {
            debug!("No build session, ignoring status for {}", event.id);
            return StatusOutcome::Ignored;
        };

        if !session.apply(event) {
            debug!(
                "Ignoring status {} for {} (session {} is {})",
                event.state, event.id, session.build_id, session.state
            );
            return StatusOutcome::Ignored;
        }

        let snapshot = session.clone();
        self.sessions.send_replace(Some(snapshot.clone()));

        if !snapshot.is_terminal() {
            debug!("Build {}: {}", snapshot.build_id, snapshot.message);
            return StatusOutcome::Updated(snapshot);
        }

        info!("Build {} finished: {}", snapshot.build_id, snapshot.state);
        match snapshot.state {
            BuildState::Success => self.refresh_cache(&snapshot).await,
            _ => {
                // Failed builds leave the cache as it was
                self.pending = None;
            }
        }
        self.record_history(&snapshot).await;

        StatusOutcome::Completed(snapshot)
    }

    /// Feed channel events into [`update_status`](Self::update_status)
    /// until the session is terminal or the channel gives up.
    pub async fn run_until_terminal(&mut self, channel: &mut StatusChannel) -> Option<BuildSession> {
        self.run_until_terminal_with(channel, |_| {}).await
    }

    /// Like [`run_until_terminal`](Self::run_until_terminal), showing every
    /// channel event to `observe` first.
    pub async fn run_until_terminal_with<F>(
        &mut self,
        channel: &mut StatusChannel,
        mut observe: F,
    ) -> Option<BuildSession>
    where
        F: FnMut(&ChannelEvent),
    {
        while self.is_in_flight() {
            let Some(event) = channel.recv().await else {
                warn!("Status channel closed before the build finished");
                break;
            };
            observe(&event);

            match event {
                ChannelEvent::Update(status) => {
                    self.update_status(&status).await;
                }
                ChannelEvent::Unavailable => {
                    warn!("Build status unavailable, giving up on live updates");
                    break;
                }
                ChannelEvent::Connected | ChannelEvent::Reconnecting { .. } => {}
            }
        }

        self.session.clone()
    }

    async fn refresh_cache(&mut self, session: &BuildSession) {
        let Some(project_id) = self.project.as_ref().map(|p| p.id.clone()) else {
            return;
        };

        if let Some(pending) = self.pending.take() {
            let count = pending.checksums.len();
            for checksum in pending.checksums {
                let entry = CacheEntry {
                    project_id: pending.project_id.clone(),
                    file_name: checksum.file_name.clone(),
                    file_hash: checksum.content_hash,
                    last_modified_at_client: checksum.modified_at,
                    size_bytes: checksum.size_bytes,
                };
                self.cache
                    .add_cache_entry(&pending.project_id, &checksum.file_name, entry);
            }
            self.cache
                .update_last_synced(&pending.project_id, session.ended_at.unwrap_or_else(Utc::now));
            debug!("Recorded {} fingerprints for {}", count, pending.project_id);
        }

        self.cache.increment_build_count(&project_id);
        self.cache.record_build_id(&project_id, &session.build_id);

        if let Err(e) = self.cache.flush(&project_id).await {
            warn!("Failed to persist sync cache: {}", e);
        }

        self.last_success
            .send_replace(Some(session.build_id.clone()));
    }

    async fn fail_to_start(&mut self, session: BuildSession, err: TexsyncError) -> BuildStart {
        error!("Build failed to start: {}", err);

        let session = session.failed_to_start();
        self.pending = None;
        self.publish(session.clone());
        self.record_history(&session).await;
        BuildStart::Failed(session)
    }

    async fn record_history(&self, session: &BuildSession) {
        if let (Some(history), Some(project)) = (&self.history, &self.project) {
            history.record(&project.id, session).await;
        }
    }

    fn publish(&mut self, session: BuildSession) {
        self.session = Some(session.clone());
        self.sessions.send_replace(Some(session));
    }
}

fn no_project() -> TexsyncError {
    TexsyncError::User("No project is open".to_string())
}

async fn negotiate_and_upload<F>(
    negotiator: Negotiator<'_>,
    request: &SyncRequest,
    local: &std::collections::BTreeMap<String, String>,
    on_progress: F,
) -> TexsyncResult<DeltaManifest>
where
    F: FnMut(usize, usize),
{
    let delta = negotiator.negotiate(request, local, on_progress).await?;
    negotiator.upload(request, &delta).await?;
    Ok(delta)
}
