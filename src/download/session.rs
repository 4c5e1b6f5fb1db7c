//! One download session: state machine, run ownership and progress reporting.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncSeekExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::{Config, ResumePolicy, DEFAULT_CHUNK_SIZE};
use crate::download::copy::{copy_chunks, CopyOutcome};
use crate::download::observer::ProgressObserver;
use crate::download::state::{
    status_text, Progress, ProgressUpdate, SessionSnapshot, SessionState,
};
use crate::error::{Error, Result};
use crate::provider::StreamDescriptor;

/// Per-session tuning taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub chunk_size: usize,
    pub resume_policy: ResumePolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            resume_policy: ResumePolicy::default(),
        }
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            chunk_size: config.download.chunk_size,
            resume_policy: config.download.resume_policy,
        }
    }
}

/// Why the current run's token was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopCause {
    Pause,
    Cancel,
}

/// The copy task owned by a session, at most one at a time.
struct ActiveRun {
    token: CancellationToken,
    cause: Arc<Mutex<Option<StopCause>>>,
    task: JoinHandle<()>,
}

impl ActiveRun {
    /// Signal the run and wait until its task has exited.
    async fn stop(self, cause: StopCause) -> std::result::Result<(), tokio::task::JoinError> {
        *self.cause.lock() = Some(cause);
        self.token.cancel();
        self.task.await
    }
}

#[derive(Default)]
struct RunSlot {
    active: Option<ActiveRun>,
}

struct Status {
    state: SessionState,
    bytes_written: u64,
    progress: Progress,
    status_text: String,
    last_error: Option<String>,
}

struct Inner {
    id: Uuid,
    title: String,
    destination: PathBuf,
    stream: StreamDescriptor,
    options: SessionOptions,
    created_at: DateTime<Utc>,
    status: Mutex<Status>,
    observers: Mutex<Vec<Arc<dyn ProgressObserver>>>,
    state_tx: watch::Sender<SessionState>,
    // Serializes commands and owns the run handle.
    run: tokio::sync::Mutex<RunSlot>,
}

/// Handle to a single transfer. Clones share the same session.
#[derive(Clone)]
pub struct DownloadSession {
    inner: Arc<Inner>,
}

impl DownloadSession {
    /// Create a queued session for `stream`, writing to `destination`.
    pub fn new(
        title: impl Into<String>,
        stream: StreamDescriptor,
        destination: impl Into<PathBuf>,
        options: SessionOptions,
    ) -> Self {
        let total = stream.total_bytes;
        let progress = Progress::compute(0, total);
        let (state_tx, _) = watch::channel(SessionState::Queued);

        Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                title: title.into(),
                destination: destination.into(),
                stream,
                options,
                created_at: Utc::now(),
                status: Mutex::new(Status {
                    state: SessionState::Queued,
                    bytes_written: 0,
                    progress,
                    status_text: status_text(SessionState::Queued, progress, 0, None),
                    last_error: None,
                }),
                observers: Mutex::new(Vec::new()),
                state_tx,
                run: tokio::sync::Mutex::new(RunSlot::default()),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Identity used by the registry.
    pub fn title(&self) -> &str {
        &self.inner.title
    }

    pub fn destination(&self) -> &Path {
        &self.inner.destination
    }

    pub fn stream(&self) -> &StreamDescriptor {
        &self.inner.stream
    }

    pub fn state(&self) -> SessionState {
        self.inner.status.lock().state
    }

    pub fn progress(&self) -> Progress {
        self.inner.status.lock().progress
    }

    /// Bytes received, never above the declared total when one is known.
    pub fn bytes_received(&self) -> u64 {
        let written = self.inner.status.lock().bytes_written;
        self.clamp_to_total(written)
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.status.lock().last_error.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let status = self.inner.status.lock();
        SessionSnapshot {
            id: self.inner.id,
            title: self.inner.title.clone(),
            destination: self.inner.destination.clone(),
            quality_label: self.inner.stream.quality_label.clone(),
            state: status.state,
            status_text: status.status_text.clone(),
            progress: status.progress,
            bytes_received: self.clamp_to_total(status.bytes_written),
            total_bytes: self.inner.stream.total_bytes,
            last_error: status.last_error.clone(),
            created_at: self.inner.created_at,
        }
    }

    /// Register an observer for progress and state notifications.
    pub fn subscribe<O>(&self, observer: O)
    where
        O: ProgressObserver + 'static,
    {
        self.inner.observers.lock().push(Arc::new(observer));
    }

    #[cfg(test)]
    pub(crate) fn observer_count(&self) -> usize {
        self.inner.observers.lock().len()
    }

    /// Wait until no run is in flight and return the settled state.
    pub async fn wait(&self) -> SessionState {
        self.wait_until(|state| *state != SessionState::Downloading)
            .await
    }

    /// Wait until the session reaches a terminal state.
    pub async fn wait_terminal(&self) -> SessionState {
        self.wait_until(SessionState::is_terminal).await
    }

    async fn wait_until(&self, done: impl FnMut(&SessionState) -> bool) -> SessionState {
        let mut rx = self.inner.state_tx.subscribe();
        let settled = match rx.wait_for(done).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        };
        settled
    }

    /// Open the source and destination and launch the copy loop.
    ///
    /// Valid from `Queued` or `Paused`.
    pub async fn start(&self) -> Result<()> {
        let mut slot = self.inner.run.lock().await;
        self.start_locked(&mut slot, "start").await
    }

    /// Stop the current run and settle into `Paused`.
    ///
    /// A no-op when already paused or terminal.
    pub async fn pause(&self) -> Result<()> {
        let mut slot = self.inner.run.lock().await;
        self.pause_locked(&mut slot).await
    }

    /// Start a fresh run of a paused session. A no-op once terminal.
    pub async fn resume(&self) -> Result<()> {
        let mut slot = self.inner.run.lock().await;
        match self.state() {
            SessionState::Paused => self.start_locked(&mut slot, "resume").await,
            state if state.is_terminal() => {
                tracing::debug!(title = %self.inner.title, "Ignoring resume of {} session", state);
                Ok(())
            }
            state => Err(Error::InvalidTransition {
                action: "resume",
                state,
            }),
        }
    }

    /// Pause when downloading, resume when paused.
    pub async fn toggle_pause(&self) -> Result<()> {
        let mut slot = self.inner.run.lock().await;
        match self.state() {
            SessionState::Downloading => self.pause_locked(&mut slot).await,
            SessionState::Paused => self.start_locked(&mut slot, "resume").await,
            state if state.is_terminal() => Ok(()),
            state => Err(Error::InvalidTransition {
                action: "toggle",
                state,
            }),
        }
    }

    /// Stop the transfer for good. Progress is reset to 0 and the partial
    /// file is left on disk.
    pub async fn cancel(&self) -> Result<()> {
        let mut slot = self.inner.run.lock().await;
        match self.state() {
            SessionState::Downloading => {
                if let Some(run) = slot.active.take() {
                    if let Err(e) = run.stop(StopCause::Cancel).await {
                        self.fail(format!("copy task aborted: {}", e));
                    }
                }
                Ok(())
            }
            SessionState::Queued | SessionState::Paused => {
                self.retire(&mut slot).await;
                self.set_state(SessionState::Canceled);
                Ok(())
            }
            SessionState::Canceled => Ok(()),
            state => Err(Error::InvalidTransition {
                action: "cancel",
                state,
            }),
        }
    }

    async fn start_locked(&self, slot: &mut RunSlot, action: &'static str) -> Result<()> {
        let state = self.state();
        if !matches!(state, SessionState::Queued | SessionState::Paused) {
            return Err(Error::InvalidTransition { action, state });
        }

        self.retire(slot).await;

        let resume_from = match (state, self.inner.options.resume_policy) {
            (SessionState::Paused, ResumePolicy::Continue) => {
                self.inner.status.lock().bytes_written
            }
            _ => 0,
        };

        let opened = match self.inner.stream.source.open(resume_from).await {
            Ok(opened) => opened,
            Err(e) => {
                let message = match e {
                    Error::SourceUnavailable(message) => message,
                    other => other.to_string(),
                };
                self.fail(message.clone());
                return Err(Error::SourceUnavailable(message));
            }
        };

        let offset = opened.offset;
        if offset != 0 && offset != resume_from {
            let message = format!(
                "source resumed at byte {} instead of {}",
                offset, resume_from
            );
            self.fail(message.clone());
            return Err(Error::SourceUnavailable(message));
        }

        let file = match open_destination(&self.inner.destination, offset).await {
            Ok(file) => file,
            Err(e) => {
                let message = e.to_string();
                self.fail(format!(
                    "cannot write {}: {}",
                    self.inner.destination.display(),
                    message
                ));
                return Err(Error::DestinationUnwritable {
                    path: self.inner.destination.clone(),
                    message,
                });
            }
        };

        if resume_from > 0 && offset == 0 {
            tracing::info!(
                title = %self.inner.title,
                "Source cannot seek; restarting from byte 0"
            );
        }

        let token = CancellationToken::new();
        let cause = Arc::new(Mutex::new(None));

        self.update(|status| {
            status.state = SessionState::Downloading;
            status.bytes_written = offset;
            status.last_error = None;
        });
        tracing::info!(
            title = %self.inner.title,
            session_id = %self.inner.id,
            offset,
            "Download running ({})",
            action
        );

        let session = self.clone();
        let run_token = token.clone();
        let run_cause = cause.clone();
        let mut reader = opened.reader;
        let task = tokio::spawn(async move {
            let mut file = file;
            let chunk_size = session.inner.options.chunk_size;
            let outcome = copy_chunks(&mut reader, &mut file, chunk_size, &run_token, |n| {
                session.record_chunk(n)
            })
            .await;
            let cause = *run_cause.lock();
            session.settle(outcome, cause);
        });

        slot.active = Some(ActiveRun { token, cause, task });
        Ok(())
    }

    async fn pause_locked(&self, slot: &mut RunSlot) -> Result<()> {
        match self.state() {
            SessionState::Downloading => {
                if let Some(run) = slot.active.take() {
                    if let Err(e) = run.stop(StopCause::Pause).await {
                        self.fail(format!("copy task aborted: {}", e));
                    }
                }
                Ok(())
            }
            SessionState::Queued => Err(Error::InvalidTransition {
                action: "pause",
                state: SessionState::Queued,
            }),
            state => {
                tracing::debug!(title = %self.inner.title, "Ignoring pause of {} session", state);
                Ok(())
            }
        }
    }

    /// Join a run left behind in the slot (one that finished on its own).
    async fn retire(&self, slot: &mut RunSlot) {
        if let Some(run) = slot.active.take() {
            run.token.cancel();
            if let Err(e) = run.task.await {
                tracing::warn!(title = %self.inner.title, "Previous run ended abnormally: {}", e);
            }
        }
    }

    fn record_chunk(&self, n: usize) {
        self.update(|status| status.bytes_written += n as u64);
        tracing::debug!(
            title = %self.inner.title,
            bytes = self.inner.status.lock().bytes_written,
            "Chunk written"
        );
    }

    fn settle(&self, outcome: CopyOutcome, cause: Option<StopCause>) {
        match outcome {
            CopyOutcome::Completed => self.set_state(SessionState::Completed),
            CopyOutcome::Interrupted => match cause {
                Some(StopCause::Cancel) => self.set_state(SessionState::Canceled),
                Some(StopCause::Pause) | None => self.set_state(SessionState::Paused),
            },
            CopyOutcome::Failed(message) => self.fail(Error::Transfer(message).to_string()),
        }
    }

    fn set_state(&self, state: SessionState) {
        self.update(|status| status.state = state);
        tracing::info!(
            title = %self.inner.title,
            session_id = %self.inner.id,
            "Session {}",
            state
        );
    }

    fn fail(&self, message: String) {
        tracing::error!(
            title = %self.inner.title,
            session_id = %self.inner.id,
            "Download failed: {}",
            message
        );
        self.update(|status| {
            status.state = SessionState::Errored;
            status.last_error = Some(message);
        });
    }

    /// Apply `mutate`, recompute progress and status text, then notify.
    fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut Status),
    {
        let update = {
            let mut status = self.inner.status.lock();
            mutate(&mut status);

            let received = self.clamp_to_total(status.bytes_written);
            let total = self.inner.stream.total_bytes;
            status.progress = match status.state {
                SessionState::Completed => Progress::Percent(100),
                SessionState::Canceled => Progress::Percent(0),
                _ => Progress::compute(received, total),
            };
            status.status_text = status_text(
                status.state,
                status.progress,
                received,
                status.last_error.as_deref(),
            );
            self.inner.state_tx.send_replace(status.state);

            ProgressUpdate {
                state: status.state,
                status_text: status.status_text.clone(),
                progress: status.progress,
                bytes_received: received,
                total_bytes: total,
                is_terminal: status.state.is_terminal(),
            }
        };

        let observers = self.inner.observers.lock().clone();
        for observer in observers {
            observer.on_update(&update);
        }
    }

    fn clamp_to_total(&self, written: u64) -> u64 {
        match self.inner.stream.total_bytes {
            0 => written,
            total => written.min(total),
        }
    }
}

/// Open the output file, truncating it unless continuing at `offset`.
async fn open_destination(path: &Path, offset: u64) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    if offset == 0 {
        return File::create(path).await;
    }

    let mut file = OpenOptions::new().write(true).create(true).open(path).await?;
    file.set_len(offset).await?;
    file.seek(SeekFrom::Start(offset)).await?;
    Ok(file)
}
