//! Session state, progress and the values reported to observers.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use indicatif::HumanBytes;
use uuid::Uuid;

/// Lifecycle state of a download session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Queued,
    Downloading,
    Paused,
    Completed,
    Canceled,
    Errored,
}

impl SessionState {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Canceled | SessionState::Errored
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Queued => write!(f, "queued"),
            SessionState::Downloading => write!(f, "downloading"),
            SessionState::Paused => write!(f, "paused"),
            SessionState::Completed => write!(f, "completed"),
            SessionState::Canceled => write!(f, "canceled"),
            SessionState::Errored => write!(f, "errored"),
        }
    }
}

/// Progress of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Whole percent in `0..=100`.
    Percent(u8),
    /// The total size is unknown.
    Indeterminate,
}

impl Progress {
    /// `min(100, floor(received * 100 / total))`, or indeterminate when `total == 0`.
    pub fn compute(received: u64, total: u64) -> Self {
        if total == 0 {
            return Progress::Indeterminate;
        }

        let percent = (received as u128 * 100 / total as u128).min(100);
        Progress::Percent(percent as u8)
    }

    pub fn percent(&self) -> Option<u8> {
        match self {
            Progress::Percent(p) => Some(*p),
            Progress::Indeterminate => None,
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::Percent(p) => write!(f, "{}%", p),
            Progress::Indeterminate => write!(f, "--"),
        }
    }
}

/// Human-readable status line for a state.
pub(crate) fn status_text(
    state: SessionState,
    progress: Progress,
    bytes_received: u64,
    last_error: Option<&str>,
) -> String {
    match state {
        SessionState::Queued => "Queued...".to_string(),
        SessionState::Downloading => match progress {
            Progress::Percent(p) => format!("Downloading... {}%", p),
            Progress::Indeterminate => {
                format!("Downloading... {} received", HumanBytes(bytes_received))
            }
        },
        SessionState::Paused => "Paused".to_string(),
        SessionState::Completed => "Completed!".to_string(),
        SessionState::Canceled => "Canceled".to_string(),
        SessionState::Errored => format!("Error: {}", last_error.unwrap_or("unknown error")),
    }
}

/// Notification delivered to observers after every chunk and state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub state: SessionState,
    pub status_text: String,
    pub progress: Progress,
    pub bytes_received: u64,
    pub total_bytes: u64,
    pub is_terminal: bool,
}

/// Read-only copy of a session's observable fields.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub title: String,
    pub destination: PathBuf,
    pub quality_label: String,
    pub state: SessionState,
    pub status_text: String,
    pub progress: Progress,
    pub bytes_received: u64,
    pub total_bytes: u64,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}
