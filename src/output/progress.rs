//! Progress bar utilities.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::download::{ProgressObserver, ProgressUpdate, SessionState};
use crate::fs::display_title;

const BAR_TEMPLATE: &str =
    "{spinner:.green} {prefix} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {prefix} {bytes} {msg}";

/// Create a spinner for long-running operations.
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Create a progress bar for a download.
///
/// An unknown total (0) gets a byte-counting spinner instead of a bar.
pub fn create_download_bar(total: u64) -> ProgressBar {
    if total == 0 {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template(SPINNER_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        return bar;
    }

    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template(BAR_TEMPLATE)
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

/// Drives an indicatif bar from session updates.
pub struct ProgressBarObserver {
    bar: ProgressBar,
}

impl ProgressBarObserver {
    pub fn new(title: &str, total: u64) -> Self {
        let bar = create_download_bar(total);
        bar.set_prefix(display_title(title));
        Self { bar }
    }

    /// Handle to the underlying bar, for printing around it.
    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }
}

impl ProgressObserver for ProgressBarObserver {
    fn on_update(&self, update: &ProgressUpdate) {
        self.bar.set_position(update.bytes_received);

        match update.state {
            SessionState::Downloading => self.bar.set_message(String::new()),
            SessionState::Completed => self.bar.finish_with_message(update.status_text.clone()),
            SessionState::Canceled | SessionState::Errored => {
                self.bar.abandon_with_message(update.status_text.clone())
            }
            SessionState::Queued | SessionState::Paused => {
                self.bar.set_message(update.status_text.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::Progress;

    fn update(state: SessionState, received: u64, total: u64) -> ProgressUpdate {
        ProgressUpdate {
            state,
            status_text: state.to_string(),
            progress: Progress::compute(received, total),
            bytes_received: received,
            total_bytes: total,
            is_terminal: state.is_terminal(),
        }
    }

    #[test]
    fn test_download_bar_length() {
        assert_eq!(create_download_bar(1000).length(), Some(1000));
        assert_eq!(create_download_bar(0).length(), None);
    }

    #[test]
    fn test_observer_tracks_position() {
        let observer = ProgressBarObserver::new("clip", 1000);
        observer.on_update(&update(SessionState::Downloading, 400, 1000));
        assert_eq!(observer.bar().position(), 400);
        assert!(!observer.bar().is_finished());

        observer.on_update(&update(SessionState::Paused, 400, 1000));
        assert_eq!(observer.bar().message(), "paused");

        observer.on_update(&update(SessionState::Completed, 1000, 1000));
        assert!(observer.bar().is_finished());
    }

    #[test]
    fn test_observer_abandons_on_cancel() {
        let observer = ProgressBarObserver::new("clip", 0);
        observer.on_update(&update(SessionState::Downloading, 2048, 0));
        observer.on_update(&update(SessionState::Canceled, 0, 0));
        assert!(observer.bar().is_finished());
        assert_eq!(observer.bar().position(), 0);
    }
}
