//! Output module for console output and progress.
//!
//! Provides:
//! - Colored console output
//! - Progress bars driven by session updates
//! - Stream listings and session summaries

pub mod console;
pub mod progress;
pub mod stats;

pub use console::{
    print_banner, print_config_summary, print_controls, print_error, print_info, print_success,
    print_warning,
};
pub use progress::{create_download_bar, create_spinner, ProgressBarObserver};
pub use stats::{print_session_summary, print_stream_list};
