//! Download module: the session engine.
//!
//! This module provides:
//! - Session state and progress computation
//! - The chunked copy loop
//! - Download sessions with pause, resume and cancel
//! - The session registry
//! - The observer interface for presentation layers

mod copy;
pub mod observer;
pub mod registry;
pub mod session;
pub mod state;

pub use observer::ProgressObserver;
pub use registry::SessionRegistry;
pub use session::{DownloadSession, SessionOptions};
pub use state::{Progress, ProgressUpdate, SessionSnapshot, SessionState};
