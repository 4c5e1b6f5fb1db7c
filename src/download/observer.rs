//! Observer interface for presentation layers.

use crate::download::state::ProgressUpdate;

/// Receives a [`ProgressUpdate`] after every chunk and on every state transition.
///
/// Called from the session's copy task; implementations must not block.
pub trait ProgressObserver: Send + Sync {
    fn on_update(&self, update: &ProgressUpdate);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressUpdate) + Send + Sync,
{
    fn on_update(&self, update: &ProgressUpdate) {
        self(update)
    }
}
