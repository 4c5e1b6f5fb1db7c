//! Registry of active download sessions keyed by title.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::config::Config;
use crate::download::session::DownloadSession;
use crate::download::state::{ProgressUpdate, SessionSnapshot, SessionState};
use crate::error::{Error, Result};

struct RegistryInner {
    sessions: RwLock<HashMap<String, DownloadSession>>,
    // Sessions that already carry this registry's cancel observer.
    watched: Mutex<HashSet<Uuid>>,
    cancel_grace: Duration,
}

impl RegistryInner {
    /// Remove `title` only if it still maps to session `id`.
    fn remove_if_same(&self, title: &str, id: Uuid) -> bool {
        let mut sessions = self.sessions.write();
        match sessions.get(title) {
            Some(session) if session.id() == id => {
                sessions.remove(title);
                true
            }
            _ => false,
        }
    }
}

/// Set of sessions shown to the user. Titles are unique until removed.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

impl SessionRegistry {
    /// Create a registry that drops canceled sessions after `cancel_grace`.
    pub fn new(cancel_grace: Duration) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                sessions: RwLock::new(HashMap::new()),
                watched: Mutex::new(HashSet::new()),
                cancel_grace,
            }),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cancel_grace())
    }

    /// Add a session under its title.
    ///
    /// Fails with `DuplicateSession` while another session holds the title.
    pub fn register(&self, session: DownloadSession) -> Result<()> {
        let title = session.title().to_string();
        {
            let mut sessions = self.inner.sessions.write();
            if sessions.contains_key(&title) {
                return Err(Error::DuplicateSession(title));
            }
            sessions.insert(title.clone(), session.clone());
        }

        self.remove_when_canceled(&session);
        tracing::info!(title = %title, session_id = %session.id(), "Session registered");
        Ok(())
    }

    /// Remove a session whatever its state. Absent titles are ignored.
    ///
    /// A running transfer keeps going; cancel it first to stop it.
    pub fn remove(&self, title: &str) -> Option<DownloadSession> {
        let removed = self.inner.sessions.write().remove(title);
        if removed.is_some() {
            tracing::debug!(title = %title, "Session removed");
        }
        removed
    }

    pub fn find(&self, title: &str) -> Option<DownloadSession> {
        self.inner.sessions.read().get(title).cloned()
    }

    pub fn enumerate(&self) -> Vec<DownloadSession> {
        self.inner.sessions.read().values().cloned().collect()
    }

    /// Snapshots of all sessions, sorted by title.
    pub fn snapshots(&self) -> Vec<SessionSnapshot> {
        let mut snapshots: Vec<_> = self
            .inner
            .sessions
            .read()
            .values()
            .map(DownloadSession::snapshot)
            .collect();
        snapshots.sort_by(|a, b| a.title.cmp(&b.title));
        snapshots
    }

    /// Drop every completed session. Returns how many were removed.
    pub fn clear_completed(&self) -> usize {
        self.clear_state(SessionState::Completed)
    }

    /// Drop every errored session. Returns how many were removed.
    pub fn clear_failed(&self) -> usize {
        self.clear_state(SessionState::Errored)
    }

    pub fn len(&self) -> usize {
        self.inner.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear_state(&self, state: SessionState) -> usize {
        let mut sessions = self.inner.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| session.state() != state);
        before - sessions.len()
    }

    /// Schedule removal of `session` once it reports `Canceled`.
    ///
    /// The observer is attached once per session; a session registered while
    /// already canceled is scheduled right away.
    fn remove_when_canceled(&self, session: &DownloadSession) {
        let title = session.title().to_string();
        let id = session.id();

        if session.state() == SessionState::Canceled {
            self.evict_after_grace(title.clone(), id);
        }

        if !self.inner.watched.lock().insert(id) {
            return;
        }

        let registry = self.clone_weak();
        let grace = self.inner.cancel_grace;
        let scheduled = AtomicBool::new(false);

        session.subscribe(move |update: &ProgressUpdate| {
            if update.state != SessionState::Canceled || scheduled.swap(true, Ordering::SeqCst) {
                return;
            }
            schedule_eviction(registry.clone(), title.clone(), id, grace);
        });
    }

    fn evict_after_grace(&self, title: String, id: Uuid) {
        schedule_eviction(self.clone_weak(), title, id, self.inner.cancel_grace);
    }

    fn clone_weak(&self) -> Weak<RegistryInner> {
        Arc::downgrade(&self.inner)
    }
}

/// Remove `title` from the registry after `grace`, if it still maps to `id`.
fn schedule_eviction(registry: Weak<RegistryInner>, title: String, id: Uuid, grace: Duration) {
    let evict = move || {
        if let Some(inner) = registry.upgrade() {
            if inner.remove_if_same(&title, id) {
                tracing::debug!(title = %title, "Canceled session removed");
            }
        }
    };

    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                tokio::time::sleep(grace).await;
                evict();
            });
        }
        Err(_) => evict(),
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use tokio_test::assert_ok;

    use crate::download::SessionOptions;
    use crate::test_support::{descriptor, options, payload, ScriptedSource};

    fn session(title: &str, dir: &Path) -> DownloadSession {
        let source = Arc::new(ScriptedSource::new(payload(4096)).chunked(1024));
        DownloadSession::new(
            title,
            descriptor(&source, 4096),
            dir.join(format!("{}.mp4", title)),
            options(1024),
        )
    }

    #[test]
    fn test_duplicate_title_rejected_until_removed() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SessionRegistry::new(Duration::from_millis(10));

        assert_ok!(registry.register(session("Clip", dir.path())));
        assert!(matches!(
            registry.register(session("Clip", dir.path())),
            Err(Error::DuplicateSession(title)) if title == "Clip"
        ));

        assert!(registry.remove("Clip").is_some());
        assert_ok!(registry.register(session("Clip", dir.path())));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let registry = SessionRegistry::default();
        assert!(registry.remove("missing").is_none());
        assert!(registry.remove("missing").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_find_and_enumerate() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SessionRegistry::default();
        let first = session("Beta", dir.path());
        let first_id = first.id();
        assert_ok!(registry.register(first));
        assert_ok!(registry.register(session("Alpha", dir.path())));

        assert_eq!(registry.find("Beta").map(|s| s.id()), Some(first_id));
        assert!(registry.find("Gamma").is_none());
        assert_eq!(registry.enumerate().len(), 2);

        let titles: Vec<_> = registry.snapshots().into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["Alpha", "Beta"]);

        // Lookups leave session state alone.
        assert!(registry
            .snapshots()
            .iter()
            .all(|s| s.state == SessionState::Queued));
    }

    #[tokio::test]
    async fn test_clear_completed_and_failed() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SessionRegistry::default();

        let done = session("Done", dir.path());
        let broken = DownloadSession::new(
            "Broken",
            descriptor(&Arc::new(ScriptedSource::new(payload(10)).unavailable()), 10),
            dir.path().join("Broken.mp4"),
            SessionOptions::default(),
        );
        let waiting = session("Waiting", dir.path());

        assert_ok!(registry.register(done.clone()));
        assert_ok!(registry.register(broken.clone()));
        assert_ok!(registry.register(waiting));

        assert_ok!(done.start().await);
        assert_eq!(done.wait().await, SessionState::Completed);
        assert!(broken.start().await.is_err());

        assert_eq!(registry.clear_completed(), 1);
        assert!(registry.find("Done").is_none());
        assert_eq!(registry.clear_failed(), 1);
        assert!(registry.find("Broken").is_none());
        assert_eq!(registry.clear_failed(), 0);
        assert!(registry.find("Waiting").is_some());
    }

    #[tokio::test]
    async fn test_canceled_session_removed_after_grace() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SessionRegistry::new(Duration::from_millis(30));
        let clip = session("Clip", dir.path());
        assert_ok!(registry.register(clip.clone()));

        assert_ok!(clip.cancel().await);
        assert_eq!(
            registry.find("Clip").map(|s| s.state()),
            Some(SessionState::Canceled)
        );

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(registry.find("Clip").is_none());
    }

    #[tokio::test]
    async fn test_grace_removal_spares_newer_session_with_same_title() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SessionRegistry::new(Duration::from_millis(30));
        let old = session("Clip", dir.path());
        assert_ok!(registry.register(old.clone()));

        assert_ok!(old.cancel().await);
        registry.remove("Clip");

        let newer = session("Clip", dir.path());
        let newer_id = newer.id();
        assert_ok!(registry.register(newer));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(registry.find("Clip").map(|s| s.id()), Some(newer_id));
    }

    #[tokio::test]
    async fn test_reregistering_attaches_one_observer() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SessionRegistry::new(Duration::from_millis(30));
        let clip = session("Clip", dir.path());

        for _ in 0..3 {
            assert_ok!(registry.register(clip.clone()));
            registry.remove("Clip");
        }
        assert_eq!(clip.observer_count(), 1);

        assert_ok!(registry.register(clip.clone()));
        assert_ok!(clip.cancel().await);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(registry.find("Clip").is_none());
    }

    #[tokio::test]
    async fn test_already_canceled_session_removed_after_grace() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SessionRegistry::new(Duration::from_millis(30));
        let clip = session("Clip", dir.path());
        assert_ok!(clip.cancel().await);

        assert_ok!(registry.register(clip));
        assert!(registry.find("Clip").is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(registry.find("Clip").is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_register_admits_one() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SessionRegistry::default();

        let attempts: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                let candidate = session("Clip", dir.path());
                tokio::spawn(async move { registry.register(candidate).is_ok() })
            })
            .collect();

        let mut admitted = 0;
        for attempt in attempts {
            if attempt.await.unwrap() {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 1);
        assert_eq!(registry.len(), 1);
    }
}
