//! Named terminal registry.
//!
//! Terminals are keyed by name and shared by every caller holding the same
//! registry: acquiring a name either creates the session or returns the one
//! already open. Each session sits behind an async mutex, so submissions to
//! one name from independent call sites never interleave.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Commands kept per terminal; older ones are dropped
pub const HISTORY_LIMIT: usize = 100;

/// A long-lived terminal identified by name
#[derive(Debug)]
pub struct TerminalSession {
    pub id: Uuid,
    pub name: String,
    /// Directory the terminal was opened in
    pub working_directory: Option<PathBuf>,
    /// Last `HISTORY_LIMIT` commands submitted to this terminal, oldest first
    pub history: VecDeque<String>,
}

impl TerminalSession {
    fn new(name: &str, working_directory: Option<&Path>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            working_directory: working_directory.map(Path::to_path_buf),
            history: VecDeque::new(),
        }
    }

    pub fn record(&mut self, command: &str) {
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(command.to_string());
    }
}

/// Shared handle to a session
pub type SessionHandle = Arc<Mutex<TerminalSession>>;

/// Registry of open terminals; clones share the same sessions
#[derive(Debug, Clone, Default)]
pub struct TerminalRegistry {
    sessions: Arc<DashMap<String, SessionHandle>>,
}

impl TerminalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `name`, creating it if absent
    pub fn acquire(&self, name: &str, working_directory: Option<&Path>) -> SessionHandle {
        self.sessions
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(terminal = name, "Opening terminal");
                Arc::new(Mutex::new(TerminalSession::new(name, working_directory)))
            })
            .value()
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<SessionHandle> {
        self.sessions.get(name).map(|entry| entry.value().clone())
    }

    /// Forget a terminal; returns whether it was open
    pub fn dispose(&self, name: &str) -> bool {
        self.sessions.remove(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_acquire_reuses_by_name() {
        let registry = TerminalRegistry::new();
        let first = registry.acquire("Build", Some(Path::new("/work")));
        let second = registry.acquire("Build", None);
        let other = registry.acquire("Test", None);

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(registry.names(), vec!["Build", "Test"]);
    }

    #[tokio::test]
    async fn test_first_acquire_sets_directory() {
        let registry = TerminalRegistry::new();
        registry.acquire("Build", Some(Path::new("/work")));
        let session = registry.acquire("Build", Some(Path::new("/elsewhere")));

        let session = session.lock().await;
        assert_eq!(session.working_directory.as_deref(), Some(Path::new("/work")));
    }

    #[test]
    fn test_clones_share_sessions() {
        let registry = TerminalRegistry::new();
        let clone = registry.clone();
        clone.acquire("Shared", None);

        assert!(registry.get("Shared").is_some());
        assert!(registry.dispose("Shared"));
        assert!(!clone.dispose("Shared"));
        assert!(clone.is_empty());
    }

    #[test]
    fn test_history_keeps_latest_commands() {
        let mut session = TerminalSession::new("Long", None);
        for i in 0..HISTORY_LIMIT + 5 {
            session.record(&format!("cmd {}", i));
        }

        assert_eq!(session.history.len(), HISTORY_LIMIT);
        assert_eq!(session.history.front().map(String::as_str), Some("cmd 5"));
        let last = format!("cmd {}", HISTORY_LIMIT + 4);
        assert_eq!(session.history.back(), Some(&last));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_submissions_to_one_name_are_serialized() {
        let registry = TerminalRegistry::new();
        let active = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..8 {
            let registry = registry.clone();
            let active = Arc::clone(&active);
            handles.push(tokio::spawn(async move {
                let session = registry.acquire("Serial", None);
                let mut session = session.lock().await;
                assert_eq!(active.fetch_add(1, Ordering::SeqCst), 0);
                tokio::time::sleep(Duration::from_millis(5)).await;
                session.record(&format!("cmd {}", i));
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(registry.len(), 1);
        let session = registry.get("Serial").unwrap();
        assert_eq!(session.lock().await.history.len(), 8);
    }
}
