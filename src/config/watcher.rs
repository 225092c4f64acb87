//! Hot reload of the menu document.
//!
//! Watches the directory holding the document (editors often replace files
//! instead of writing in place) and re-runs decode + validate whenever the
//! document itself changes. Each reload outcome goes to the caller's callback;
//! a broken document never replaces anything on its own.

use notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebouncedEvent, Debouncer, RecommendedCache};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::loader::{load_config, ConfigError};
use super::model::MenuConfiguration;

/// Debounce window for bursts of writes to the same file
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(500);

/// Callback receiving each reload outcome
pub type ReloadCallback = Box<dyn Fn(Result<MenuConfiguration, ConfigError>) + Send + 'static>;

/// Watches one menu document; dropping it stops watching
pub struct ConfigWatcher {
    #[allow(dead_code)]
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    path: PathBuf,
}

impl ConfigWatcher {
    /// Start watching `path`, calling `on_reload` after every change
    pub fn start(path: &Path, on_reload: ReloadCallback) -> Result<Self, ConfigError> {
        let path = path.to_path_buf();
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        let target = path.clone();

        let mut debouncer = new_debouncer(
            RELOAD_DEBOUNCE,
            None,
            move |result: Result<Vec<DebouncedEvent>, Vec<notify::Error>>| match result {
                Ok(events) => {
                    if events.iter().any(|event| touches(event, &target)) {
                        reload(&target, &on_reload);
                    }
                }
                Err(errors) => {
                    for error in errors {
                        tracing::warn!(error = %error, "Menu watcher error");
                    }
                }
            },
        )?;

        debouncer.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::debug!(path = %path.display(), "Watching menu configuration");

        Ok(Self { debouncer, path })
    }

    /// The document being watched
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn touches(event: &DebouncedEvent, target: &Path) -> bool {
    let relevant = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    relevant
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == target.file_name())
}

fn reload(path: &Path, on_reload: &ReloadCallback) {
    let result = load_config(path);
    match &result {
        Ok(config) => tracing::debug!(
            path = %path.display(),
            nodes = config.node_count(),
            "Reloaded menu configuration"
        ),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Menu reload failed"),
    }
    on_reload(result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::mpsc;
    use tempfile::tempdir;

    #[test]
    fn test_reload_on_change() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("menu.yaml");
        fs::write(&path, "version: \"1\"\nmenu: []\n").unwrap();

        let (tx, rx) = mpsc::channel();
        let watcher = ConfigWatcher::start(
            &path,
            Box::new(move |result| {
                let _ = tx.send(result.map(|c| c.menu.len()).map_err(|e| e.to_string()));
            }),
        )
        .unwrap();
        assert_eq!(watcher.path(), path.as_path());

        fs::write(
            &path,
            "version: \"1\"\nmenu:\n  - label: Hi\n    type: terminal\n    command: echo hi\n",
        )
        .unwrap();

        let mut last = None;
        while let Ok(outcome) = rx.recv_timeout(Duration::from_secs(10)) {
            let done = outcome == Ok(1);
            last = Some(outcome);
            if done {
                break;
            }
        }
        assert_eq!(last, Some(Ok(1)));
    }

    #[test]
    fn test_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope").join("menu.yaml");
        let result = ConfigWatcher::start(&path, Box::new(|_| {}));
        assert!(matches!(result, Err(ConfigError::Watch(_))));
    }
}
