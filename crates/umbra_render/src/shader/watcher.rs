//! File-change notifications for shader hotload.
//!
//! The watcher thread owned by `notify` only forwards paths; reloading happens
//! on the thread that owns the [`ShaderManager`](super::ShaderManager) when it
//! calls [`ShaderManager::pump_file_changes`](super::ShaderManager::pump_file_changes).

use std::path::Path;
use std::time::Duration;

use flume::{Receiver, RecvTimeoutError};
use log::{info, warn};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use umbra_core::errors::{Result, ShaderError};
use umbra_core::vfs::{DiskVfs, VfsPath};

/// Watches a [`DiskVfs`] root and queues changed files as VFS paths.
///
/// Dropping the watcher stops watching.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<VfsPath>,
}

impl FileWatcher {
    /// Starts watching `root` recursively.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let mapper = DiskVfs::new(&root);
        let (sender, receiver) = flume::unbounded();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        return;
                    }
                    for path in event.paths.iter().filter_map(|p| mapper.to_vfs_path(p)) {
                        // The receiver is gone once the watcher is dropped.
                        let _ = sender.send(path);
                    }
                }
                Err(e) => warn!("File watch error: {e}"),
            },
            Config::default(),
        )
        .map_err(|e| ShaderError::Watch(e.to_string()))?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|e| ShaderError::Watch(e.to_string()))?;
        info!("Watching {} for shader changes", root.display());

        Ok(Self {
            _watcher: watcher,
            receiver,
        })
    }

    /// Takes every queued change without blocking. Each path appears once.
    #[must_use]
    pub fn drain(&self) -> Vec<VfsPath> {
        let mut changed = Vec::new();
        for path in self.receiver.try_iter() {
            if !changed.contains(&path) {
                changed.push(path);
            }
        }
        changed
    }

    /// Like [`drain`](Self::drain), but waits up to `timeout` for the first
    /// change when none is queued.
    #[must_use]
    pub fn drain_timeout(&self, timeout: Duration) -> Vec<VfsPath> {
        match self.receiver.recv_timeout(timeout) {
            Ok(first) => {
                let mut changed = vec![first];
                for path in self.drain() {
                    if !changed.contains(&path) {
                        changed.push(path);
                    }
                }
                changed
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_reports_vfs_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("shaders/glsl")).unwrap();
        std::fs::write(dir.path().join("shaders/glsl/model.fs"), "void main() {}\n").unwrap();

        let watcher = FileWatcher::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("shaders/glsl/model.fs"), "void main() { }\n").unwrap();

        let target = VfsPath::new("shaders/glsl/model.fs");
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut seen = false;
        while !seen && Instant::now() < deadline {
            seen = watcher
                .drain_timeout(Duration::from_millis(200))
                .contains(&target);
        }
        assert!(seen, "no change reported for {target}");
    }

    #[test]
    fn test_drain_is_empty_without_changes() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = FileWatcher::new(dir.path()).unwrap();
        assert!(watcher.drain().is_empty());
    }
}
