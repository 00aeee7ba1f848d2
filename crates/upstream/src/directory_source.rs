//! Directory-polling update source
//!
//! Watches a directory of JSON payloads. Every poll, files whose content
//! changed since the previous poll are sent as one batch, keyed by file path.
//! Removed files are forgotten; nothing is sent for them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bytes::Bytes;
use contracts::{ContractError, RawUpdate, UpdateBatch, UpdateMetadata, UpdateSender, UpdateSource};
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::error::{Result, UpstreamError};

/// Granularity at which the poller notices `close`
const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Directory source configuration
#[derive(Debug, Clone)]
pub struct DirectorySourceConfig {
    /// Directory to watch
    pub path: PathBuf,

    /// Time between two scans
    pub poll_interval: Duration,

    /// File extension to pick up (without the dot)
    pub extension: String,

    /// Product recorded in update metadata
    pub product: String,
}

impl DirectorySourceConfig {
    /// Watch `path` for `*.json` files every second
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            poll_interval: Duration::from_secs(1),
            extension: "json".to_string(),
            product: UpdateMetadata::APM_TRACING.to_string(),
        }
    }

    /// Override the poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Last content seen for one file
struct Seen {
    content: Bytes,
    version: u64,
}

/// Scanner state, owned by the polling thread
struct Scanner {
    config: DirectorySourceConfig,
    seen: HashMap<PathBuf, Seen>,
}

impl Scanner {
    fn new(config: DirectorySourceConfig) -> Self {
        Self {
            config,
            seen: HashMap::new(),
        }
    }

    /// Collect files that are new or changed since the last scan
    fn scan(&mut self) -> UpdateBatch {
        let mut batch = UpdateBatch::new();
        let entries = match std::fs::read_dir(&self.config.path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.config.path.display(), error = %e, "Failed to list directory");
                return batch;
            }
        };

        let mut present = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !self.matches(&path) {
                continue;
            }
            present.push(path.clone());

            let content = match std::fs::read(&path) {
                Ok(data) => Bytes::from(data),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to read payload file");
                    continue;
                }
            };

            if let Some(update) = self.observe(&path, content) {
                batch.insert(path.display().to_string(), update);
            }
        }

        self.seen.retain(|path, _| present.contains(path));
        batch
    }

    fn matches(&self, path: &Path) -> bool {
        path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(&self.config.extension))
    }

    fn observe(&mut self, path: &Path, content: Bytes) -> Option<RawUpdate> {
        let version = match self.seen.get(path) {
            Some(seen) if seen.content == content => return None,
            Some(seen) => seen.version + 1,
            None => 1,
        };
        self.seen.insert(
            path.to_path_buf(),
            Seen {
                content: content.clone(),
                version,
            },
        );

        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let metadata = UpdateMetadata {
            product: self.config.product.clone(),
            name: path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string(),
            id,
            version,
            raw_length: 0,
            received_at: chrono::Utc::now(),
        };
        Some(RawUpdate::new(content, metadata))
    }
}

/// Update source that polls a directory on a dedicated thread
pub struct DirectorySource {
    name: String,
    config: DirectorySourceConfig,
    running: Arc<AtomicBool>,
    sender: Mutex<Option<UpdateSender>>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl DirectorySource {
    /// Create a source for an existing directory
    ///
    /// # Errors
    /// Fails if `config.path` is not a directory.
    pub fn new(config: DirectorySourceConfig) -> Result<Self> {
        if !config.path.is_dir() {
            return Err(UpstreamError::DirectoryNotFound {
                path: config.path.display().to_string(),
            });
        }
        Ok(Self {
            name: format!("directory:{}", config.path.display()),
            config,
            running: Arc::new(AtomicBool::new(false)),
            sender: Mutex::new(None),
            thread_handle: Mutex::new(None),
        })
    }

    /// Watched directory
    pub fn path(&self) -> &Path {
        &self.config.path
    }
}

fn poll_loop(
    mut scanner: Scanner,
    updates: UpdateSender,
    running: Arc<AtomicBool>,
    name: String,
) {
    debug!(source = %name, "Directory poller started");
    let interval = scanner.config.poll_interval;

    while running.load(Ordering::SeqCst) {
        let started = Instant::now();
        let batch = scanner.scan();

        if !batch.is_empty() {
            let entries = batch.len();
            if updates.send_blocking(batch).is_err() {
                debug!(source = %name, "Update channel closed, poller exiting");
                break;
            }
            info!(source = %name, entries, "Directory changes published");
        } else {
            trace!(source = %name, "No directory changes");
        }

        while running.load(Ordering::SeqCst) && started.elapsed() < interval {
            thread::sleep(STOP_CHECK_INTERVAL.min(interval));
        }
    }

    debug!(source = %name, "Directory poller stopped");
}

impl UpdateSource for DirectorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_ready(&self) -> bool {
        self.config.path.is_dir()
    }

    fn start(&self, updates: UpdateSender) -> std::result::Result<(), ContractError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(UpstreamError::AlreadyRunning {
                source_name: self.name.clone(),
            }
            .into());
        }

        let scanner = Scanner::new(self.config.clone());
        let running = Arc::clone(&self.running);
        let name = self.name.clone();
        let thread_updates = updates.clone();

        let handle = thread::Builder::new()
            .name("directory-source".to_string())
            .spawn(move || poll_loop(scanner, thread_updates, running, name))
            .map_err(|source| {
                self.running.store(false, Ordering::SeqCst);
                UpstreamError::Spawn {
                    source_name: self.name.clone(),
                    source,
                }
            })?;

        *self.sender.lock() = Some(updates);
        *self.thread_handle.lock() = Some(handle);
        info!(
            source = %self.name,
            interval_ms = self.config.poll_interval.as_millis() as u64,
            "Directory source started"
        );
        Ok(())
    }

    fn close(&self) {
        self.running.store(false, Ordering::SeqCst);

        // Unblocks a poller stuck on a full channel
        if let Some(tx) = self.sender.lock().take() {
            tx.close();
        }
        if let Some(handle) = self.thread_handle.lock().take() {
            if handle.join().is_err() {
                warn!(source = %self.name, "Directory poller panicked");
            }
            info!(source = %self.name, "Directory source closed");
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for DirectorySource {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::update_channel;

    fn config(dir: &Path) -> DirectorySourceConfig {
        DirectorySourceConfig::new(dir).with_poll_interval(Duration::from_millis(20))
    }

    #[test]
    fn test_missing_directory_rejected() {
        let result = DirectorySource::new(DirectorySourceConfig::new("/definitely/not/here"));
        assert!(matches!(result, Err(UpstreamError::DirectoryNotFound { .. })));
    }

    #[test]
    fn test_scan_reports_only_changes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), b"{\"v\":1}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let mut scanner = Scanner::new(config(dir.path()));

        let first = scanner.scan();
        assert_eq!(first.len(), 1);
        let update = first.values().next().unwrap();
        assert_eq!(update.metadata.id, "a");
        assert_eq!(update.metadata.version, 1);
        assert_eq!(update.metadata.raw_length, 7);

        assert!(scanner.scan().is_empty());

        std::fs::write(dir.path().join("a.json"), b"{\"v\":2}").unwrap();
        let changed = scanner.scan();
        assert_eq!(changed.values().next().unwrap().metadata.version, 2);
    }

    #[test]
    fn test_removed_file_is_forgotten() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.json");
        std::fs::write(&file, b"{}").unwrap();

        let mut scanner = Scanner::new(config(dir.path()));
        assert_eq!(scanner.scan().len(), 1);

        std::fs::remove_file(&file).unwrap();
        assert!(scanner.scan().is_empty());

        std::fs::write(&file, b"{}").unwrap();
        let again = scanner.scan();
        assert_eq!(again.values().next().unwrap().metadata.version, 1);
    }

    #[tokio::test]
    async fn test_source_publishes_and_closes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("patch.json"), b"{}").unwrap();

        let source = DirectorySource::new(config(dir.path())).unwrap();
        assert!(source.is_ready());

        let (tx, rx) = update_channel(4);
        source.start(tx).unwrap();
        assert!(source.is_running());

        let batch = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(batch.len(), 1);

        source.close();
        source.close();
        assert!(!source.is_running());
    }
}
