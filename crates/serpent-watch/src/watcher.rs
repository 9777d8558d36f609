// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Source-tree watcher.
//!
//! Polls the configured roots, turns file changes into dotted module names
//! and casts `{reload, <<"pkg.module">>}` to the target process.
//!
//! # Design
//!
//! - **Polling**: a recursive mtime scan every poll interval; no OS-specific
//!   notification backend.
//! - **Per-path debounce**: bursts of events on one file collapse into a
//!   single notification.
//! - **Best effort**: a failed cast is logged and the loop keeps going.
//!
//! # Example
//!
//! ```rust,ignore
//! use serpent::Marshaler;
//! use serpent_watch::{FileWatcher, StdoutNotifier, WatchConfig};
//! use std::sync::Arc;
//!
//! let config = WatchConfig::from_file("serpent-watch.toml")?;
//! let mut watcher = FileWatcher::new(
//!     &config,
//!     Arc::new(StdoutNotifier),
//!     Arc::new(Marshaler::new()),
//! );
//! watcher.start()?;
//! // ...
//! watcher.stop();
//! ```

use crate::config::WatchConfig;
use crate::notify::Notifier;
use serpent::{Atom, TermCodec, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("watcher is already running")]
    AlreadyRunning,

    #[error("none of the watched paths exist")]
    NoRoots,

    #[error("failed to spawn watcher thread: {0}")]
    Spawn(#[source] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Changed,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub kind: FileEventKind,
    pub path: PathBuf,
}

/// Dotted module name of `path`, relative to the first root containing it.
///
/// The extension is stripped and path separators become dots. Returns `None`
/// for files outside every root or with non-UTF-8 components.
pub fn module_name(roots: &[PathBuf], path: &Path) -> Option<String> {
    let relative = roots.iter().find_map(|root| path.strip_prefix(root).ok())?;
    let relative = relative.with_extension("");
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("."))
}

/// Recursive mtime scanner.
#[derive(Debug)]
pub struct Scanner {
    roots: Vec<PathBuf>,
    extensions: Vec<String>,
    snapshot: HashMap<PathBuf, SystemTime>,
}

impl Scanner {
    /// Create a scanner primed with the current state of `roots`; files that
    /// already exist produce no event.
    pub fn new(roots: Vec<PathBuf>, extensions: Vec<String>) -> Self {
        let mut scanner = Self {
            roots,
            extensions,
            snapshot: HashMap::new(),
        };
        scanner.snapshot = scanner.collect();
        scanner
    }

    pub fn tracked(&self) -> usize {
        self.snapshot.len()
    }

    /// Compare the tree against the previous scan.
    pub fn scan(&mut self) -> Vec<FileEvent> {
        let current = self.collect();
        let mut events: Vec<FileEvent> = current
            .iter()
            .filter(|(path, mtime)| self.snapshot.get(*path) != Some(*mtime))
            .map(|(path, _)| FileEvent {
                kind: FileEventKind::Changed,
                path: path.clone(),
            })
            .collect();
        events.extend(
            self.snapshot
                .keys()
                .filter(|path| !current.contains_key(*path))
                .map(|path| FileEvent {
                    kind: FileEventKind::Deleted,
                    path: path.clone(),
                }),
        );
        events.sort_by(|a, b| a.path.cmp(&b.path));
        self.snapshot = current;
        events
    }

    fn collect(&self) -> HashMap<PathBuf, SystemTime> {
        let mut files = HashMap::new();
        for root in &self.roots {
            self.walk(root, &mut files);
        }
        files
    }

    fn walk(&self, dir: &Path, files: &mut HashMap<PathBuf, SystemTime>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::trace!("skipping {}: {}", dir.display(), e);
                return;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                self.walk(&path, files);
            } else if self.is_source(&path) {
                if let Some(mtime) = get_mtime(&path) {
                    files.insert(path, mtime);
                }
            }
        }
    }

    fn is_source(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

fn get_mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok().and_then(|m| m.modified().ok())
}

/// Per-path debounce.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last: HashMap<PathBuf, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last: HashMap::new(),
        }
    }

    /// Whether an event for `path` at `now` should go through. The timestamp
    /// is only updated for events that pass.
    pub fn admit(&mut self, path: &Path, now: Instant) -> bool {
        // Entries past the window would admit anyway; drop them.
        let window = self.window;
        self.last
            .retain(|_, last| now.saturating_duration_since(*last) <= window);
        let pass = self
            .last
            .get(path)
            .map_or(true, |last| now.saturating_duration_since(*last) > self.window);
        if pass {
            self.last.insert(path.to_path_buf(), now);
        }
        pass
    }

    /// Paths currently inside their window.
    pub fn tracked(&self) -> usize {
        self.last.len()
    }
}

/// Turns file events into reload casts.
pub struct ReloadDispatcher {
    roots: Vec<PathBuf>,
    pid: String,
    notifier: Arc<dyn Notifier>,
    codec: Arc<dyn TermCodec>,
    debouncer: Debouncer,
}

impl ReloadDispatcher {
    pub fn new(
        config: &WatchConfig,
        notifier: Arc<dyn Notifier>,
        codec: Arc<dyn TermCodec>,
    ) -> Self {
        Self {
            roots: config.paths.clone(),
            pid: config.pid.clone(),
            notifier,
            codec,
            debouncer: Debouncer::new(config.debounce()),
        }
    }

    /// Handle one event; returns `true` if a notification was sent.
    pub fn dispatch(&mut self, event: &FileEvent, now: Instant) -> bool {
        if !self.debouncer.admit(&event.path, now) {
            tracing::trace!("debounced {:?} {}", event.kind, event.path.display());
            return false;
        }
        let Some(module) = module_name(&self.roots, &event.path) else {
            return false;
        };
        tracing::debug!("{:?} {} -> {}", event.kind, event.path.display(), module);

        let message = Value::Tuple(vec![Value::Atom(Atom::new("reload")), Value::Str(module)]);
        let term = match self.codec.encode(&message) {
            Ok(term) => term,
            Err(e) => {
                tracing::warn!("failed to encode reload message: {}", e);
                return false;
            }
        };
        match self.notifier.cast(&self.pid, &term) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("reload notification to {} failed: {}", self.pid, e);
                false
            }
        }
    }
}

/// Watches the configured roots from a background thread.
pub struct FileWatcher {
    config: WatchConfig,
    notifier: Arc<dyn Notifier>,
    codec: Arc<dyn TermCodec>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl FileWatcher {
    /// Create a watcher (not yet started).
    pub fn new(
        config: &WatchConfig,
        notifier: Arc<dyn Notifier>,
        codec: Arc<dyn TermCodec>,
    ) -> Self {
        Self {
            config: config.clone(),
            notifier,
            codec,
            running: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    /// Start polling in a background thread.
    pub fn start(&mut self) -> Result<(), WatchError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(WatchError::AlreadyRunning);
        }
        let (mut scanner, mut dispatcher) = self.prepare()?;

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let interval = self.config.poll_interval();

        let handle = thread::Builder::new()
            .name("serpent-watcher".to_string())
            .spawn(move || poll_loop(&mut scanner, &mut dispatcher, interval, &running))
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                WatchError::Spawn(e)
            })?;

        self.thread = Some(handle);
        Ok(())
    }

    /// Stop the background thread and wait for it.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Poll on the calling thread until `keep_running` turns false.
    pub fn run_until(&self, keep_running: &AtomicBool) -> Result<(), WatchError> {
        let (mut scanner, mut dispatcher) = self.prepare()?;
        poll_loop(
            &mut scanner,
            &mut dispatcher,
            self.config.poll_interval(),
            keep_running,
        );
        Ok(())
    }

    fn prepare(&self) -> Result<(Scanner, ReloadDispatcher), WatchError> {
        let roots: Vec<PathBuf> = self
            .config
            .paths
            .iter()
            .filter(|p| {
                let exists = p.is_dir();
                if !exists {
                    tracing::warn!("watch path {} does not exist, skipping", p.display());
                }
                exists
            })
            .cloned()
            .collect();
        if roots.is_empty() {
            return Err(WatchError::NoRoots);
        }

        let scanner = Scanner::new(roots, self.config.extensions.clone());
        tracing::info!(
            "watching {} file(s) under {} root(s)",
            scanner.tracked(),
            self.config.paths.len()
        );
        let dispatcher = ReloadDispatcher::new(&self.config, self.notifier.clone(), self.codec.clone());
        Ok((scanner, dispatcher))
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn poll_loop(
    scanner: &mut Scanner,
    dispatcher: &mut ReloadDispatcher,
    interval: Duration,
    running: &AtomicBool,
) {
    while running.load(Ordering::SeqCst) {
        thread::sleep(interval);
        if !running.load(Ordering::SeqCst) {
            break;
        }
        let now = Instant::now();
        for event in scanner.scan() {
            dispatcher.dispatch(&event, now);
        }
    }
}
