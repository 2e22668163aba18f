//! Output directory watcher.
//!
//! Turns files written by the bundler into [`AssetEmitted`] events.

use crate::error::{CliError, Result};
use fob_plugin_tunnel::AssetEmitted;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::trace;
use walkdir::WalkDir;

/// Watches the output directory and reports emitted assets.
///
/// Repeated writes to the same file within the debounce window are reported
/// once.
pub struct AssetWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl AssetWatcher {
    /// Start watching `root` recursively.
    ///
    /// # Returns
    ///
    /// Tuple of (AssetWatcher, receiver for emitted assets)
    ///
    /// # Errors
    ///
    /// Returns error if `root` is not a directory or the watcher cannot start
    pub fn new(root: PathBuf, debounce: Duration) -> Result<(Self, mpsc::Receiver<AssetEmitted>)> {
        if !root.is_dir() {
            return Err(CliError::NotADirectory(root));
        }

        let (tx, rx) = mpsc::channel(100);
        let watch_root = root.clone();
        let mut debouncer = Debouncer::new(debounce);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else {
                return;
            };
            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                return;
            }

            for path in &event.paths {
                if Self::should_ignore(path, &watch_root) || !path.is_file() {
                    continue;
                }

                if !debouncer.should_emit(path, Instant::now()) {
                    continue;
                }

                let Some(asset) = Self::asset_for(path, &watch_root) else {
                    continue;
                };
                trace!(asset = %asset.file, "asset emitted");

                // Receiver gone means the session is shutting down
                if tx.blocking_send(asset).is_err() {
                    return;
                }
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    /// Assets already present under `root`, sorted by file name.
    ///
    /// Symlinks are not followed.
    pub fn existing_assets(root: &Path) -> Result<Vec<AssetEmitted>> {
        let mut assets = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !Self::should_ignore(e.path(), root))
        {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(asset) = Self::asset_for(entry.path(), root) {
                assets.push(asset);
            }
        }

        assets.sort_by(|a, b| a.file.cmp(&b.file));
        Ok(assets)
    }

    /// Directory being watched.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn asset_for(path: &Path, root: &Path) -> Option<AssetEmitted> {
        let rel = path.strip_prefix(root).ok()?;
        let file = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        Some(AssetEmitted::new(file, path.to_path_buf()))
    }

    /// Hidden files, editor temp files and source maps are not assets.
    fn should_ignore(path: &Path, root: &Path) -> bool {
        let Ok(rel_path) = path.strip_prefix(root) else {
            return true;
        };

        for component in rel_path.components() {
            if let Some(name) = component.as_os_str().to_str() {
                if name.starts_with('.') && name != "." && name != ".." {
                    return true;
                }
            }
        }

        let name = rel_path.to_string_lossy();
        name.ends_with('~') || name.ends_with(".tmp") || name.ends_with(".map")
    }
}

/// Per-path debounce window.
///
/// Entries older than the window are dropped on every emit, so the map only
/// holds paths written recently.
struct Debouncer {
    window: Duration,
    last_seen: HashMap<PathBuf, Instant>,
}

impl Debouncer {
    fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: HashMap::new(),
        }
    }

    fn should_emit(&mut self, path: &Path, now: Instant) -> bool {
        if let Some(last) = self.last_seen.get(path) {
            if now.duration_since(*last) < self.window {
                return false;
            }
        }

        let window = self.window;
        self.last_seen
            .retain(|_, seen| now.duration_since(*seen) < window);
        self.last_seen.insert(path.to_path_buf(), now);
        true
    }
}
