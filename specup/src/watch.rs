//! Change-triggered rebuilds
//!
//! Each document owns one watcher on its source directory and one
//! [`RebuildController`]. The controller serializes renders: a change that
//! arrives while a render is running is remembered and answered with a
//! single catch-up render once the running one finishes.

use async_trait::async_trait;
use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebouncedEvent, Debouncer};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Default debounce window for filesystem events
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

/// Errors that can occur when starting a watcher
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to create filesystem watcher: {0}")]
    Create(#[source] notify::Error),

    #[error("Failed to watch {path}: {source}", path = .path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Watcher settings
#[derive(Debug, Clone, Copy)]
pub struct WatchConfig {
    /// Events closer together than this are delivered as one batch
    pub debounce: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

/// Keeps the underlying watcher alive; dropping it stops event delivery
pub struct FileWatcher {
    _debouncer: Debouncer<notify::RecommendedWatcher>,
}

impl FileWatcher {
    /// Watch `root` recursively
    ///
    /// # Returns
    /// * `Ok((FileWatcher, receiver))` - Guard plus the stream of changed paths
    /// * `Err(WatchError)` - The watcher could not be created or attached
    pub fn start(
        root: &Path,
        config: WatchConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<PathBuf>), WatchError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let mut debouncer = new_debouncer(
            config.debounce,
            move |res: Result<Vec<DebouncedEvent>, notify::Error>| match res {
                Ok(events) => {
                    for event in events {
                        if event_tx.send(event.path).is_err() {
                            // Receiver dropped, nobody is listening anymore
                            break;
                        }
                    }
                }
                Err(e) => log::warn!("Filesystem watch error: {}", e),
            },
        )
        .map_err(WatchError::Create)?;

        debouncer
            .watcher()
            .watch(root, RecursiveMode::Recursive)
            .map_err(|source| WatchError::Watch {
                path: root.to_path_buf(),
                source,
            })?;

        log::info!("Watching {}", root.display());

        Ok((
            Self {
                _debouncer: debouncer,
            },
            event_rx,
        ))
    }
}

/// Decides which changed paths trigger a rebuild
#[derive(Debug, Clone)]
pub struct WatchFilter {
    /// Source roots (as configured and canonical)
    roots: Vec<PathBuf>,

    /// The document's own output file, in every form we can resolve
    excluded: Vec<PathBuf>,
}

impl WatchFilter {
    /// Build the filter for a document's source root and generated page
    pub fn new(source_root: &Path, output_file: &Path) -> Self {
        Self {
            roots: path_forms(source_root),
            excluded: path_forms(output_file),
        }
    }

    /// Whether a change to `path` should trigger a rebuild
    ///
    /// The generated page never qualifies, and neither does anything hidden
    /// below the source root (dotfiles, `.git`, editor swap files).
    pub fn qualifies(&self, path: &Path) -> bool {
        if self.excluded.iter().any(|excluded| excluded == path) {
            return false;
        }
        !self.is_hidden(path)
    }

    fn is_hidden(&self, path: &Path) -> bool {
        let relative = self
            .roots
            .iter()
            .find_map(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);

        relative.components().any(|component| match component {
            Component::Normal(name) => name.to_string_lossy().starts_with('.'),
            _ => false,
        })
    }
}

/// The path as given, made absolute, and canonicalized when it exists
fn path_forms(path: &Path) -> Vec<PathBuf> {
    let mut forms = vec![path.to_path_buf()];
    if let Ok(absolute) = std::path::absolute(path) {
        forms.push(absolute);
    }
    if let Ok(canonical) = path.canonicalize() {
        forms.push(canonical);
    } else if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
        // The output file may not exist yet, but its directory usually does
        if let Ok(parent) = parent.canonicalize() {
            forms.push(parent.join(name));
        }
    }
    forms.dedup();
    forms
}

/// Per-document rebuild state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebuildState {
    #[default]
    Idle,
    Rendering {
        /// A change arrived after the current render started
        pending: bool,
    },
}

impl RebuildState {
    /// Record a qualifying change; returns true when a render should start now
    pub fn on_change(&mut self) -> bool {
        match self {
            RebuildState::Idle => {
                *self = RebuildState::Rendering { pending: false };
                true
            }
            RebuildState::Rendering { pending } => {
                *pending = true;
                false
            }
        }
    }

    /// Record a finished render; returns true when a catch-up render should start
    pub fn on_render_complete(&mut self) -> bool {
        match self {
            RebuildState::Rendering { pending: true } => {
                *self = RebuildState::Rendering { pending: false };
                true
            }
            _ => {
                *self = RebuildState::Idle;
                false
            }
        }
    }
}

/// The work a controller performs for its document
#[async_trait(?Send)]
pub trait Rebuild {
    /// Re-render and write the document; returns whether it succeeded
    async fn rebuild(&self) -> bool;
}

/// Drives rebuilds of one document from its change events
pub struct RebuildController<R> {
    events: mpsc::UnboundedReceiver<PathBuf>,
    filter: WatchFilter,
    target: R,
    state: RebuildState,
}

impl<R: Rebuild> RebuildController<R> {
    pub fn new(events: mpsc::UnboundedReceiver<PathBuf>, filter: WatchFilter, target: R) -> Self {
        Self {
            events,
            filter,
            target,
            state: RebuildState::Idle,
        }
    }

    /// Current state of the controller
    pub fn state(&self) -> RebuildState {
        self.state
    }

    /// Process change events until the event stream ends
    ///
    /// Returns the number of renders performed.
    pub async fn run(mut self) -> usize {
        let mut renders = 0;

        while let Some(path) = self.events.recv().await {
            if !self.filter.qualifies(&path) {
                log::debug!("Ignoring change to {}", path.display());
                continue;
            }
            log::debug!("Change detected: {}", path.display());
            if !self.state.on_change() {
                continue;
            }

            loop {
                renders += 1;
                self.render_once().await;
                if !self.state.on_render_complete() {
                    break;
                }
                log::debug!("Changes arrived during render, rendering again");
            }
        }

        renders
    }

    /// Run one render while still recording changes that arrive meanwhile
    async fn render_once(&mut self) {
        let render = self.target.rebuild();
        tokio::pin!(render);

        let mut events_open = true;
        loop {
            tokio::select! {
                biased;
                _ = &mut render => break,
                event = self.events.recv(), if events_open => match event {
                    Some(path) if self.filter.qualifies(&path) => {
                        self.state.on_change();
                    }
                    Some(_) => {}
                    None => events_open = false,
                },
            }
        }

        // Events queued while the render future finished without yielding
        while let Ok(path) = self.events.try_recv() {
            if self.filter.qualifies(&path) {
                self.state.on_change();
            }
        }
    }
}
