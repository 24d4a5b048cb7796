//! Bounded, persisted memory of alert IDs that have already been dispatched.
//!
//! IDs are kept oldest-first. Once the store holds `cap` IDs, recording a new
//! one evicts the oldest, regardless of how recently it was looked up. Every
//! mutation rewrites the backing file in full (one ID per line) so a restart
//! resumes with the same history.

use std::collections::{HashSet, VecDeque};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::utils::fs;
use crate::{Error, Result};

/// Ordered, capped set of seen alert IDs backed by a plain-text file.
///
/// Not synchronized: the dispatch loop is the only mutator.
#[derive(Debug)]
pub struct SeenIdStore {
    ids: VecDeque<String>,
    index: HashSet<String>,
    cap: NonZeroUsize,
    path: PathBuf,
}

impl SeenIdStore {
    /// Create an empty store that persists to `path`. Nothing is read or written.
    pub fn new(path: impl Into<PathBuf>, cap: NonZeroUsize) -> Self {
        Self {
            ids: VecDeque::with_capacity(cap.get()),
            index: HashSet::with_capacity(cap.get()),
            cap,
            path: path.into(),
        }
    }

    /// Load persisted IDs from `path` in file order.
    ///
    /// A missing file yields an empty store. Blank lines and duplicates are
    /// skipped; if the file holds more than `cap` IDs only the newest `cap`
    /// are kept.
    pub fn load(path: impl Into<PathBuf>, cap: NonZeroUsize) -> Result<Self> {
        let mut store = Self::new(path, cap);

        let contents = match std::fs::read_to_string(&store.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %store.path.display(), "No seen-alert history found, starting empty");
                return Ok(store);
            }
            Err(e) => return Err(fs::io_error("reading seen-alert history", &store.path, e)),
        };

        for line in contents.lines() {
            let id = line.trim();
            if id.is_empty() || store.index.contains(id) {
                continue;
            }
            store.push_bounded(id.to_string());
        }

        debug!(
            path = %store.path.display(),
            count = store.ids.len(),
            cap = store.cap.get(),
            "Loaded seen-alert history"
        );
        Ok(store)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Record `id` as seen and persist the full history.
    ///
    /// Returns `false` without touching the store when `id` is already
    /// present. A persistence failure is logged and swallowed; the in-memory
    /// state remains authoritative for the rest of the process.
    pub fn record(&mut self, id: &str) -> bool {
        if self.index.contains(id) {
            return false;
        }

        if let Some(evicted) = self.push_bounded(id.to_string()) {
            debug!(evicted = %evicted, "Evicted oldest seen alert");
        }

        if let Err(e) = self.persist() {
            warn!(error = %e, "Seen-alert history not persisted; continuing with in-memory state");
        }
        true
    }

    /// Overwrite the backing file with the current history.
    pub fn persist(&self) -> Result<()> {
        let contents = self
            .ids
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");

        fs::write_replace_sync(&self.path, contents.as_bytes()).map_err(|source| {
            Error::Persistence {
                path: self.path.clone(),
                source,
            }
        })
    }

    /// IDs oldest-first.
    pub fn ids(&self) -> impl ExactSizeIterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn cap(&self) -> NonZeroUsize {
        self.cap
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn push_bounded(&mut self, id: String) -> Option<String> {
        self.index.insert(id.clone());
        self.ids.push_back(id);

        if self.ids.len() > self.cap.get() {
            let evicted = self.ids.pop_front()?;
            self.index.remove(&evicted);
            return Some(evicted);
        }
        None
    }
}
