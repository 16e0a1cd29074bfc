use super::atomic::{read_json_or, write_json_atomic};
use crate::error::Result;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Persistent set of processed video ids.
///
/// Ids are remembered in arrival order. Without a limit the set only grows; with
/// a limit the oldest ids are forgotten first once the limit is exceeded.
#[derive(Debug, Clone)]
pub struct SeenSet {
    path: PathBuf,
    order: VecDeque<String>,
    ids: HashSet<String>,
    limit: Option<usize>,
}

impl SeenSet {
    /// Empty set bound to `path`
    pub fn new(path: PathBuf, limit: Option<usize>) -> Self {
        Self {
            path,
            order: VecDeque::new(),
            ids: HashSet::new(),
            limit,
        }
    }

    /// Load the set from `path`; a missing or corrupt file yields an empty set
    pub fn load(path: &Path, limit: Option<usize>) -> Self {
        let stored: Vec<String> = read_json_or(path, Vec::new());

        let mut seen = Self::new(path.to_path_buf(), limit);
        for id in stored {
            seen.add(id);
        }

        info!("📋 Loaded {} seen video ids from {}", seen.len(), path.display());
        seen
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Remember an id; returns false if it was already known
    pub fn add(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.ids.contains(&id) {
            return false;
        }

        self.ids.insert(id.clone());
        self.order.push_back(id);
        self.evict_over_limit();
        true
    }

    /// Mark `ids` as the most recent entries, adding any that are missing.
    ///
    /// Stored files may come without a meaningful order, so ids that must not be
    /// evicted are moved behind everything else.
    pub fn refresh<'a, I: IntoIterator<Item = &'a str>>(&mut self, ids: I) {
        let ids: Vec<&str> = ids.into_iter().collect();
        if ids.is_empty() {
            return;
        }

        let moved: HashSet<&str> = ids.iter().copied().collect();
        self.order.retain(|id| !moved.contains(id.as_str()));
        for id in &moved {
            self.ids.remove(*id);
        }

        for id in ids {
            self.add(id);
        }
    }

    fn evict_over_limit(&mut self) {
        let Some(limit) = self.limit else {
            return;
        };

        while self.order.len() > limit {
            if let Some(oldest) = self.order.pop_front() {
                debug!("Forgetting seen id {}", oldest);
                self.ids.remove(&oldest);
            }
        }
    }

    /// Write the full set atomically
    pub fn persist(&self) -> Result<()> {
        let ids: Vec<&String> = self.order.iter().collect();
        write_json_atomic(&self.path, &ids)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ids in arrival order, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}
