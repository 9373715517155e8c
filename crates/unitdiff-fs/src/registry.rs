//! The evaluation engine's registry of loaded build-definition files

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

/// Where preloaded build definitions are handed to the evaluation engine.
///
/// Some imported definitions are resolved by the engine's own import logic and
/// never read through [`crate::FileSystem`]; the snapshot file system registers
/// them here on first sight instead.
pub trait ProjectRegistry: Send + Sync {
    fn is_loaded(&self, path: &Path) -> bool;

    fn register(&self, path: &Path, contents: Arc<[u8]>) -> anyhow::Result<()>;
}

/// A registry that keeps loaded definitions in a concurrent map.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    projects: DashMap<PathBuf, Arc<[u8]>>,
    registrations: AtomicUsize,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<Arc<[u8]>> {
        self.projects.get(path).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Total number of `register` calls, including repeats.
    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }
}

impl ProjectRegistry for InMemoryRegistry {
    fn is_loaded(&self, path: &Path) -> bool {
        self.projects.contains_key(path)
    }

    fn register(&self, path: &Path, contents: Arc<[u8]>) -> anyhow::Result<()> {
        self.registrations.fetch_add(1, Ordering::SeqCst);
        self.projects.insert(path.to_path_buf(), contents);
        Ok(())
    }
}
