//! File system view of an immutable snapshot tree
//!
//! Paths under the snapshot root are served from the [`SnapshotTree`]; anything
//! else (SDK files, machine-wide imports) falls through to the live disk.
//!
//! Construction is two-phase. [`SnapshotFileSystem::discover`] yields a view
//! suitable for entry-point discovery, where probing a build definition has no
//! side effects. [`SnapshotFileSystem::materialize`] switches on the preload
//! hook used while the graph is being evaluated.

use std::collections::HashSet;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use tracing::{debug, error, trace};

use crate::error::FsError;
use crate::file_system::{EntryKind, FileAttributes, FileSystem, OpenMode, SearchDepth};
use crate::live::LiveFileSystem;
use crate::paths;
use crate::pattern::LeafPattern;
use crate::registry::ProjectRegistry;
use crate::tree::{SnapshotTree, TreeEntryKind};

/// Extensions of imported build definitions the engine loads on its own.
pub const DEFAULT_PRELOAD_EXTENSIONS: &[&str] = &["props", "targets"];

struct Preloader {
    registry: Arc<dyn ProjectRegistry>,
    extensions: Vec<String>,
    /// Paths being registered or already registered.
    claimed: Mutex<HashSet<PathBuf>>,
}

impl Preloader {
    fn wants(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
    }
}

/// Read-only [`FileSystem`] over a snapshot tree rooted at a repository directory.
pub struct SnapshotFileSystem {
    root: PathBuf,
    tree: Arc<dyn SnapshotTree>,
    live: LiveFileSystem,
    preloader: Option<Preloader>,
}

impl std::fmt::Debug for SnapshotFileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotFileSystem")
            .field("root", &self.root)
            .field("tree", &self.tree.id())
            .field("materialized", &self.preloader.is_some())
            .finish()
    }
}

impl SnapshotFileSystem {
    /// Discovery phase: serve `tree` at `root` with preloading disabled.
    pub fn discover(root: impl AsRef<Path>, tree: Arc<dyn SnapshotTree>) -> Self {
        SnapshotFileSystem {
            root: paths::normalize(root.as_ref()),
            tree,
            live: LiveFileSystem::new(),
            preloader: None,
        }
    }

    /// Construction phase: register `.props`/`.targets` files with `registry`
    /// the first time their existence is checked.
    pub fn materialize(self, registry: Arc<dyn ProjectRegistry>) -> Self {
        self.materialize_with(registry, DEFAULT_PRELOAD_EXTENSIONS)
    }

    pub fn materialize_with(self, registry: Arc<dyn ProjectRegistry>, extensions: &[&str]) -> Self {
        debug!(
            "Materializing snapshot {} at {} (preloading {:?})",
            self.tree.id(),
            self.root.display(),
            extensions
        );
        SnapshotFileSystem {
            preloader: Some(Preloader {
                registry,
                extensions: extensions.iter().map(|e| e.trim_start_matches('.').to_string()).collect(),
                claimed: Mutex::new(HashSet::new()),
            }),
            ..self
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tree_id(&self) -> &str {
        self.tree.id()
    }

    pub fn is_materialized(&self) -> bool {
        self.preloader.is_some()
    }

    /// Tree-relative form of `path`, or `None` when it lies outside the root.
    fn relative(&self, path: &Path) -> Option<String> {
        let relative = paths::tree_relative(&self.root, path);
        if relative.is_none() {
            trace!("Delegating {} to the live file system", path.display());
        }
        relative
    }

    fn unsupported(&self, operation: &'static str, path: &Path) -> FsError {
        FsError::Unsupported {
            operation,
            path: path.to_path_buf(),
        }
    }

    /// Registers `path` at most once. The claim is taken and the lock released
    /// before the registry runs; re-entrant and concurrent checks see the claim.
    fn preload(&self, preloader: &Preloader, path: &Path, relative: &str) {
        let key = paths::normalize(path);
        {
            let mut claimed = preloader.claimed.lock().unwrap_or_else(PoisonError::into_inner);
            if claimed.contains(&key) || preloader.registry.is_loaded(&key) {
                return;
            }
            claimed.insert(key.clone());
        }

        let Some(contents) = self.tree.blob(relative) else {
            self.release(preloader, &key);
            return;
        };
        match preloader.registry.register(&key, contents) {
            Ok(()) => debug!("Preloaded {} from snapshot {}", key.display(), self.tree.id()),
            Err(e) => {
                self.release(preloader, &key);
                let err = FsError::Preload {
                    path: key,
                    reason: format!("{e:#}"),
                };
                error!("{}", err);
            }
        }
    }

    fn release(&self, preloader: &Preloader, key: &Path) {
        preloader
            .claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    fn collect(
        &self,
        relative: &str,
        pattern: &LeafPattern,
        kind: EntryKind,
        depth: SearchDepth,
        out: &mut Vec<PathBuf>,
    ) {
        let Some(children) = self.tree.children(relative) else {
            return;
        };
        for child in children {
            let child_path = if relative.is_empty() {
                child.name.clone()
            } else {
                format!("{relative}/{}", child.name)
            };
            let wanted = match kind {
                EntryKind::File => child.kind == TreeEntryKind::Blob,
                EntryKind::Directory => child.kind == TreeEntryKind::Tree,
                EntryKind::Any => true,
            };
            if wanted && pattern.matches(&child.name) {
                out.push(self.root.join(&child_path));
            }
            if child.kind == TreeEntryKind::Tree && depth == SearchDepth::Recursive {
                self.collect(&child_path, pattern, kind, depth, out);
            }
        }
    }
}

impl FileSystem for SnapshotFileSystem {
    fn open(&self, path: &Path, mode: OpenMode) -> Result<Box<dyn Read + Send>, FsError> {
        let Some(relative) = self.relative(path) else {
            return self.live.open(path, mode);
        };
        if mode != OpenMode::Read {
            return Err(FsError::UnsupportedMode {
                path: path.to_path_buf(),
                mode,
            });
        }
        match self.tree.kind_of(&relative) {
            None => Err(FsError::NotFound {
                path: path.to_path_buf(),
            }),
            Some(TreeEntryKind::Blob) => {
                let contents = self.tree.blob(&relative).ok_or_else(|| FsError::NotABlob {
                    path: path.to_path_buf(),
                })?;
                Ok(Box::new(Cursor::new(contents)))
            }
            Some(_) => Err(FsError::NotABlob {
                path: path.to_path_buf(),
            }),
        }
    }

    fn file_exists(&self, path: &Path) -> bool {
        let Some(relative) = self.relative(path) else {
            return self.live.file_exists(path);
        };
        if self.tree.kind_of(&relative) != Some(TreeEntryKind::Blob) {
            return false;
        }
        if let Some(preloader) = &self.preloader {
            if preloader.wants(path) {
                self.preload(preloader, path, &relative);
            }
        }
        true
    }

    fn directory_exists(&self, path: &Path) -> bool {
        match self.relative(path) {
            Some(relative) => self.tree.kind_of(&relative) == Some(TreeEntryKind::Tree),
            None => self.live.directory_exists(path),
        }
    }

    fn any_exists(&self, path: &Path) -> bool {
        match self.relative(path) {
            Some(relative) => self.tree.kind_of(&relative).is_some(),
            None => self.live.any_exists(path),
        }
    }

    fn enumerate(
        &self,
        path: &Path,
        pattern: &str,
        kind: EntryKind,
        depth: SearchDepth,
    ) -> Result<Vec<PathBuf>, FsError> {
        let Some(relative) = self.relative(path) else {
            return self.live.enumerate(path, pattern, kind, depth);
        };
        let pattern = LeafPattern::new(pattern)?;
        let mut out = Vec::new();
        self.collect(&relative, &pattern, kind, depth, &mut out);
        Ok(out)
    }

    fn last_write_time(&self, path: &Path) -> Result<SystemTime, FsError> {
        match self.relative(path) {
            Some(_) => Err(self.unsupported("last_write_time", path)),
            None => self.live.last_write_time(path),
        }
    }

    fn attributes(&self, path: &Path) -> Result<FileAttributes, FsError> {
        match self.relative(path) {
            Some(_) => Err(self.unsupported("attributes", path)),
            None => self.live.attributes(path),
        }
    }
}
