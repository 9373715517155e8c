//! Immutable snapshot trees
//!
//! A [`SnapshotTree`] is what the version-control collaborator hands over for a
//! historical commit: entries addressed by `/`-separated paths relative to the
//! repository root, with `""` naming the root itself.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::error::FsError;

/// What a tree entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeEntryKind {
    Blob,
    Tree,
    /// Submodule links and anything else that is neither file nor directory.
    Other,
}

/// A direct child of a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: String,
    pub kind: TreeEntryKind,
}

/// Read access to one immutable snapshot of the repository tree.
pub trait SnapshotTree: Send + Sync {
    /// Identifier used in log output (a commit or tree id).
    fn id(&self) -> &str;

    /// Kind of the entry at `path`, or `None` when absent.
    fn kind_of(&self, path: &str) -> Option<TreeEntryKind>;

    /// Direct children of the tree at `path`, or `None` when `path` is not a tree.
    fn children(&self, path: &str) -> Option<Vec<TreeEntry>>;

    /// Content of the blob at `path`, or `None` when `path` is not a blob.
    fn blob(&self, path: &str) -> Option<Arc<[u8]>>;
}

#[derive(Debug, Clone)]
enum MemoryNode {
    Blob(Arc<[u8]>),
    Tree,
}

impl MemoryNode {
    fn kind(&self) -> TreeEntryKind {
        match self {
            MemoryNode::Blob(_) => TreeEntryKind::Blob,
            MemoryNode::Tree => TreeEntryKind::Tree,
        }
    }
}

/// A snapshot tree held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryTree {
    id: String,
    entries: BTreeMap<String, MemoryNode>,
    /// Child names keyed by parent path, `""` for the root.
    children: BTreeMap<String, BTreeSet<String>>,
}

impl MemoryTree {
    pub fn builder(id: impl Into<String>) -> MemoryTreeBuilder {
        MemoryTreeBuilder {
            id: id.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Capture the current content of `root` the way a commit would see it:
    /// `.gitignore` rules apply and the `.git` directory is skipped.
    pub fn capture(id: impl Into<String>, root: &Path) -> Result<Self, FsError> {
        let mut builder = Self::builder(id);
        let walker = ignore::WalkBuilder::new(root)
            .hidden(false)
            .require_git(false)
            .filter_entry(|entry| entry.file_name() != ".git")
            .build();

        for entry in walker {
            let entry = entry.map_err(|e| FsError::Io {
                path: root.to_path_buf(),
                source: std::io::Error::other(e.to_string()),
            })?;
            let Some(relative) = crate::paths::tree_relative(root, entry.path()) else {
                continue;
            };
            if relative.is_empty() {
                continue;
            }
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            if is_dir {
                builder = builder.directory(&relative);
            } else {
                let content = std::fs::read(entry.path())
                    .map_err(|e| FsError::io(entry.path(), e))?;
                builder = builder.file(&relative, content);
            }
        }

        let tree = builder.build();
        debug!("Captured {} tree entries from {}", tree.entries.len(), root.display());
        Ok(tree)
    }

    fn parent_of(path: &str) -> &str {
        path.rsplit_once('/').map_or("", |(parent, _)| parent)
    }
}

impl SnapshotTree for MemoryTree {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind_of(&self, path: &str) -> Option<TreeEntryKind> {
        if path.is_empty() {
            return Some(TreeEntryKind::Tree);
        }
        self.entries.get(path).map(MemoryNode::kind)
    }

    fn children(&self, path: &str) -> Option<Vec<TreeEntry>> {
        if self.kind_of(path)? != TreeEntryKind::Tree {
            return None;
        }
        let Some(names) = self.children.get(path) else {
            return Some(Vec::new());
        };
        let children = names
            .iter()
            .filter_map(|name| {
                let key = if path.is_empty() {
                    name.clone()
                } else {
                    format!("{path}/{name}")
                };
                Some(TreeEntry {
                    name: name.clone(),
                    kind: self.entries.get(&key)?.kind(),
                })
            })
            .collect();
        Some(children)
    }

    fn blob(&self, path: &str) -> Option<Arc<[u8]>> {
        match self.entries.get(path)? {
            MemoryNode::Blob(content) => Some(Arc::clone(content)),
            MemoryNode::Tree => None,
        }
    }
}

/// Builds a [`MemoryTree`], creating parent directories implicitly.
#[derive(Debug)]
pub struct MemoryTreeBuilder {
    id: String,
    entries: BTreeMap<String, MemoryNode>,
}

impl MemoryTreeBuilder {
    pub fn file(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        let path = path.trim_matches('/');
        self.add_parents(path);
        let content: Vec<u8> = content.into();
        self.entries
            .insert(path.to_string(), MemoryNode::Blob(content.into()));
        self
    }

    pub fn directory(mut self, path: &str) -> Self {
        let path = path.trim_matches('/');
        self.add_parents(path);
        self.entries.insert(path.to_string(), MemoryNode::Tree);
        self
    }

    fn add_parents(&mut self, path: &str) {
        let mut parent = MemoryTree::parent_of(path);
        while !parent.is_empty() {
            self.entries
                .entry(parent.to_string())
                .or_insert(MemoryNode::Tree);
            parent = MemoryTree::parent_of(parent);
        }
    }

    pub fn build(self) -> MemoryTree {
        let mut children: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for path in self.entries.keys() {
            let (parent, name) = path.rsplit_once('/').unwrap_or(("", path.as_str()));
            children
                .entry(parent.to_string())
                .or_default()
                .insert(name.to_string());
        }
        MemoryTree {
            id: self.id,
            entries: self.entries,
            children,
        }
    }
}
