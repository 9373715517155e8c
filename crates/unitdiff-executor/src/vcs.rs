//! Version-control collaborator

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use unitdiff_fs::SnapshotTree;

/// Identifies one immutable snapshot, such as a commit hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotId(pub String);

impl SnapshotId {
    pub fn new(id: impl Into<String>) -> Self {
        SnapshotId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Access to repository history.
///
/// Every path returned is absolute, rooted at [`VersionControl::working_directory`].
#[async_trait::async_trait]
pub trait VersionControl: Send + Sync {
    fn working_directory(&self) -> &Path;

    async fn is_shallow(&self) -> Result<bool>;

    /// Resolve a revision expression; `None` when it names nothing.
    async fn resolve(&self, revision: &str) -> Result<Option<SnapshotId>>;

    /// The snapshot the working directory is based on.
    async fn head(&self) -> Result<SnapshotId>;

    async fn merge_base(&self, a: &SnapshotId, b: &SnapshotId) -> Result<Option<SnapshotId>>;

    /// Files that differ between `base` and `head`, where `None` means the
    /// working directory including staged changes.
    async fn changed_files(&self, base: &SnapshotId, head: Option<&SnapshotId>) -> Result<Vec<PathBuf>>;

    async fn tree(&self, id: &SnapshotId) -> Result<Arc<dyn SnapshotTree>>;
}
