//! Project evaluation collaborator

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use unitdiff_core::{EvaluatedUnit, GraphCollector};
use unitdiff_fs::{FileSystem, InMemoryRegistry, ProjectRegistry};

/// Evaluates build definitions read through a [`FileSystem`].
///
/// Evaluation runs in two steps. [`ProjectEvaluator::load_graph`] finds every
/// unit reachable from the entry points; the executor then creates one
/// accumulator per unit and [`ProjectEvaluator::predict`] reports input files
/// into it, possibly from many threads.
#[async_trait::async_trait]
pub trait ProjectEvaluator: Send + Sync {
    /// A fresh registry for one snapshot. Snapshot file systems preload
    /// shared build files into it.
    fn new_registry(&self) -> Arc<dyn ProjectRegistry> {
        Arc::new(InMemoryRegistry::new())
    }

    /// All units reachable from `entry_points`, entry points included.
    async fn load_graph(&self, fs: &dyn FileSystem, entry_points: &[PathBuf]) -> Result<Vec<PathBuf>>;

    /// Report input files for `units` and return their finalized nodes.
    async fn predict(
        &self,
        fs: &dyn FileSystem,
        units: &[PathBuf],
        collector: &GraphCollector,
    ) -> Result<Vec<EvaluatedUnit>>;
}
