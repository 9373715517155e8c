//! Orchestrates a project diff between two revisions
//!
//! Version control, project evaluation, and entry-point discovery are
//! collaborators behind traits; this crate sequences them and feeds the
//! results through the graph collector and differ.

pub mod entry_points;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod options;
pub mod vcs;


#[cfg(test)]
pub mod test_utils;

pub use entry_points::{DirectoryScan, EntryPointProvider, ExplicitEntryPoints, SolutionEntryPoints};
pub use error::ExecutorError;
pub use evaluator::ProjectEvaluator;
pub use executor::ProjectDiffExecutor;
pub use options::{ExecutionStatus, ExecutorOptions, InputScope, ProjectDiffResult};
pub use vcs::{SnapshotId, VersionControl};
