//! Executor configuration and results

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use unitdiff_core::{DiffEntry, GraphOrder};

/// Which observed input files are kept on a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputScope {
    /// Only files in the change set. Keeps both graphs small.
    #[default]
    ChangedFiles,
    /// Every file under the repository root that git does not ignore.
    Repository,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutorOptions {
    /// Compare against the merge base of base and head instead of base itself.
    pub find_merge_base: bool,
    /// Absolute paths that never count as changed nor as inputs.
    pub ignore_changed_files: Vec<PathBuf>,
    pub collect_package_references: bool,
    pub order: GraphOrder,
    pub input_scope: InputScope,
}

/// Outcome of a diff run as reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Success,
    BaseCommitNotFound,
    HeadCommitNotFound,
    MergeBaseNotFound,
}

impl ExecutionStatus {
    pub fn is_success(self) -> bool {
        self == ExecutionStatus::Success
    }

    /// Process exit code for this status.
    pub fn exit_code(self) -> i32 {
        match self {
            ExecutionStatus::Success => 0,
            ExecutionStatus::BaseCommitNotFound => 2,
            ExecutionStatus::HeadCommitNotFound => 3,
            ExecutionStatus::MergeBaseNotFound => 4,
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ExecutionStatus::Success => "success",
            ExecutionStatus::BaseCommitNotFound => "base commit not found",
            ExecutionStatus::HeadCommitNotFound => "head commit not found",
            ExecutionStatus::MergeBaseNotFound => "merge base not found",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDiffResult {
    pub status: ExecutionStatus,
    /// Changed files after ignored paths were removed, sorted.
    pub changed_files: Vec<PathBuf>,
    pub entries: Vec<DiffEntry>,
}

impl ProjectDiffResult {
    pub(crate) fn failed(status: ExecutionStatus) -> Self {
        ProjectDiffResult {
            status,
            changed_files: Vec::new(),
            entries: Vec::new(),
        }
    }
}
