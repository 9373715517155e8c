//! Error types for the diff executor.

use unitdiff_core::GraphError;
use unitdiff_fs::FsError;

/// Failures that abort a diff run.
///
/// Revisions that cannot be found are not errors; they are reported through
/// [`crate::ExecutionStatus`].
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// Reading a snapshot or the working tree failed.
    #[error(transparent)]
    Fs(#[from] FsError),

    /// Graph construction hit an invariant violation.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The version-control collaborator failed.
    #[error("version control operation '{operation}' failed")]
    VersionControl {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The project evaluator failed while building the graph for a snapshot.
    #[error("project evaluation failed for {snapshot}")]
    Evaluation {
        snapshot: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ExecutorError {
    pub(crate) fn version_control(operation: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| ExecutorError::VersionControl { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::path::PathBuf;

    #[test]
    fn version_control_display_and_source() {
        let err = ExecutorError::version_control("merge-base")(anyhow::anyhow!("object not found"));
        assert_eq!(err.to_string(), "version control operation 'merge-base' failed");
        assert_eq!(err.source().unwrap().to_string(), "object not found");
    }

    #[test]
    fn graph_errors_are_transparent() {
        let err: ExecutorError = GraphError::MissingAccumulator {
            unit: PathBuf::from("/repo/App/App.csproj"),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "no input accumulator for build unit '/repo/App/App.csproj'"
        );
    }

    #[test]
    fn evaluation_display() {
        let err = ExecutorError::Evaluation {
            snapshot: "working directory".into(),
            source: anyhow::anyhow!("bad project"),
        };
        assert_eq!(err.to_string(), "project evaluation failed for working directory");
    }
}
