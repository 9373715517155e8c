//! Error types for graph construction.

use std::path::PathBuf;

/// Errors raised while assembling a [`crate::BuildGraph`].
///
/// Diffing has no error conditions; these only come from construction.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Two units share a path.
    #[error("build unit '{}' appears more than once", .unit.display())]
    DuplicateUnit {
        /// The repeated unit path.
        unit: PathBuf,
    },

    /// An evaluated node has no input accumulator. The node set and the
    /// accumulator set were not built from the same enumeration.
    #[error("no input accumulator for build unit '{}'", .unit.display())]
    MissingAccumulator {
        /// The unit path reported by the evaluator.
        unit: PathBuf,
    },

    /// An input-file observation named an owner the collector does not know.
    #[error("input file '{}' reported for unknown build unit '{}'", .path.display(), .unit.display())]
    UnknownUnit {
        /// The observed input file.
        path: PathBuf,
        /// The owner named by the observation.
        unit: PathBuf,
    },

    /// Ignore rules for the repository filter could not be loaded.
    #[error("failed to load ignore rules: {0}")]
    Ignore(#[from] ignore::Error),
}
