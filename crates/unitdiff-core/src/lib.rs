//! unitdiff core: build graph model, graph collector, and graph differ

pub mod builder;
pub mod diff;
pub mod error;
pub mod filter;
pub mod graph;
pub mod model;
pub mod packages;


#[cfg(test)]
pub mod test_utils;

pub use builder::{EvaluatedUnit, GraphCollector};
pub use diff::{DiffStats, GraphDiff, diff};
pub use error::GraphError;
pub use filter::{InputFilter, RepositoryFilter};
pub use graph::{BuildGraph, GraphOrder};
pub use model::{BuildUnit, ChangedFileSet, DiffEntry, DiffStatus, PackageReference};
pub use packages::{DeclaredPackage, PackageDeclarations};
