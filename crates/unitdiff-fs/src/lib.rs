//! Read-only file access for project evaluation
//!
//! The evaluation engine reads build definitions through [`FileSystem`]. Two
//! implementations exist: [`LiveFileSystem`] for the working tree and
//! [`SnapshotFileSystem`] for an immutable historical tree, so the same graph
//! construction code runs against "now" and "then" without a checkout.

pub mod error;
pub mod file_system;
pub mod live;
pub mod paths;
pub mod pattern;
pub mod registry;
pub mod snapshot;
pub mod tree;


pub use error::FsError;
pub use file_system::{EntryKind, FileAttributes, FileSystem, OpenMode, SearchDepth};
pub use live::LiveFileSystem;
pub use pattern::LeafPattern;
pub use registry::{InMemoryRegistry, ProjectRegistry};
pub use snapshot::{DEFAULT_PRELOAD_EXTENSIONS, SnapshotFileSystem};
pub use tree::{MemoryTree, MemoryTreeBuilder, SnapshotTree, TreeEntry, TreeEntryKind};
