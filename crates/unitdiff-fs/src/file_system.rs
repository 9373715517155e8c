//! The file access capability handed to the evaluation engine

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::FsError;

/// How a caller wants to open a file. Only [`OpenMode::Read`] is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
    ReadWrite,
    Append,
    Create,
}

/// Which entries an enumeration returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Any,
}

/// Whether an enumeration descends into subdirectories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchDepth {
    #[default]
    TopLevel,
    Recursive,
}

/// Subset of file metadata the evaluation engine may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileAttributes {
    pub is_directory: bool,
    pub is_readonly: bool,
    pub len: u64,
}

/// Read-only file tree view used by project evaluation.
///
/// Implementations must be shareable across the engine's worker threads.
pub trait FileSystem: Send + Sync {
    /// Open a file as a byte stream. Fails with [`FsError::UnsupportedMode`]
    /// for anything but [`OpenMode::Read`].
    fn open(&self, path: &Path, mode: OpenMode) -> Result<Box<dyn Read + Send>, FsError>;

    fn file_exists(&self, path: &Path) -> bool;

    fn directory_exists(&self, path: &Path) -> bool;

    fn any_exists(&self, path: &Path) -> bool;

    /// List entries under `path` whose leaf name matches the shell glob `pattern`.
    fn enumerate(
        &self,
        path: &Path,
        pattern: &str,
        kind: EntryKind,
        depth: SearchDepth,
    ) -> Result<Vec<PathBuf>, FsError>;

    fn last_write_time(&self, path: &Path) -> Result<SystemTime, FsError>;

    fn attributes(&self, path: &Path) -> Result<FileAttributes, FsError>;

    fn read_file(&self, path: &Path) -> Result<Box<dyn Read + Send>, FsError> {
        self.open(path, OpenMode::Read)
    }

    fn read_all_bytes(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        let mut reader = self.read_file(path)?;
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| FsError::io(path, e))?;
        Ok(bytes)
    }

    fn read_all_text(&self, path: &Path) -> Result<String, FsError> {
        let bytes = self.read_all_bytes(path)?;
        String::from_utf8(bytes).map_err(|_| FsError::Encoding {
            path: path.to_path_buf(),
        })
    }

    fn enumerate_files(
        &self,
        path: &Path,
        pattern: &str,
        depth: SearchDepth,
    ) -> Result<Vec<PathBuf>, FsError> {
        self.enumerate(path, pattern, EntryKind::File, depth)
    }

    fn enumerate_directories(
        &self,
        path: &Path,
        pattern: &str,
        depth: SearchDepth,
    ) -> Result<Vec<PathBuf>, FsError> {
        self.enumerate(path, pattern, EntryKind::Directory, depth)
    }

    fn enumerate_entries(
        &self,
        path: &Path,
        pattern: &str,
        depth: SearchDepth,
    ) -> Result<Vec<PathBuf>, FsError> {
        self.enumerate(path, pattern, EntryKind::Any, depth)
    }
}
