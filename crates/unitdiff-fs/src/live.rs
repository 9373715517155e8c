//! File system view of the working tree

use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::trace;

use crate::error::FsError;
use crate::file_system::{EntryKind, FileAttributes, FileSystem, OpenMode, SearchDepth};
use crate::pattern::LeafPattern;

/// Read-only access to the real disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveFileSystem;

impl LiveFileSystem {
    pub fn new() -> Self {
        LiveFileSystem
    }

    fn walk(
        &self,
        dir: &Path,
        pattern: &LeafPattern,
        kind: EntryKind,
        depth: SearchDepth,
        out: &mut Vec<PathBuf>,
    ) -> Result<(), FsError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(FsError::io(dir, e)),
        };

        let mut children = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| FsError::io(dir, e))?;
            let is_dir = entry
                .file_type()
                .map_err(|e| FsError::io(entry.path(), e))?
                .is_dir();
            children.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
        }
        children.sort();

        for (name, is_dir) in children {
            let path = dir.join(&name);
            let wanted = match kind {
                EntryKind::File => !is_dir,
                EntryKind::Directory => is_dir,
                EntryKind::Any => true,
            };
            if wanted && pattern.matches(&name) {
                out.push(path.clone());
            }
            if is_dir && depth == SearchDepth::Recursive {
                self.walk(&path, pattern, kind, depth, out)?;
            }
        }
        Ok(())
    }
}

impl FileSystem for LiveFileSystem {
    fn open(&self, path: &Path, mode: OpenMode) -> Result<Box<dyn Read + Send>, FsError> {
        if mode != OpenMode::Read {
            return Err(FsError::UnsupportedMode {
                path: path.to_path_buf(),
                mode,
            });
        }
        trace!("Opening live file {}", path.display());
        let file = fs::File::open(path).map_err(|e| FsError::io(path, e))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn directory_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn any_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn enumerate(
        &self,
        path: &Path,
        pattern: &str,
        kind: EntryKind,
        depth: SearchDepth,
    ) -> Result<Vec<PathBuf>, FsError> {
        let pattern = LeafPattern::new(pattern)?;
        let mut out = Vec::new();
        self.walk(path, &pattern, kind, depth, &mut out)?;
        Ok(out)
    }

    fn last_write_time(&self, path: &Path) -> Result<SystemTime, FsError> {
        fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| FsError::io(path, e))
    }

    fn attributes(&self, path: &Path) -> Result<FileAttributes, FsError> {
        let meta = fs::metadata(path).map_err(|e| FsError::io(path, e))?;
        Ok(FileAttributes {
            is_directory: meta.is_dir(),
            is_readonly: meta.permissions().readonly(),
            len: meta.len(),
        })
    }
}
