//! Output formatters for diff results

mod json;
mod plain;
mod slnf;
mod traversal;

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use clap::ValueEnum;
use serde::Deserialize;
use unitdiff_core::DiffEntry;
use unitdiff_fs::paths;

pub use json::JsonFormatter;
pub use plain::PlainFormatter;
pub use slnf::SlnfFormatter;
pub use traversal::TraversalFormatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One unit path per line
    Plain,
    /// Array of entries with status and references
    Json,
    /// Solution filter listing the affected units
    Slnf,
    /// Traversal project referencing the affected units
    Traversal,
}

impl OutputFormat {
    /// Guess the format from an output file's extension.
    pub fn from_extension(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => OutputFormat::Json,
            Some("slnf") => OutputFormat::Slnf,
            Some("proj") => OutputFormat::Traversal,
            _ => OutputFormat::Plain,
        }
    }
}

/// Where output goes and how paths in it are written.
#[derive(Debug, Clone)]
pub struct OutputContext {
    /// Directory relative paths are computed from: the output file's
    /// directory, or the working directory when writing to stdout.
    pub root: PathBuf,
    pub absolute_paths: bool,
}

impl OutputContext {
    /// Render `path` with `/` separators, relative to the root unless
    /// absolute paths were requested.
    pub fn normalize(&self, path: &Path) -> String {
        if self.absolute_paths {
            paths::forward_slashes(path)
        } else {
            paths::forward_slashes(&relative_path(&self.root, path))
        }
    }
}

pub trait Formatter {
    fn write(&self, entries: &[DiffEntry], context: &OutputContext, out: &mut dyn Write) -> anyhow::Result<()>;
}

/// Lexical relative path from directory `base` to `path`.
///
/// Falls back to `path` itself when the two share no root.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    let base = paths::normalize(base);
    let path = paths::normalize(path);
    let base_parts: Vec<Component<'_>> = base.components().collect();
    let path_parts: Vec<Component<'_>> = path.components().collect();

    let common = base_parts
        .iter()
        .zip(&path_parts)
        .take_while(|(a, b)| a == b)
        .count();
    if common == 0 && (base.has_root() || path.has_root()) {
        return path.clone();
    }

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[common..] {
        relative.push(part.as_os_str());
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    relative
}

/// Same as [`relative_path`] but with `\` separators, as build tools on
/// every platform expect in solution filters and traversal projects.
pub(crate) fn backslashed(base: &Path, path: &Path) -> String {
    relative_path(base, path).to_string_lossy().replace('/', "\\")
}
