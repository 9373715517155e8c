//! Lexical path helpers shared by the file systems and the graph builder

use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` components without touching the disk.
///
/// Snapshot paths need not exist locally, so `std::fs::canonicalize` is not an option.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Make `path` absolute against `base` (when relative) and normalize it.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

/// Render a path with `/` separators regardless of how it was spelled.
pub fn forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Relative path from `root` to `path` with `/` separators.
///
/// Returns `None` when `path` is not `root` or one of its descendants.
pub fn tree_relative(root: &Path, path: &Path) -> Option<String> {
    let path = normalize(Path::new(&forward_slashes(path)));
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}
