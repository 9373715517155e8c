//! Test utilities for unitdiff-core

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::graph::BuildGraph;
use crate::model::{BuildUnit, ChangedFileSet, DiffEntry, DiffStatus, PackageReference};

/// A unit under `/repo` with the given input files and references.
///
/// Short names are expanded: `"P1"` becomes `/repo/P1/P1.csproj` and
/// `"a.cs"` becomes `/repo/a.cs`.
pub fn unit(name: &str, files: &[&str], references: &[&str]) -> BuildUnit {
    BuildUnit::new(unit_path(name))
        .with_input_files(files.iter().map(|f| file_path(f)))
        .with_references(references.iter().map(|r| unit_path(r)))
}

pub fn unit_path(name: &str) -> PathBuf {
    PathBuf::from(format!("/repo/{name}/{name}.csproj"))
}

pub fn file_path(name: &str) -> PathBuf {
    Path::new("/repo").join(name)
}

pub fn graph(units: Vec<BuildUnit>) -> BuildGraph {
    BuildGraph::new(units).unwrap()
}

pub fn changed(files: &[&str]) -> ChangedFileSet {
    files.iter().map(|f| file_path(f)).collect()
}

pub fn package(name: &str, version: &str) -> PackageReference {
    PackageReference::new(name, version)
}

/// Diff results as `(unit name, status)` pairs, sorted for comparison.
pub fn summarize(entries: impl IntoIterator<Item = DiffEntry>) -> Vec<(String, DiffStatus)> {
    let mut summary: Vec<_> = entries
        .into_iter()
        .map(|e| {
            let name = e
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            (name, e.status)
        })
        .collect();
    summary.sort();
    summary
}

/// Chain A -> B -> C, each unit owning one source file.
pub fn chain() -> BuildGraph {
    graph(vec![
        unit("A", &["A/a.cs"], &["B"]),
        unit("B", &["B/b.cs"], &["C"]),
        unit("C", &["C/c.cs"], &[]),
    ])
}

/// Diamond A -> {B, C} -> D.
pub fn diamond() -> BuildGraph {
    graph(vec![
        unit("A", &["A/a.cs"], &["B", "C"]),
        unit("B", &["B/b.cs"], &["D"]),
        unit("C", &["C/c.cs"], &["D"]),
        unit("D", &["D/d.cs"], &[]),
    ])
}

/// Create a repository with a specific file structure
pub fn create_repo_with_structure(structure: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    for (path, content) in structure {
        let full_path = root.join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full_path, content).unwrap();
    }

    temp_dir
}
