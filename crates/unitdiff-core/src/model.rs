//! Core data structures for the build graph

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// An external package a unit depends on, with its resolved version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageReference {
    pub name: String,
    pub version: String,
}

impl PackageReference {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        PackageReference {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// A single compilable module, keyed by its canonical absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildUnit {
    pub path: PathBuf,
    /// Files whose content, when changed, make this unit directly modified.
    #[serde(default)]
    pub input_files: BTreeSet<PathBuf>,
    /// Paths of other units in the same graph. Targets need not exist.
    #[serde(default)]
    pub references: BTreeSet<PathBuf>,
    /// Only populated when package-version tracking is enabled.
    #[serde(default)]
    pub package_references: BTreeSet<PackageReference>,
}

impl BuildUnit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        BuildUnit {
            path: path.into(),
            input_files: BTreeSet::new(),
            references: BTreeSet::new(),
            package_references: BTreeSet::new(),
        }
    }

    pub fn with_input_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.input_files.extend(files.into_iter().map(Into::into));
        self
    }

    pub fn with_references<I, P>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.references.extend(references.into_iter().map(Into::into));
        self
    }

    pub fn with_package_references<I>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = PackageReference>,
    {
        self.package_references.extend(packages);
        self
    }
}

/// Classification of an affected unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiffStatus {
    Added,
    Removed,
    Modified,
    ReferenceChanged,
}

/// One affected unit in a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffEntry {
    pub path: PathBuf,
    pub status: DiffStatus,
    /// Units this one references in the current graph; empty for removed units.
    pub referenced_projects: Vec<PathBuf>,
}

/// Files whose content differs between the two points being compared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedFileSet {
    files: HashSet<PathBuf>,
}

impl ChangedFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }

    /// Drop every path in `ignored`.
    pub fn without<'a, I>(mut self, ignored: I) -> Self
    where
        I: IntoIterator<Item = &'a Path>,
    {
        for path in ignored {
            self.files.remove(path);
        }
        self
    }

    /// Paths in ascending order, for stable reporting.
    pub fn sorted(&self) -> Vec<PathBuf> {
        let mut files: Vec<_> = self.files.iter().cloned().collect();
        files.sort();
        files
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for ChangedFileSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        ChangedFileSet {
            files: iter.into_iter().map(Into::into).collect(),
        }
    }
}
