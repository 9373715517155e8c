//! Inclusion policy for observed input files
//!
//! Filtering happens when an observation arrives rather than after the graph
//! is built, so large graphs never hold files that could not matter.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::error::GraphError;
use crate::model::ChangedFileSet;

/// Files under a repository root that git does not ignore.
#[derive(Debug, Clone)]
pub struct RepositoryFilter {
    root: PathBuf,
    gitignore: Gitignore,
}

impl RepositoryFilter {
    /// Load `.gitignore` and `.git/info/exclude` from `root` when present.
    pub fn load(root: &Path) -> Result<Self, GraphError> {
        let mut builder = GitignoreBuilder::new(root);
        for file in [root.join(".gitignore"), root.join(".git/info/exclude")] {
            if file.is_file() {
                if let Some(err) = builder.add(&file) {
                    return Err(err.into());
                }
            }
        }
        Ok(RepositoryFilter {
            root: root.to_path_buf(),
            gitignore: builder.build()?,
        })
    }

    /// Build from explicit gitignore-syntax lines.
    pub fn with_patterns(root: &Path, lines: &[&str]) -> Result<Self, GraphError> {
        let mut builder = GitignoreBuilder::new(root);
        for line in lines {
            builder.add_line(None, line)?;
        }
        Ok(RepositoryFilter {
            root: root.to_path_buf(),
            gitignore: builder.build()?,
        })
    }

    pub fn accepts(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
            && !self
                .gitignore
                .matched_path_or_any_parents(path, false)
                .is_ignore()
    }
}

#[derive(Debug, Clone)]
enum FilterMode {
    All,
    ChangedFiles(ChangedFileSet),
    Repository(RepositoryFilter),
}

/// Decides whether an observed input file is kept on its unit.
#[derive(Debug, Clone)]
pub struct InputFilter {
    mode: FilterMode,
    ignored: HashSet<PathBuf>,
}

impl InputFilter {
    pub fn all() -> Self {
        Self::from_mode(FilterMode::All)
    }

    /// Keep only files that are part of the change set.
    pub fn changed_files(files: ChangedFileSet) -> Self {
        Self::from_mode(FilterMode::ChangedFiles(files))
    }

    /// Keep only files under the repository root that are not git-ignored.
    pub fn repository(filter: RepositoryFilter) -> Self {
        Self::from_mode(FilterMode::Repository(filter))
    }

    fn from_mode(mode: FilterMode) -> Self {
        InputFilter {
            mode,
            ignored: HashSet::new(),
        }
    }

    /// Additionally reject these exact paths.
    pub fn ignoring<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.ignored.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn accepts(&self, path: &Path) -> bool {
        if self.ignored.contains(path) {
            return false;
        }
        match &self.mode {
            FilterMode::All => true,
            FilterMode::ChangedFiles(files) => files.contains(path),
            FilterMode::Repository(repo) => repo.accepts(path),
        }
    }
}

impl Default for InputFilter {
    fn default() -> Self {
        Self::all()
    }
}
