//! Picks which diff entries get reported.

use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use unitdiff_core::{DiffEntry, DiffStatus};
use unitdiff_fs::paths;

use crate::output::relative_path;

/// Which statuses are reported. Removed units are left out unless asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusFilter {
    pub added: bool,
    pub removed: bool,
    pub modified: bool,
    pub referencing: bool,
}

impl Default for StatusFilter {
    fn default() -> Self {
        StatusFilter {
            added: true,
            removed: false,
            modified: true,
            referencing: true,
        }
    }
}

impl StatusFilter {
    pub fn accepts(&self, status: DiffStatus) -> bool {
        match status {
            DiffStatus::Added => self.added,
            DiffStatus::Removed => self.removed,
            DiffStatus::Modified => self.modified,
            DiffStatus::ReferenceChanged => self.referencing,
        }
    }
}

fn glob_set(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .case_insensitive(true)
            .build()
            .with_context(|| format!("invalid unit pattern '{pattern}'"))?;
        builder.add(glob);
    }
    Ok(Some(builder.build()?))
}

/// Status filter plus include/exclude globs over unit paths. Globs match
/// the path relative to `root` with `/` separators.
pub struct Selection {
    statuses: StatusFilter,
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
    root: PathBuf,
}

impl Selection {
    pub fn new(
        statuses: StatusFilter,
        include: &[String],
        exclude: &[String],
        root: impl Into<PathBuf>,
    ) -> anyhow::Result<Self> {
        Ok(Selection {
            statuses,
            include: glob_set(include)?,
            exclude: glob_set(exclude)?,
            root: root.into(),
        })
    }

    fn accepts_path(&self, path: &Path) -> bool {
        let relative = paths::forward_slashes(&relative_path(&self.root, path));
        if let Some(include) = &self.include {
            if !include.is_match(&relative) {
                return false;
            }
        }
        match &self.exclude {
            Some(exclude) => !exclude.is_match(&relative),
            None => true,
        }
    }

    pub fn accepts(&self, entry: &DiffEntry) -> bool {
        self.statuses.accepts(entry.status) && self.accepts_path(&entry.path)
    }

    pub fn apply(&self, entries: Vec<DiffEntry>) -> Vec<DiffEntry> {
        let total = entries.len();
        let selected: Vec<DiffEntry> = entries.into_iter().filter(|e| self.accepts(e)).collect();
        tracing::debug!("Selected {} of {} entries", selected.len(), total);
        selected
    }
}
