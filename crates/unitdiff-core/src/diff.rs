//! Build graph differ
//!
//! Classifies every unit touched between two graphs. The result is produced
//! lazily; the memo behind it lives inside the returned [`GraphDiff`] and is
//! dropped with it, so separate calls never share state.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::graph::BuildGraph;
use crate::model::{BuildUnit, ChangedFileSet, DiffEntry, DiffStatus};

/// Counters describing one diff run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    /// Times the direct-change predicate was actually computed.
    pub direct_evaluations: usize,
    /// Times the reference-change predicate was actually computed.
    pub reference_evaluations: usize,
    /// Reference cycles encountered during propagation.
    pub cycles_detected: usize,
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub reference_changed: usize,
}

#[derive(Debug, Clone, Copy)]
enum Visit {
    InProgress,
    Done(bool),
}

struct Evaluator<'a> {
    previous: &'a BuildGraph,
    current: &'a BuildGraph,
    changed: &'a ChangedFileSet,
    direct: HashMap<&'a Path, bool>,
    references: HashMap<&'a Path, Visit>,
    stats: DiffStats,
}

impl<'a> Evaluator<'a> {
    /// Own inputs or package versions differ. A unit missing from the
    /// previous graph counts as changed.
    fn directly_changed(&mut self, path: &'a Path) -> bool {
        if let Some(&changed) = self.direct.get(path) {
            return changed;
        }
        self.stats.direct_evaluations += 1;

        let changed = match (self.previous.unit(path), self.current.unit(path)) {
            (Some(before), Some(after)) => {
                inputs_changed(before, after, self.changed)
                    || before.package_references != after.package_references
            }
            _ => true,
        };
        self.direct.insert(path, changed);
        changed
    }

    /// The reference set differs, or something it reaches changed.
    fn references_changed(&mut self, path: &'a Path) -> bool {
        match self.references.get(path) {
            Some(Visit::Done(changed)) => return *changed,
            Some(Visit::InProgress) => {
                self.stats.cycles_detected += 1;
                debug!("Reference cycle through {}", path.display());
                return true;
            }
            None => {}
        }
        self.stats.reference_evaluations += 1;

        let current = self.current;
        let previous = self.previous;
        let changed = match (previous.unit(path), current.unit(path)) {
            (Some(before), Some(after)) => {
                self.references.insert(path, Visit::InProgress);
                before.references != after.references
                    || after
                        .references
                        .iter()
                        .any(|reference| self.target_changed(reference))
            }
            _ => true,
        };
        self.references.insert(path, Visit::Done(changed));
        changed
    }

    /// References to units missing from the current graph contribute nothing.
    fn target_changed(&mut self, reference: &'a Path) -> bool {
        if !self.current.contains(reference) {
            return false;
        }
        self.directly_changed(reference) || self.references_changed(reference)
    }
}

fn inputs_changed(before: &BuildUnit, after: &BuildUnit, changed: &ChangedFileSet) -> bool {
    before.input_files != after.input_files
        || after.input_files.iter().any(|file| changed.contains(file))
}

fn entry(unit: &BuildUnit, status: DiffStatus) -> DiffEntry {
    let referenced_projects = match status {
        DiffStatus::Removed => Vec::new(),
        _ => unit.references.iter().cloned().collect(),
    };
    DiffEntry {
        path: unit.path.clone(),
        status,
        referenced_projects,
    }
}

/// Lazy sequence of [`DiffEntry`] values.
///
/// Units of the current graph come first, in graph order, followed by
/// units that only exist in the previous graph.
pub struct GraphDiff<'a> {
    evaluator: Evaluator<'a>,
    current_units: std::slice::Iter<'a, BuildUnit>,
    previous_units: std::slice::Iter<'a, BuildUnit>,
    reported: bool,
}

/// Compare `previous` against `current` given the files that changed in between.
pub fn diff<'a>(
    previous: &'a BuildGraph,
    current: &'a BuildGraph,
    changed: &'a ChangedFileSet,
) -> GraphDiff<'a> {
    GraphDiff {
        evaluator: Evaluator {
            previous,
            current,
            changed,
            direct: HashMap::new(),
            references: HashMap::new(),
            stats: DiffStats::default(),
        },
        current_units: current.units(),
        previous_units: previous.units(),
        reported: false,
    }
}

impl<'a> GraphDiff<'a> {
    /// Counters accumulated so far.
    pub fn stats(&self) -> &DiffStats {
        &self.evaluator.stats
    }

    fn classify(&mut self, unit: &'a BuildUnit) -> Option<DiffEntry> {
        if !self.evaluator.previous.contains(&unit.path) {
            self.evaluator.stats.added += 1;
            return Some(entry(unit, DiffStatus::Added));
        }

        let path = unit.path.as_path();
        if self.evaluator.directly_changed(path) {
            self.evaluator.stats.modified += 1;
            Some(entry(unit, DiffStatus::Modified))
        } else if self.evaluator.references_changed(path) {
            self.evaluator.stats.reference_changed += 1;
            Some(entry(unit, DiffStatus::ReferenceChanged))
        } else {
            None
        }
    }
}

impl Iterator for GraphDiff<'_> {
    type Item = DiffEntry;

    fn next(&mut self) -> Option<DiffEntry> {
        while let Some(unit) = self.current_units.next() {
            if let Some(entry) = self.classify(unit) {
                return Some(entry);
            }
        }

        for unit in self.previous_units.by_ref() {
            if !self.evaluator.current.contains(&unit.path) {
                self.evaluator.stats.removed += 1;
                return Some(entry(unit, DiffStatus::Removed));
            }
        }

        if !self.reported {
            self.reported = true;
            let stats = &self.evaluator.stats;
            debug!(
                added = stats.added,
                removed = stats.removed,
                modified = stats.modified,
                reference_changed = stats.reference_changed,
                cycles = stats.cycles_detected,
                "Graph diff complete"
            );
        }
        None
    }
}
